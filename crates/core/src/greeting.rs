//! Greeting selection and placeholder formatting.

use rand::Rng;

use crate::{
    config::Greeting,
    error::{MotdError, Result},
    store::ConfigSnapshot,
};

/// Style reset inserted between the two lines.
pub const RESET_MARKER: &str = "<reset>";

/// Pick a greeting using the calling thread's generator.
///
/// Returns `Ok(None)` when the MOTD is disabled.
pub fn select(snapshot: &ConfigSnapshot) -> Result<Option<&Greeting>> {
    select_with(snapshot, &mut rand::thread_rng())
}

/// Pick a greeting using the supplied generator.
pub fn select_with<'a, R: Rng>(
    snapshot: &'a ConfigSnapshot,
    rng: &mut R,
) -> Result<Option<&'a Greeting>> {
    let settings = &snapshot.settings;
    if !settings.motd_enabled {
        return Ok(None);
    }

    let greetings = settings.greetings.as_slice();
    let index = match greetings.len() {
        0 => return Err(MotdError::NoGreetings),
        1 => 0,
        len => rng.gen_range(0..len),
    };
    Ok(greetings.get(index))
}

/// Render a greeting into its final two-line display text.
pub fn format(greeting: &Greeting, online_players: i64, max_players: i64) -> String {
    let text = format!("{}{}\n{}", greeting.line1, RESET_MARKER, greeting.line2);
    substitute(&text, online_players, max_players)
}

/// Replace `{onlinePlayers}`, `{maxPlayers}` and `{br}` in `template`.
pub fn substitute(template: &str, online_players: i64, max_players: i64) -> String {
    template
        .replace("{onlinePlayers}", &online_players.to_string())
        .replace("{maxPlayers}", &max_players.to_string())
        .replace("{br}", "\n")
}
