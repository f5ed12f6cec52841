//! Displayed player counts.
//!
//! The fake player rule is free text from the config file and is parsed on
//! every use. A rule that does not parse logs a warning and the real count
//! is shown instead.

use rand::Rng;
use tracing::warn;

use crate::store::ConfigSnapshot;

/// Parsed form of the `fake_players` setting.
#[derive(Debug, Clone, PartialEq)]
pub enum FakePlayersRule {
    /// `start:end`: add a random amount in `start..end`.
    Range {
        /// Inclusive lower bound.
        start: i64,
        /// Exclusive upper bound.
        end: i64,
    },
    /// `p%`: scale by `1 + p / 100`, rounding up.
    Percentage(f64),
    /// `!n`: always show `n`.
    Fixed(i64),
    /// `+n`: show at least `n`.
    Minimum(i64),
    /// `n`: add `n`.
    Additive(i64),
    /// Rule text that could not be parsed.
    Invalid(String),
}

impl FakePlayersRule {
    /// Parse rule text. Markers are checked in the order `:`, `%`, `!`, `+`;
    /// the first one present decides the form.
    pub fn parse(rule: &str) -> Self {
        let rule = rule.trim();
        let parsed = if rule.contains(':') {
            let mut parts = rule.split(':');
            match (parts.next().and_then(parse_int), parts.next().and_then(parse_int)) {
                (Some(start), Some(end)) if start < end => Some(Self::Range { start, end }),
                _ => None,
            }
        } else if rule.contains('%') {
            rule.replace('%', "")
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|factor| factor.is_finite())
                .map(Self::Percentage)
        } else if rule.contains('!') {
            parse_int(&rule.replace('!', "")).map(Self::Fixed)
        } else if rule.contains('+') {
            parse_int(&rule.replace('+', "")).map(Self::Minimum)
        } else {
            parse_int(rule).map(Self::Additive)
        };

        parsed.unwrap_or_else(|| Self::Invalid(rule.to_string()))
    }

    /// Apply the rule using the calling thread's generator.
    pub fn apply(&self, real_online: i64) -> i64 {
        self.apply_with(real_online, &mut rand::thread_rng())
    }

    /// Apply the rule using the supplied generator for range draws.
    pub fn apply_with<R: Rng>(&self, real_online: i64, rng: &mut R) -> i64 {
        match *self {
            Self::Range { start, end } => real_online.saturating_add(rng.gen_range(start..end)),
            Self::Percentage(percent) => {
                let factor = 1.0 + percent / 100.0;
                (factor * real_online as f64).ceil() as i64
            }
            Self::Fixed(shown) => shown,
            Self::Minimum(min_players) => min_players.max(real_online),
            Self::Additive(delta) => real_online.saturating_add(delta),
            Self::Invalid(ref rule) => {
                warn!(rule = %rule, "fake_players config incorrect, showing real player count");
                real_online
            }
        }
    }
}

fn parse_int(part: &str) -> Option<i64> {
    part.trim().parse().ok()
}

/// Online count to display for the given snapshot.
pub fn displayed_count(snapshot: &ConfigSnapshot, real_online: i64) -> i64 {
    let settings = &snapshot.settings;
    if !settings.fake_players_enabled {
        return real_online;
    }
    FakePlayersRule::parse(&settings.fake_players).apply(real_online)
}

/// Maximum player count to display, given the already adjusted online count.
pub fn displayed_max(snapshot: &ConfigSnapshot, displayed_online: i64, real_max: i64) -> i64 {
    let settings = &snapshot.settings;
    if !settings.max_players_enabled {
        return real_max;
    }
    if settings.just_x_more_enabled {
        displayed_online.saturating_add(settings.x_value)
    } else {
        settings.max_players
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotdSettings;
    use std::{
        io::Write,
        sync::{Arc, Mutex},
    };

    fn snapshot(rule: &str) -> ConfigSnapshot {
        ConfigSnapshot::new(MotdSettings {
            fake_players_enabled: true,
            fake_players: rule.to_string(),
            ..MotdSettings::default()
        })
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("capture lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn parses_each_form() {
        assert_eq!(
            FakePlayersRule::parse("5:10"),
            FakePlayersRule::Range { start: 5, end: 10 }
        );
        assert_eq!(FakePlayersRule::parse("25%"), FakePlayersRule::Percentage(25.0));
        assert_eq!(FakePlayersRule::parse("!42"), FakePlayersRule::Fixed(42));
        assert_eq!(FakePlayersRule::parse("+50"), FakePlayersRule::Minimum(50));
        assert_eq!(FakePlayersRule::parse("7"), FakePlayersRule::Additive(7));
        assert_eq!(FakePlayersRule::parse("-3"), FakePlayersRule::Additive(-3));
        assert_eq!(FakePlayersRule::parse(" 7 "), FakePlayersRule::Additive(7));
    }

    #[test]
    fn earlier_markers_win() {
        assert_eq!(
            FakePlayersRule::parse("5:10%"),
            FakePlayersRule::Invalid("5:10%".to_string())
        );
        assert_eq!(
            FakePlayersRule::parse("1:3!"),
            FakePlayersRule::Invalid("1:3!".to_string())
        );
        assert_eq!(
            FakePlayersRule::parse("+10%"),
            FakePlayersRule::Percentage(10.0)
        );
    }

    #[test]
    fn range_ignores_extra_components_and_rejects_empty_ranges() {
        assert_eq!(
            FakePlayersRule::parse("1:4:9"),
            FakePlayersRule::Range { start: 1, end: 4 }
        );
        assert!(matches!(
            FakePlayersRule::parse("10:10"),
            FakePlayersRule::Invalid(_)
        ));
        assert!(matches!(FakePlayersRule::parse("3:"), FakePlayersRule::Invalid(_)));
    }

    #[test]
    fn range_stays_in_half_open_interval() {
        let snapshot = snapshot("5:10");
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2_000 {
            let shown = displayed_count(&snapshot, 20);
            assert!((25..30).contains(&shown), "out of range: {shown}");
            seen.insert(shown);
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn percentage_rounds_up() {
        assert_eq!(displayed_count(&snapshot("50%"), 10), 15);
        assert_eq!(displayed_count(&snapshot("33%"), 10), 14);
        assert_eq!(displayed_count(&snapshot("0%"), 10), 10);
    }

    #[test]
    fn fixed_ignores_real_count() {
        assert_eq!(displayed_count(&snapshot("!42"), 0), 42);
        assert_eq!(displayed_count(&snapshot("!42"), 1_000), 42);
    }

    #[test]
    fn minimum_keeps_higher_value() {
        assert_eq!(displayed_count(&snapshot("+50"), 30), 50);
        assert_eq!(displayed_count(&snapshot("+50"), 60), 60);
    }

    #[test]
    fn additive_adds_delta() {
        assert_eq!(displayed_count(&snapshot("7"), 20), 27);
    }

    #[test]
    fn disabled_rule_shows_real_count() {
        let mut snapshot = snapshot("!42");
        snapshot.settings.fake_players_enabled = false;
        assert_eq!(displayed_count(&snapshot, 13), 13);
    }

    #[test]
    fn malformed_rule_falls_back_and_warns() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let shown = tracing::subscriber::with_default(subscriber, || {
            displayed_count(&snapshot("abc"), 20)
        });

        assert_eq!(shown, 20);
        let output = String::from_utf8(captured.0.lock().expect("capture lock").clone())
            .expect("utf8 log output");
        assert!(output.contains("WARN"), "missing warning: {output}");
        assert!(output.contains("abc"), "rule text not logged: {output}");
    }

    #[test]
    fn max_players_overrides() {
        let mut snapshot = snapshot("7");
        assert_eq!(displayed_max(&snapshot, 27, 100), 100);

        snapshot.settings.max_players_enabled = true;
        snapshot.settings.max_players = 500;
        assert_eq!(displayed_max(&snapshot, 27, 100), 500);

        snapshot.settings.just_x_more_enabled = true;
        snapshot.settings.x_value = 1;
        assert_eq!(displayed_max(&snapshot, 27, 100), 28);
    }
}
