//! Builds the server-list response from a snapshot.

use serde::Serialize;
use tracing::debug;

use crate::{
    error::{MotdError, Result},
    greeting,
    icon::{IconData, IconResolver},
    players,
    store::ConfigSnapshot,
};

/// Everything the protocol layer needs for one status reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposedResponse {
    /// Server icon, if enabled and resolvable.
    pub icon: Option<IconData>,
    /// Final description text, placeholders already substituted.
    pub text: Option<String>,
    /// Online player count to show.
    pub displayed_players: i64,
    /// Maximum player count to show.
    pub displayed_max_players: i64,
}

/// Composes responses against whatever snapshot the caller holds.
pub struct ResponseComposer<R> {
    icons: R,
}

impl<R: IconResolver> ResponseComposer<R> {
    /// Create a composer resolving icons through `icons`.
    pub fn new(icons: R) -> Self {
        Self { icons }
    }

    /// Icon resolver in use.
    pub fn icons(&self) -> &R {
        &self.icons
    }

    /// Compose one response. Fails only when the MOTD is enabled without greetings.
    pub fn compose(
        &self,
        snapshot: &ConfigSnapshot,
        real_online: i64,
        real_max: i64,
    ) -> Result<ComposedResponse> {
        let displayed_players = players::displayed_count(snapshot, real_online);
        let displayed_max_players = players::displayed_max(snapshot, displayed_players, real_max);

        let mut response = ComposedResponse {
            icon: None,
            text: None,
            displayed_players,
            displayed_max_players,
        };

        let Some(selected) = greeting::select(snapshot)? else {
            return Ok(response);
        };
        response.text = Some(greeting::format(
            selected,
            displayed_players,
            displayed_max_players,
        ));

        if snapshot.settings.icon_enabled {
            if let Some(id) = selected.icon_id() {
                response.icon = self.resolve_icon(id)?;
            }
        }

        Ok(response)
    }

    fn resolve_icon(&self, id: &str) -> Result<Option<IconData>> {
        match self.icons.resolve(id) {
            Ok(icon) => Ok(Some(icon)),
            Err(MotdError::IconNotFound(id)) => {
                debug!("icon {id} not found, responding without one");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
