//! Configuration document and file loading.

use std::{
    fs,
    path::{Path, PathBuf},
};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{MotdError, Result};

/// Prefix for environment variables overriding file values, e.g. `MINIMOTD_MOTD_ENABLED`.
pub const ENV_PREFIX: &str = "MINIMOTD";

/// Directory under the platform config dir holding `config.toml` and `icons/`.
pub const DEFAULT_CONFIG_DIR: &str = "minimotd";

const DEFAULT_CONFIG: &str = r#"# MiniMOTD configuration
#
# Greeting lines accept the placeholders {onlinePlayers}, {maxPlayers} and {br}.

# Show a greeting from the list below.
motd_enabled = true
# Send a server icon. Each greeting may name one from the icons directory,
# or use "random" to pick any loaded icon.
icon_enabled = true

# Adjust the displayed online player count.
fake_players_enabled = false
# One of:
#   "3:6"  add a random amount from 3 (inclusive) to 6 (exclusive)
#   "25%"  add 25 percent, rounded up
#   "!42"  always show 42
#   "+50"  show at least 50
#   "7"    add 7
fake_players = "25%"

# Override the displayed maximum player count.
max_players_enabled = false
max_players = 69
# When enabled, the maximum is always the online count plus x_value.
just_x_more_enabled = false
x_value = 0

[[greetings]]
line1 = "<blue>A Minecraft Server</blue>"
line2 = "<red>Powered by MiniMOTD</red>"
icon = "random"
"#;

/// One selectable greeting: two text lines and an optional icon reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    /// First line of the server-list description.
    pub line1: String,
    /// Second line of the server-list description.
    #[serde(default)]
    pub line2: String,
    /// Identifier of an icon in the icon store.
    #[serde(default)]
    pub icon: Option<String>,
}

impl Greeting {
    /// Icon identifier, if one is set and non-blank.
    pub fn icon_id(&self) -> Option<&str> {
        self.icon
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Settings read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotdSettings {
    /// Whether a greeting is shown at all.
    pub motd_enabled: bool,
    /// Whether a server icon is sent.
    pub icon_enabled: bool,
    /// Greetings to choose from.
    pub greetings: Vec<Greeting>,
    /// Whether the online count is adjusted by `fake_players`.
    pub fake_players_enabled: bool,
    /// Raw fake player rule text; parsed on every use.
    pub fake_players: String,
    /// Whether the displayed maximum is overridden.
    pub max_players_enabled: bool,
    /// Fixed displayed maximum when `max_players_enabled` is set.
    pub max_players: i64,
    /// Show the maximum as the online count plus `x_value`.
    pub just_x_more_enabled: bool,
    /// Offset used by `just_x_more_enabled`.
    pub x_value: i64,
    /// Deprecated single-string greetings from older config files. Kept so
    /// such files still load; never used for selection.
    pub legacy_motds: Vec<String>,
}

impl Default for MotdSettings {
    fn default() -> Self {
        Self {
            motd_enabled: true,
            icon_enabled: true,
            greetings: vec![Greeting {
                line1: "<blue>A Minecraft Server</blue>".to_string(),
                line2: "<red>Powered by MiniMOTD</red>".to_string(),
                icon: Some("random".to_string()),
            }],
            fake_players_enabled: false,
            fake_players: "25%".to_string(),
            max_players_enabled: false,
            max_players: 69,
            just_x_more_enabled: false,
            x_value: 0,
            legacy_motds: Vec::new(),
        }
    }
}

impl MotdSettings {
    /// Load settings from a TOML file, applying `MINIMOTD_*` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Parse settings from TOML text without consulting the environment.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

/// `<config_dir>/minimotd/config.toml` for the current user.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(DEFAULT_CONFIG_DIR).join("config.toml"))
}

/// Icon directory that sits next to the given config file.
pub fn icons_dir_for(config_path: impl AsRef<Path>) -> PathBuf {
    config_path
        .as_ref()
        .parent()
        .map(|parent| parent.join("icons"))
        .unwrap_or_else(|| PathBuf::from("icons"))
}

/// Write the default config file when none exists. Returns `true` if a file was created.
pub fn ensure_default_config(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| MotdError::io(parent, err))?;
    }
    fs::write(path, DEFAULT_CONFIG).map_err(|err| MotdError::io(path, err))?;
    Ok(true)
}
