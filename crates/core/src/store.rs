//! Reloadable configuration snapshots.
//!
//! Readers take an `Arc<ConfigSnapshot>` and keep it for the whole request.
//! A reload builds a complete new snapshot and publishes it with one atomic
//! pointer swap, so a reader sees either the old or the new settings in full.

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::info;

use crate::{config::MotdSettings, error::Result};

/// Immutable, point-in-time view of the configuration.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    /// Parsed settings.
    pub settings: MotdSettings,
    /// When this snapshot was built.
    pub loaded_at: DateTime<Utc>,
    /// Monotonic counter, bumped on every publish.
    pub generation: u64,
}

impl ConfigSnapshot {
    /// Wrap settings into a standalone snapshot with generation 0.
    pub fn new(settings: MotdSettings) -> Self {
        Self::with_generation(settings, 0)
    }

    fn with_generation(settings: MotdSettings, generation: u64) -> Self {
        Self {
            settings,
            loaded_at: Utc::now(),
            generation,
        }
    }
}

impl From<MotdSettings> for ConfigSnapshot {
    fn from(settings: MotdSettings) -> Self {
        Self::new(settings)
    }
}

/// Holder of the current snapshot, safe to share between request handlers.
pub struct ConfigStore {
    path: Option<PathBuf>,
    current: ArcSwap<ConfigSnapshot>,
    generation: AtomicU64,
    publish: Mutex<()>,
}

impl ConfigStore {
    /// Load the config file at `path` and make it current.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = MotdSettings::load(&path)?;
        info!("loaded configuration from {}", path.display());
        Ok(Self::build(Some(path), settings))
    }

    /// Store backed by in-memory settings only; [`ConfigStore::reload`] keeps them as-is.
    pub fn with_settings(settings: MotdSettings) -> Self {
        Self::build(None, settings)
    }

    fn build(path: Option<PathBuf>, settings: MotdSettings) -> Self {
        Self {
            path,
            current: ArcSwap::from_pointee(ConfigSnapshot::with_generation(settings, 0)),
            generation: AtomicU64::new(0),
            publish: Mutex::new(()),
        }
    }

    /// Path of the backing config file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The snapshot in effect right now.
    pub fn current(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    /// Re-read the config file and publish the result.
    ///
    /// On failure the previous snapshot stays current and the error is returned.
    pub fn reload(&self) -> Result<Arc<ConfigSnapshot>> {
        let Some(path) = self.path.as_deref() else {
            return Ok(self.current());
        };
        let settings = MotdSettings::load(path)?;
        let snapshot = self.replace(settings);
        info!(
            generation = snapshot.generation,
            "reloaded configuration from {}",
            path.display()
        );
        Ok(snapshot)
    }

    /// Publish new settings as the current snapshot.
    pub fn replace(&self, settings: MotdSettings) -> Arc<ConfigSnapshot> {
        let _guard = self.publish.lock();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let snapshot = Arc::new(ConfigSnapshot::with_generation(settings, generation));
        self.current.store(Arc::clone(&snapshot));
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Greeting;
    use anyhow::Result;
    use std::{fs, sync::atomic::AtomicBool};
    use tempfile::tempdir;

    fn greetings(label: &str, count: usize) -> MotdSettings {
        MotdSettings {
            greetings: (0..count)
                .map(|index| Greeting {
                    line1: label.to_string(),
                    line2: index.to_string(),
                    icon: None,
                })
                .collect(),
            ..MotdSettings::default()
        }
    }

    #[test]
    fn reload_publishes_new_generation() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("config.toml");
        fs::write(&path, "fake_players = \"1\"\n")?;

        let store = ConfigStore::open(&path)?;
        let first = store.current();
        assert_eq!(first.generation, 0);
        assert_eq!(first.settings.fake_players, "1");

        fs::write(&path, "fake_players = \"!5\"\n")?;
        let second = store.reload()?;
        assert_eq!(second.generation, 1);
        assert_eq!(store.current().settings.fake_players, "!5");
        assert_eq!(first.settings.fake_players, "1", "held snapshots never change");
        Ok(())
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("config.toml");
        fs::write(&path, "motd_enabled = false\n")?;
        let store = ConfigStore::open(&path)?;

        fs::write(&path, "motd_enabled = [not toml\n")?;
        assert!(store.reload().is_err());
        let current = store.current();
        assert_eq!(current.generation, 0);
        assert!(!current.settings.motd_enabled);
        Ok(())
    }

    #[test]
    fn in_memory_reload_is_a_noop() {
        let store = ConfigStore::with_settings(greetings("a", 2));
        assert!(store.path().is_none());
        let snapshot = store.reload().expect("in-memory reload");
        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.settings.greetings.len(), 2);
    }

    #[test]
    fn readers_never_see_mixed_snapshots() {
        let store = ConfigStore::with_settings(greetings("a", 3));
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    while !done.load(Ordering::Acquire) {
                        let snapshot = store.current();
                        let list = &snapshot.settings.greetings;
                        let label = list[0].line1.as_str();
                        let expected = if label == "a" { 3 } else { 5 };
                        assert_eq!(list.len(), expected);
                        assert!(list.iter().all(|greeting| greeting.line1 == label));
                        assert_eq!(list[expected - 1].line2, (expected - 1).to_string());
                    }
                });
            }

            for round in 0..500 {
                if round % 2 == 0 {
                    store.replace(greetings("b", 5));
                } else {
                    store.replace(greetings("a", 3));
                }
            }
            done.store(true, Ordering::Release);
        });

        assert_eq!(store.current().generation, 500);
    }
}
