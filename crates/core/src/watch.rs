//! Reload the config file and icon directory when they change on disk.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    error::{MotdError, Result},
    icon::IconStore,
    store::{ConfigSnapshot, ConfigStore},
};

/// Events arriving within this window after the first one are handled as one batch.
const SETTLE_DELAY: Duration = Duration::from_millis(150);

/// Outcome of a reload triggered by the watcher.
#[derive(Debug)]
pub enum ReloadEvent {
    /// The config file was reloaded and published.
    Config(Arc<ConfigSnapshot>),
    /// The icon directory was rescanned; holds the number of icons now loaded.
    Icons(usize),
    /// A reload failed; the previous state is still in effect.
    Error(MotdError),
}

/// Running watcher. Dropping it stops watching.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl ConfigWatcher {
    /// Start watching. Must be called from within a tokio runtime.
    pub fn spawn(
        store: Arc<ConfigStore>,
        icons: Arc<IconStore>,
        events: mpsc::Sender<ReloadEvent>,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })?;

        let targets = WatchTargets::new(store.path(), icons.dir());
        for dir in targets.dirs() {
            watcher.watch(&dir, RecursiveMode::NonRecursive)?;
            info!("watching {}", dir.display());
        }

        let task = tokio::spawn(run(targets, store, icons, rx, events));
        Ok(Self {
            _watcher: watcher,
            task,
        })
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Debug, Clone)]
struct WatchTargets {
    config_file: Option<PathBuf>,
    icons_dir: PathBuf,
}

impl WatchTargets {
    fn new(config_file: Option<&Path>, icons_dir: &Path) -> Self {
        Self {
            config_file: config_file.map(canonical_file),
            icons_dir: canonical(icons_dir),
        }
    }

    fn dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(parent) = self.config_file.as_deref().and_then(Path::parent) {
            dirs.push(parent.to_path_buf());
        }
        if self.icons_dir.is_dir() && !dirs.contains(&self.icons_dir) {
            dirs.push(self.icons_dir.clone());
        }
        dirs
    }

    /// Returns `(config_changed, icons_changed)` for a batch of events.
    fn classify<'a>(&self, events: impl IntoIterator<Item = &'a Event>) -> (bool, bool) {
        let mut config = false;
        let mut icons = false;
        for event in events {
            if matches!(event.kind, EventKind::Access(_)) {
                continue;
            }
            for path in &event.paths {
                if self.config_file.as_deref() == Some(path.as_path()) {
                    config = true;
                } else if path.parent() == Some(self.icons_dir.as_path()) {
                    icons = true;
                }
            }
        }
        (config, icons)
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Canonicalize the directory only; the file itself may be mid-replace.
fn canonical_file(path: &Path) -> PathBuf {
    let Some(name) = path.file_name() else {
        return path.to_path_buf();
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    canonical(parent).join(name)
}

async fn run(
    targets: WatchTargets,
    store: Arc<ConfigStore>,
    icons: Arc<IconStore>,
    mut rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    events: mpsc::Sender<ReloadEvent>,
) {
    while let Some(first) = rx.recv().await {
        tokio::time::sleep(SETTLE_DELAY).await;
        let mut batch = vec![first];
        while let Ok(next) = rx.try_recv() {
            batch.push(next);
        }

        let mut received = Vec::with_capacity(batch.len());
        for res in batch {
            match res {
                Ok(event) => received.push(event),
                Err(err) => warn!("file watcher error: {err}"),
            }
        }

        let (config_changed, icons_changed) = targets.classify(&received);
        let mut outcomes = Vec::new();
        if icons_changed {
            outcomes.push(match icons.reload() {
                Ok(count) => ReloadEvent::Icons(count),
                Err(err) => {
                    warn!("icon reload failed: {err}");
                    ReloadEvent::Error(err)
                }
            });
        }
        if config_changed {
            outcomes.push(match store.reload() {
                Ok(snapshot) => ReloadEvent::Config(snapshot),
                Err(err) => {
                    warn!("config reload failed, keeping previous settings: {err}");
                    ReloadEvent::Error(err)
                }
            });
        }

        for outcome in outcomes {
            if events.send(outcome).await.is_err() {
                return;
            }
        }
    }
}
