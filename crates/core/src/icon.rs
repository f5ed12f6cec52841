//! Server icons loaded from disk.

use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rand::seq::IteratorRandom;
use regex::Regex;
use serde::{Serialize, Serializer};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{MotdError, Result};

/// Icon id that picks any loaded icon.
pub const RANDOM_ICON: &str = "random";

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const FAVICON_PREFIX: &str = "data:image/png;base64,";

static ICON_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([A-Za-z0-9_.\-]+)\.png$").expect("invalid icon regex"));

/// Encoded icon ready for the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct IconData {
    id: Arc<str>,
    png: Arc<[u8]>,
    favicon: Arc<str>,
}

impl IconData {
    /// Wrap raw PNG bytes, rejecting anything without a PNG signature.
    pub fn from_png(id: impl Into<String>, png: Vec<u8>) -> Option<Self> {
        if !png.starts_with(PNG_SIGNATURE) {
            return None;
        }
        let favicon = format!("{FAVICON_PREFIX}{}", STANDARD.encode(&png));
        Some(Self {
            id: Arc::from(id.into()),
            png: Arc::from(png),
            favicon: Arc::from(favicon),
        })
    }

    /// Identifier the icon is stored under.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw PNG bytes.
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// `data:image/png;base64,...` form used in status responses.
    pub fn favicon(&self) -> &str {
        &self.favicon
    }
}

impl fmt::Debug for IconData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconData")
            .field("id", &self.id)
            .field("bytes", &self.png.len())
            .finish()
    }
}

impl Serialize for IconData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.favicon)
    }
}

/// Source of icons for response composition.
pub trait IconResolver: Send + Sync {
    /// Look up an icon by identifier.
    fn resolve(&self, id: &str) -> Result<IconData>;
}

impl<T: IconResolver + ?Sized> IconResolver for Arc<T> {
    fn resolve(&self, id: &str) -> Result<IconData> {
        (**self).resolve(id)
    }
}

/// Icons read from a directory of `.png` files, keyed by file stem.
pub struct IconStore {
    dir: PathBuf,
    icons: RwLock<HashMap<String, IconData>>,
}

impl IconStore {
    /// Create a store over `dir` and load its icons.
    ///
    /// A missing directory yields an empty store.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            dir: dir.into(),
            icons: RwLock::new(HashMap::new()),
        };
        store.reload()?;
        Ok(store)
    }

    /// Directory the icons are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of loaded icons.
    pub fn len(&self) -> usize {
        self.icons.read().len()
    }

    /// Whether no icons are loaded.
    pub fn is_empty(&self) -> bool {
        self.icons.read().is_empty()
    }

    /// Sorted identifiers of the loaded icons.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.icons.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Rescan the directory and replace the loaded set in one step.
    pub fn reload(&self) -> Result<usize> {
        let icons = scan_icons(&self.dir)?;
        let count = icons.len();
        *self.icons.write() = icons;
        info!("loaded {} icon(s) from {}", count, self.dir.display());
        Ok(count)
    }
}

impl IconResolver for IconStore {
    fn resolve(&self, id: &str) -> Result<IconData> {
        let icons = self.icons.read();
        let found = if id == RANDOM_ICON {
            icons.values().choose(&mut rand::thread_rng())
        } else {
            icons.get(id)
        };
        found
            .cloned()
            .ok_or_else(|| MotdError::IconNotFound(id.to_string()))
    }
}

fn scan_icons(dir: &Path) -> Result<HashMap<String, IconData>> {
    let mut icons = HashMap::new();
    if !dir.is_dir() {
        return Ok(icons);
    }

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let source = err
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            MotdError::io(dir, source)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        let Some(id) = ICON_FILE_RE
            .captures(&file_name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
        else {
            continue;
        };

        let bytes = match fs::read(entry.path()) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Skipping icon {}: {}", entry.path().display(), err);
                continue;
            }
        };
        match IconData::from_png(id.clone(), bytes) {
            Some(icon) => {
                icons.insert(id, icon);
            }
            None => warn!("Skipping icon {}: not a PNG file", entry.path().display()),
        }
    }

    Ok(icons)
}
