//! Storage for the user-editable translation file
//!
//! Reads and writes of one path are serialised by a process-wide lock
//! keyed by that path.

use crate::bundled::{BUNDLED_CSV, FILE_NAME};
use crate::error::{Error, Result};
use crate::table::TranslationTable;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{debug, info, warn};

fn path_lock(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();
    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let lock = Arc::clone(locks.entry(path.to_path_buf()).or_default());
    lock
}

/// Where loaded translation text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The user's file
    User,
    /// The bundled default
    Bundled,
}

/// Translation text and its origin
#[derive(Debug, Clone)]
pub struct Loaded {
    pub text: String,
    pub origin: Origin,
}

/// The user's translation file, backed by a bundled default
#[derive(Debug, Clone)]
pub struct TranslationStore {
    path: PathBuf,
    default: &'static str,
}

impl TranslationStore {
    /// Store at `path` falling back to `default`
    pub fn new(path: impl Into<PathBuf>, default: &'static str) -> Self {
        Self {
            path: path.into(),
            default,
        }
    }

    /// The standard file in `dir`, backed by the bundled translation
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(FILE_NAME), BUNDLED_CSV)
    }

    /// Path of the user file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the default translation
    pub fn default_table(&self) -> TranslationTable {
        TranslationTable::from_csv(self.default)
    }

    /// Load the user file, or the default if it cannot be read.
    ///
    /// A missing user file is recreated from the default bytes. Never
    /// fails: I/O problems are logged and the default is returned.
    pub fn load(&self) -> Loaded {
        let lock = path_lock(&self.path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let exists = self.path.exists();
        if exists {
            match fs::read(&self.path) {
                Ok(bytes) => {
                    info!(
                        "Loading data from {} ({} bytes). The file is user editable. Delete it to reset to default.",
                        self.path.display(),
                        bytes.len()
                    );
                    return Loaded {
                        text: String::from_utf8_lossy(&bytes).into_owned(),
                        origin: Origin::User,
                    };
                }
                Err(e) => warn!("Cannot read {}: {}", self.path.display(), e),
            }
        }

        info!("Loading from built-in data ({} bytes).", self.default.len());
        if !exists {
            info!("Recreating {}", self.path.display());
            if let Err(e) = self.write_default() {
                warn!("{}", e);
            }
        }
        Loaded {
            text: self.default.to_string(),
            origin: Origin::Bundled,
        }
    }

    /// Overwrite the user file with the default bytes
    pub fn reset(&self) -> Result<()> {
        let lock = path_lock(&self.path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_default()
    }

    /// Rewrite the user file from `table`.
    ///
    /// The old file is first copied to a timestamped backup, whose path is
    /// returned. The new content goes to a temp file that is then renamed
    /// over the old one, so a failed write leaves the old file in place.
    pub fn save(&self, table: &TranslationTable) -> Result<Option<PathBuf>> {
        let lock = path_lock(&self.path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.ensure_dir()?;
        let backup = if self.path.exists() {
            let backup = self.backup_path(Local::now());
            fs::copy(&self.path, &backup).map_err(|e| Error::FileWrite {
                path: backup.clone(),
                source: e,
            })?;
            debug!("Backed up {} to {}", self.path.display(), backup.display());
            Some(backup)
        } else {
            None
        };

        let content = table.to_csv();
        let temp = self.path.with_extension("csv.tmp");
        fs::write(&temp, &content).map_err(|e| Error::FileWrite {
            path: temp.clone(),
            source: e,
        })?;
        fs::rename(&temp, &self.path).map_err(|e| Error::FileWrite {
            path: self.path.clone(),
            source: e,
        })?;
        info!("{} bytes written to {}", content.len(), self.path.display());

        Ok(backup)
    }

    fn write_default(&self) -> Result<()> {
        self.ensure_dir()?;
        fs::write(&self.path, self.default).map_err(|e| Error::FileWrite {
            path: self.path.clone(),
            source: e,
        })?;
        debug!("{} bytes written to {}", self.default.len(), self.path.display());
        Ok(())
    }

    fn ensure_dir(&self) -> Result<()> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                fs::create_dir_all(dir).map_err(|e| Error::FileWrite {
                    path: dir.to_path_buf(),
                    source: e,
                })
            }
            _ => Ok(()),
        }
    }

    fn backup_path(&self, now: DateTime<Local>) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("translation");
        self.path
            .with_file_name(format!("{}.{}.bak", stem, now.format("%Y%m%d-%H%M%S")))
    }
}
