//! Plugin configuration

use crate::bundled::LANGUAGE;
use crate::error::{Error, Result};
use crate::merger::{ColumnMode, MergePolicy, MissingText};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Settings read from `HueZh.json` in the data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language the translation is installed as
    pub language: String,
    /// Replace the source column or add a new one
    pub column_mode: ColumnMode,
    /// What untranslated keys show
    pub missing_text: MissingText,
    /// Write the untouched game table to `Orig.csv` before merging
    pub dump_original: bool,
    /// off, error, warn, info, debug or trace
    pub log_level: String,
    /// Overrides the default data directory
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: LANGUAGE.to_string(),
            column_mode: ColumnMode::default(),
            missing_text: MissingText::default(),
            dump_original: false,
            log_level: "info".to_string(),
            data_dir: None,
        }
    }
}

impl Config {
    /// Config file name inside the data directory
    pub const FILE_NAME: &'static str = "HueZh.json";

    /// Load a config file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the config file as JSON, creating its directory if needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| Error::FileWrite {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(path, content).map_err(|e| Error::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load `path`, writing out the defaults if it does not exist.
    ///
    /// A file that cannot be read or parsed is logged and left alone, and
    /// the defaults are used.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            let config = Self::default();
            info!("Creating {}", path.display());
            if let Err(e) = config.save(path) {
                warn!("Cannot create config file: {}", e);
            }
            return config;
        }
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded {}: {:?}", path.display(), config);
                config
            }
            Err(e) => {
                warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Merge behaviour selected by this config
    pub fn policy(&self) -> MergePolicy {
        MergePolicy {
            column_mode: self.column_mode,
            missing_text: self.missing_text,
        }
    }

    /// Directory holding the translation file, log and dumps
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }
}

/// `<Documents>/My Games/Curve Digital/Hue`, or the working directory if
/// there is no documents folder
pub fn default_data_dir() -> PathBuf {
    dirs::document_dir()
        .map(|docs| docs.join("My Games").join("Curve Digital").join("Hue"))
        .unwrap_or_else(|| PathBuf::from("."))
}
