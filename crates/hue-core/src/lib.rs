//! hue-core: Core library for the Hue Chinese translation plugin
//!
//! This library provides functionality to:
//! - Read and write line-oriented CSV, including quoted multi-line cells
//! - Load a user-editable translation file, falling back to a bundled default
//! - Upgrade stale user files without overwriting hand edits
//! - Merge a translation into the game's language line table

pub mod bundled;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod host;
pub mod logging;
pub mod merger;
pub mod parser;
pub mod store;
pub mod table;
pub mod upgrade;
pub mod writer;

pub use config::Config;
pub use error::{Error, Result};
pub use host::{subtitle_language_index, Applied, HostTables, Localizer};
pub use merger::{merge_lines, ColumnMode, MergePolicy, MergeReport, MissingText};
pub use parser::{decode_line, CsvRow, CsvRowReader};
pub use store::{Origin, TranslationStore};
pub use table::{Header, TranslationTable};
pub use upgrade::{LegacyCleanup, RuleOutcome, UpgradeReport, UpgradeRule, Upgrader};
pub use writer::{encode_row, CsvCell, CsvRowWriter};
