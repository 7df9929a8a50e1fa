//! Merge engine: writes a translation table into the game's line table

use crate::error::{Error, Result};
use crate::parser::decode_line;
use crate::table::{TranslationTable, HEADER_KEY};
use crate::writer::encode_row;
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

/// Text shown for a key with neither translation nor source text
pub const MISSING_MARKER: &str = "?";

/// How the translated text is laid out in each line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnMode {
    /// `key,translated` - the translation takes over the source column
    #[default]
    Replace,
    /// `key,source,translated` - the translation gets a column of its own
    Append,
}

impl ColumnMode {
    /// Index of the column holding the translated text
    pub fn language_index(self) -> usize {
        match self {
            ColumnMode::Replace => 1,
            ColumnMode::Append => 2,
        }
    }
}

/// What an untranslated key displays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingText {
    /// Keep the source text, or show the marker if it is empty
    #[default]
    Source,
    /// Always show the marker
    Marker,
}

/// Merge behaviour, chosen once at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePolicy {
    pub column_mode: ColumnMode,
    pub missing_text: MissingText,
}

/// Outcome of a merge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Lines that received translated text
    pub updated: usize,
    /// Lines left as-is because their key is keep-original
    pub kept: usize,
    /// Keys with no entry at all, in line order
    pub untranslated: Vec<String>,
}

/// Merge `table` into the game's line table.
///
/// Line 0 is the column header and is rewritten to name `language`. Every
/// other line with a key and a text cell is re-encoded with its text
/// chosen from the table; key order and line count never change, and the
/// slice is never resized.
///
/// Fails without touching `lines` if the table holds one translation or
/// fewer, which points at a truncated or corrupt document.
pub fn merge_lines(
    lines: &mut [String],
    table: &TranslationTable,
    language: &str,
    policy: MergePolicy,
) -> Result<MergeReport> {
    if lines.is_empty() {
        return Err(Error::EmptyLineTable);
    }
    let found = table.translated_count();
    if found <= 1 {
        return Err(Error::TooFewEntries { found });
    }

    let mut report = MergeReport::default();
    let mut merged: Vec<(usize, String)> = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate().skip(1) {
        let cells = decode_line(line);
        let [key, source, ..] = cells.as_slice() else {
            continue;
        };
        if key.is_empty() {
            continue;
        }

        let text = if let Some(text) = table.get(key) {
            report.updated += 1;
            text
        } else if table.is_keep_original(key) {
            report.kept += 1;
            source.as_str()
        } else {
            info!("Untranslated: {} => {}", key, source);
            report.untranslated.push(key.clone());
            match policy.missing_text {
                MissingText::Source if !source.is_empty() => source.as_str(),
                _ => MISSING_MARKER,
            }
        };

        trace!("Updating {}", key);
        let line = match policy.column_mode {
            ColumnMode::Replace => encode_row([key.as_str(), text]),
            ColumnMode::Append => encode_row([key.as_str(), source.as_str(), text]),
        };
        merged.push((index, line));
    }

    for (index, line) in merged {
        lines[index] = line;
    }
    lines[0] = header_line(&lines[0], language, policy.column_mode);

    info!(
        "{} entries updated, {} kept original, {} untranslated.",
        report.updated,
        report.kept,
        report.untranslated.len()
    );
    Ok(report)
}

/// Column header naming the active language
fn header_line(current: &str, language: &str, mode: ColumnMode) -> String {
    match mode {
        ColumnMode::Replace => encode_row([HEADER_KEY, language]),
        ColumnMode::Append => {
            let cells = decode_line(current);
            let source = cells.get(1).map(String::as_str).unwrap_or("english");
            encode_row([HEADER_KEY, source, language])
        }
    }
}
