//! Diagnostic dump of the untouched game line table

use crate::error::{Error, Result};
use crate::parser::CsvRowReader;
use crate::writer::encode_row;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, warn};

/// File name of the dump inside the data directory
pub const DUMP_FILE_NAME: &str = "Orig.csv";

/// Write `lines` joined by `\r\n` to `path`
pub fn write_dump(lines: &[String], path: &Path) -> Result<()> {
    let text = lines.join("\r\n");
    fs::write(path, &text).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!("{} lines dumped to {}", lines.len(), path.display());
    Ok(())
}

/// Write the dump on a detached thread.
///
/// `snapshot` is owned by the thread, so later changes to the live table
/// cannot race with it. Failures are only logged.
pub fn spawn_dump(snapshot: Vec<String>, path: PathBuf) {
    let spawned = thread::Builder::new()
        .name("hue-dump".to_string())
        .spawn(move || {
            if let Err(e) = write_dump(&snapshot, &path) {
                warn!("{}", e);
            }
        });
    if let Err(e) = spawned {
        warn!("Cannot start dump thread: {}", e);
    }
}

/// Split a dump back into one encoded line per logical row.
///
/// Rows holding quoted line breaks span several physical lines in the
/// dump; each comes back as a single line.
pub fn split_dump(text: &str) -> Vec<String> {
    CsvRowReader::from_text(text)
        .rows()
        .map(encode_row)
        .collect()
}
