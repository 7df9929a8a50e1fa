//! Line-oriented CSV row reader
//!
//! Decodes a text stream into rows of cells. Cells are plain text, no type
//! detection is done. A quoted cell may span several physical lines; any
//! line break inside it (`\r\n`, `\n` or a lone `\r`) comes out as one `\n`.

use std::io::{self, BufRead};
use tracing::warn;

/// Pull-based CSV decoder.
///
/// Rows are handed out one at a time by [`CsvRowReader::next_row`] as a
/// forward-only [`CsvRow`] that borrows the reader. Malformed quoting never
/// fails: an unterminated quote at end of stream yields whatever was buffered.
pub struct CsvRowReader<R> {
    source: R,
    /// Current physical line, without its terminator
    line: String,
    /// Quoted cell content, reused across cells
    quoted: String,
    raw: Vec<u8>,
    /// Last line ended with `\r`, swallow a following `\n`
    skip_lf: bool,
    at_start: bool,
}

impl<'a> CsvRowReader<&'a [u8]> {
    /// Create a reader over an in-memory document
    pub fn from_text(text: &'a str) -> Self {
        Self::new(text.as_bytes())
    }
}

impl<R: BufRead> CsvRowReader<R> {
    /// Create a reader over any buffered source
    pub fn new(source: R) -> Self {
        Self {
            source,
            line: String::new(),
            quoted: String::new(),
            raw: Vec::new(),
            skip_lf: false,
            at_start: true,
        }
    }

    /// Start the next row, or `None` when the stream is exhausted.
    ///
    /// Cells not pulled from the returned row are skipped, but any
    /// continuation lines are only consumed as cells are read.
    pub fn next_row(&mut self) -> Option<CsvRow<'_, R>> {
        if !self.read_line() {
            return None;
        }
        Some(CsvRow {
            reader: self,
            pos: 0,
        })
    }

    /// Read one complete row
    pub fn read_row(&mut self) -> Option<Vec<String>> {
        self.next_row().map(|row| row.collect())
    }

    /// Iterate over the remaining rows, each fully collected
    pub fn rows(&mut self) -> impl Iterator<Item = Vec<String>> + '_ {
        std::iter::from_fn(move || self.read_row())
    }

    /// Load the next physical line into `self.line`.
    ///
    /// Returns false at end of stream. Read errors are logged and treated
    /// as end of stream.
    fn read_line(&mut self) -> bool {
        self.raw.clear();
        let mut got_line = false;

        loop {
            let available = match self.source.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "CSV source read failed, treating as end of stream");
                    break;
                }
            };
            if available.is_empty() {
                break;
            }

            if self.skip_lf {
                self.skip_lf = false;
                if available[0] == b'\n' {
                    self.source.consume(1);
                    continue;
                }
            }

            got_line = true;
            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(end) => {
                    self.skip_lf = available[end] == b'\r';
                    self.raw.extend_from_slice(&available[..end]);
                    self.source.consume(end + 1);
                    break;
                }
                None => {
                    let len = available.len();
                    self.raw.extend_from_slice(available);
                    self.source.consume(len);
                }
            }
        }

        if !got_line {
            return false;
        }

        self.line.clear();
        self.line.push_str(&String::from_utf8_lossy(&self.raw));
        if self.at_start {
            self.at_start = false;
            if self.line.starts_with('\u{feff}') {
                self.line.drain(..'\u{feff}'.len_utf8());
            }
        }
        true
    }

    /// Read the cell starting at `pos`, advancing `pos` past its separator.
    ///
    /// `pos` ends up past the end of the line once the last cell is read.
    fn read_cell(&mut self, pos: &mut usize) -> String {
        let len = self.line.len();
        if *pos >= len {
            *pos = len + 1;
            return String::new();
        }

        let rest = &self.line[*pos..];
        if !rest.starts_with('"') {
            return match rest.find(',') {
                Some(end) => {
                    let cell = rest[..end].to_string();
                    *pos += end + 1;
                    cell
                }
                None => {
                    let cell = rest.to_string();
                    *pos = len + 1;
                    cell
                }
            };
        }

        self.quoted.clear();
        let mut start = *pos + 1;
        let mut scan = start;
        loop {
            match self.line[scan..].find('"').map(|i| scan + i) {
                None => {
                    // Quote still open at end of line, continue on the next one
                    self.quoted.push_str(&self.line[start..]);
                    if !self.read_line() {
                        *pos = self.line.len() + 1;
                        return self.quoted.clone();
                    }
                    self.quoted.push('\n');
                    start = 0;
                    scan = 0;
                }
                Some(end) => match self.line.as_bytes().get(end + 1) {
                    None | Some(b',') => {
                        self.quoted.push_str(&self.line[start..end]);
                        *pos = end + 2;
                        return self.quoted.clone();
                    }
                    Some(b'"') => {
                        self.quoted.push_str(&self.line[start..=end]);
                        start = end + 2;
                        scan = start;
                    }
                    // Stray quote, kept as text
                    Some(_) => scan = end + 1,
                },
            }
        }
    }
}

/// One logical row, yielding its cells in order.
///
/// Forward-only: it cannot be rewound, and reading it may consume further
/// lines from the underlying reader.
pub struct CsvRow<'r, R> {
    reader: &'r mut CsvRowReader<R>,
    pos: usize,
}

impl<R: BufRead> Iterator for CsvRow<'_, R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.pos > self.reader.line.len() {
            return None;
        }
        Some(self.reader.read_cell(&mut self.pos))
    }
}

/// Decode the first row of a single encoded line
pub fn decode_line(line: &str) -> Vec<String> {
    CsvRowReader::from_text(line)
        .read_row()
        .unwrap_or_default()
}
