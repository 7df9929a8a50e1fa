//! CSV row writer
//!
//! The inverse of [`crate::parser`]: values are quoted only when they contain
//! a comma, quote, `\n` or `\r`, and rows are separated by `\r\n`.

use std::borrow::Cow;

/// A value that can be written as one CSV cell
pub trait CsvCell {
    /// Text of the cell before escaping
    fn cell_text(&self) -> Cow<'_, str>;
}

impl CsvCell for str {
    fn cell_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl CsvCell for String {
    fn cell_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl<T: CsvCell + ?Sized> CsvCell for &T {
    fn cell_text(&self) -> Cow<'_, str> {
        (**self).cell_text()
    }
}

/// `None` is written as the literal text `null`
impl<T: CsvCell> CsvCell for Option<T> {
    fn cell_text(&self) -> Cow<'_, str> {
        match self {
            Some(value) => value.cell_text(),
            None => Cow::Borrowed("null"),
        }
    }
}

macro_rules! impl_cell_for_display {
    ($($ty:ty),*) => {
        $(impl CsvCell for $ty {
            fn cell_text(&self) -> Cow<'_, str> {
                Cow::Owned(self.to_string())
            }
        })*
    };
}

impl_cell_for_display!(bool, char, i32, i64, u32, u64, usize);

/// Incremental CSV document builder
#[derive(Debug, Default, Clone)]
pub struct CsvRowWriter {
    buf: String,
}

impl CsvRowWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row, on a new line if anything was written before
    pub fn push_row<I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: CsvCell,
    {
        if !self.buf.is_empty() {
            self.buf.push_str("\r\n");
        }
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            push_escaped(&mut self.buf, &value.cell_text());
        }
        self
    }

    /// True if nothing was written yet
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Text written so far
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Take the finished document
    pub fn finish(self) -> String {
        self.buf
    }
}

/// Encode a single row as one CSV line
pub fn encode_row<I>(values: I) -> String
where
    I: IntoIterator,
    I::Item: CsvCell,
{
    let mut writer = CsvRowWriter::new();
    writer.push_row(values);
    writer.finish()
}

fn needs_quote(s: &str) -> bool {
    s.contains([',', '"', '\n', '\r'])
}

fn push_escaped(buf: &mut String, s: &str) {
    if needs_quote(s) {
        buf.push('"');
        buf.push_str(&s.replace('"', "\"\""));
        buf.push('"');
    } else {
        buf.push_str(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{decode_line, CsvRowReader};

    #[test]
    fn test_minimal_quoting() {
        assert_eq!(encode_row(["simple", "text"]), "simple,text");
        assert_eq!(encode_row(["with,comma"]), "\"with,comma\"");
        assert_eq!(encode_row(["with\"quote"]), "\"with\"\"quote\"");
        assert_eq!(encode_row(["with\nnewline"]), "\"with\nnewline\"");
        assert_eq!(encode_row(["with\rreturn"]), "\"with\rreturn\"");
        assert_eq!(encode_row(["", ""]), ",");
    }

    #[test]
    fn test_none_is_null() {
        let row: [Option<&str>; 2] = [Some("Key"), None];
        assert_eq!(encode_row(row), "Key,null");
    }

    #[test]
    fn test_numbers_render_as_text() {
        assert_eq!(encode_row([1usize, 22]), "1,22");
    }

    #[test]
    fn test_rows_are_separated_by_crlf() {
        let mut writer = CsvRowWriter::new();
        assert!(writer.is_empty());
        writer.push_row(["v3", "chinese"]).push_row(["Greeting", "你好"]);

        assert_eq!(writer.finish(), "v3,chinese\r\nGreeting,你好");
    }

    #[test]
    fn test_write_then_read_normalizes_line_breaks() {
        let values = [
            "plain",
            "a, b",
            "say \"hi\"",
            "two\r\nlines",
            "old\rmac",
            "\"\"",
            ",",
            "",
        ];
        for value in values {
            let line = encode_row(["Key", value]);
            let cells = decode_line(&line);
            let expected = value.replace("\r\n", "\n").replace('\r', "\n");
            assert_eq!(cells, vec!["Key".to_string(), expected], "value {value:?}");
        }
    }

    #[test]
    fn test_document_reads_back_row_by_row() {
        let mut writer = CsvRowWriter::new();
        writer
            .push_row(["v3", "chinese"])
            .push_row(["Letter", "Dear,\nHue"])
            .push_row(["Blank", ""]);
        let text = writer.finish();

        let rows: Vec<_> = CsvRowReader::from_text(&text).rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["Letter", "Dear,\nHue"]);
        assert_eq!(rows[2], vec!["Blank", ""]);
    }

    #[test]
    fn test_output_agrees_with_reference_decoder() {
        let line = encode_row(["Key", "a \"quoted\", value", "multi\nline"]);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(line.as_bytes());

        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "Key");
        assert_eq!(&record[1], "a \"quoted\", value");
        assert_eq!(&record[2], "multi\nline");
    }
}
