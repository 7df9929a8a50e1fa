//! In-memory translation table

use crate::parser::CsvRowReader;
use crate::writer::CsvRowWriter;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// Key used by the game's own column header row
pub const HEADER_KEY: &str = "Column";

/// A translation document: key to translated text, plus keys that are
/// deliberately left untranslated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationTable {
    /// First row of the document, `None` if it had no rows
    pub header: Option<Vec<String>>,
    translated: IndexMap<String, String>,
    keep_original: IndexSet<String>,
}

/// Version marker carried by a translation file's header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    /// First release: a copy of the game's `Column,english` header
    Legacy,
    /// `<version>,<language>`
    Versioned { version: String, language: String },
}

impl TranslationTable {
    /// Create an empty table with no header
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with a `<version>,<language>` header
    pub fn with_header(version: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            header: Some(vec![version.into(), language.into()]),
            ..Self::default()
        }
    }

    /// Decode a whole CSV document
    pub fn from_csv(text: &str) -> Self {
        Self::from_reader(CsvRowReader::from_text(text))
    }

    /// Decode rows from a reader.
    ///
    /// The first row is the header. Rows with fewer than two cells, an empty
    /// key, or the game's `Column` key are skipped. An empty translation cell
    /// marks the key as keep-original; line breaks in translated text become
    /// spaces.
    pub fn from_reader<R: BufRead>(mut reader: CsvRowReader<R>) -> Self {
        let mut table = Self::new();
        while let Some(cells) = reader.read_row() {
            if table.header.is_none() {
                table.header = Some(cells);
                continue;
            }
            let [key, text, ..] = cells.as_slice() else {
                continue;
            };
            if key.is_empty() || key == HEADER_KEY {
                continue;
            }
            if text.is_empty() {
                table.keep_original(key.clone());
            } else {
                table.insert(key.clone(), text.clone());
            }
        }
        table
    }

    /// Set a key's translated text, taking it out of keep-original.
    ///
    /// Empty text marks the key keep-original instead.
    pub fn insert(&mut self, key: impl Into<String>, text: impl AsRef<str>) {
        let key = key.into();
        let text = single_line(text.as_ref());
        if text.is_empty() {
            self.keep_original(key);
            return;
        }
        self.keep_original.shift_remove(&key);
        self.translated.insert(key, text);
    }

    /// Mark a key keep-original, dropping any translation it had
    pub fn keep_original(&mut self, key: impl Into<String>) {
        let key = key.into();
        self.translated.shift_remove(&key);
        self.keep_original.insert(key);
    }

    /// Translated text for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.translated.get(key).map(String::as_str)
    }

    /// Whether a key is marked keep-original
    pub fn is_keep_original(&self, key: &str) -> bool {
        self.keep_original.contains(key)
    }

    /// Number of translated keys
    pub fn translated_count(&self) -> usize {
        self.translated.len()
    }

    /// Number of keep-original keys
    pub fn keep_original_count(&self) -> usize {
        self.keep_original.len()
    }

    /// Translated entries in document order
    pub fn translations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.translated
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keep-original keys in document order
    pub fn kept_keys(&self) -> impl Iterator<Item = &str> {
        self.keep_original.iter().map(String::as_str)
    }

    /// Interpret the header row
    pub fn header_info(&self) -> Option<Header> {
        let header = self.header.as_ref()?;
        match header.as_slice() {
            [key, language, ..] if key == HEADER_KEY && language == "english" => {
                Some(Header::Legacy)
            }
            [version, language, ..] if !version.is_empty() && !language.is_empty() => {
                Some(Header::Versioned {
                    version: version.clone(),
                    language: language.clone(),
                })
            }
            _ => None,
        }
    }

    /// Replace the header with `<version>,<language>`
    pub fn set_header(&mut self, version: impl Into<String>, language: impl Into<String>) {
        self.header = Some(vec![version.into(), language.into()]);
    }

    /// Encode as a full document: header, translations, then keep-original
    /// keys with an empty cell.
    pub fn to_csv(&self) -> String {
        let mut writer = CsvRowWriter::new();
        if let Some(header) = &self.header {
            writer.push_row(header);
        }
        for (key, text) in self.translations() {
            writer.push_row([key, text]);
        }
        for key in self.kept_keys() {
            writer.push_row([key, ""]);
        }
        let mut text = writer.finish();
        text.push_str("\r\n");
        text
    }
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_csv() {
        let csv = "v3,chinese\r\nGreeting,你好\r\nBye,再见\r\nLogo,\r\n";
        let table = TranslationTable::from_csv(csv);

        assert_eq!(table.translated_count(), 2);
        assert_eq!(table.keep_original_count(), 1);
        assert_eq!(table.get("Greeting"), Some("你好"));
        assert!(table.is_keep_original("Logo"));
        assert_eq!(
            table.header_info(),
            Some(Header::Versioned {
                version: "v3".to_string(),
                language: "chinese".to_string()
            })
        );
    }

    #[test]
    fn test_translated_text_is_single_line() {
        let csv = "v3,chinese\nLetter,\"第一行\r\n第二行\"\n";
        let table = TranslationTable::from_csv(csv);

        assert_eq!(table.get("Letter"), Some("第一行 第二行"));
    }

    #[test]
    fn test_skips_short_and_header_rows() {
        let csv = "Column,english\n\nlonely\n,orphan\nColumn,english\nKey,值\n";
        let table = TranslationTable::from_csv(csv);

        assert_eq!(table.header_info(), Some(Header::Legacy));
        assert_eq!(table.translated_count(), 1);
        assert_eq!(table.keep_original_count(), 0);
        assert!(table.get(HEADER_KEY).is_none());
    }

    #[test]
    fn test_key_in_one_set_only() {
        let csv = "v3,chinese\nA,甲\nA,\nB,\nB,乙\n";
        let table = TranslationTable::from_csv(csv);

        assert!(table.get("A").is_none());
        assert!(table.is_keep_original("A"));
        assert_eq!(table.get("B"), Some("乙"));
        assert!(!table.is_keep_original("B"));
    }

    #[test]
    fn test_empty_document() {
        let table = TranslationTable::from_csv("");

        assert!(table.header.is_none());
        assert!(table.header_info().is_none());
        assert_eq!(table.translated_count(), 0);
    }

    #[test]
    fn test_to_csv_orders_header_translations_then_kept() {
        let mut table = TranslationTable::with_header("v3", "chinese");
        table.keep_original("Logo");
        table.insert("Greeting", "你好, 朋友");

        assert_eq!(
            table.to_csv(),
            "v3,chinese\r\nGreeting,\"你好, 朋友\"\r\nLogo,\r\n"
        );
        assert_eq!(TranslationTable::from_csv(&table.to_csv()), table);
    }
}
