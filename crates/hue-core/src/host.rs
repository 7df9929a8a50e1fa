//! Boundary with the game's language hook
//!
//! The hook hands over the game's line table for the active language, the
//! selected language name, and the language to column map. Nothing that
//! goes wrong in here may escape into the game: [`Localizer::apply`]
//! logs every error or panic and reports that it did nothing.

use crate::bundled;
use crate::config::Config;
use crate::diagnostics::{spawn_dump, DUMP_FILE_NAME};
use crate::error::{Error, Result};
use crate::merger::{merge_lines, ColumnMode, MergeReport};
use crate::store::{Origin, TranslationStore};
use crate::table::TranslationTable;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{error, info, warn};

/// Host-owned state borrowed for one call.
///
/// `lines` is edited in place and never resized.
pub struct HostTables<'a> {
    pub lines: &'a mut [String],
    pub selected_language: &'a mut String,
    pub language_columns: &'a mut HashMap<String, usize>,
}

/// What a successful call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The game already showed the translation; only the column was selected
    AlreadyActive,
    /// The translation was merged into the line table
    Merged(MergeReport),
}

/// Column index the subtitle table must use
pub fn subtitle_language_index(mode: ColumnMode) -> usize {
    mode.language_index()
}

/// Installs the translation into the game's tables
#[derive(Debug, Clone)]
pub struct Localizer {
    config: Config,
    store: TranslationStore,
}

impl Localizer {
    /// Use the translation file in the config's data directory
    pub fn new(config: Config) -> Self {
        let store = TranslationStore::in_dir(&config.data_dir());
        Self { config, store }
    }

    /// Use an explicit store
    pub fn with_store(config: Config, store: TranslationStore) -> Self {
        Self { config, store }
    }

    /// Load or create the config in `dir` and keep all files there
    pub fn from_data_dir(dir: &Path) -> Self {
        let mut config = Config::load_or_create(dir.join(Config::FILE_NAME));
        config.data_dir = Some(dir.to_path_buf());
        Self::new(config)
    }

    /// Settings in effect
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Where the translation file is read and saved
    pub fn store(&self) -> &TranslationStore {
        &self.store
    }

    /// Column the translated text is shown from
    pub fn language_index(&self) -> usize {
        self.config.column_mode.language_index()
    }

    /// Install the translation, containing every failure.
    ///
    /// Returns `None` if nothing was done; the reason is in the log.
    pub fn apply(&self, host: HostTables<'_>) -> Option<Applied> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.try_apply(host))) {
            Ok(Ok(applied)) => Some(applied),
            Ok(Err(e)) => {
                error!("{}", e);
                None
            }
            Err(payload) => {
                error!("{}", Error::Panicked(panic_message(payload.as_ref())));
                None
            }
        }
    }

    /// Install the translation.
    ///
    /// The line table is only modified once the translation has been
    /// loaded and validated.
    pub fn try_apply(&self, host: HostTables<'_>) -> Result<Applied> {
        if host.lines.len() <= 1 {
            return Err(Error::EmptyLineTable);
        }
        let language = self.config.language.as_str();
        let mode = self.config.column_mode;

        if host.selected_language.as_str() == language {
            info!(
                "Game language is already {}, index {}.",
                language,
                mode.language_index()
            );
            select_language(host.language_columns, language, mode);
            return Ok(Applied::AlreadyActive);
        }

        info!(
            "Original game language is {}. {} lines found.",
            host.selected_language,
            host.lines.len()
        );
        if self.config.dump_original {
            let path = self.config.data_dir().join(DUMP_FILE_NAME);
            spawn_dump(host.lines.to_vec(), path);
        }

        let table = self.load_table();
        let report = merge_lines(host.lines, &table, language, self.config.policy())?;

        *host.selected_language = language.to_string();
        select_language(host.language_columns, language, mode);
        Ok(Applied::Merged(report))
    }

    /// Load the user's translation, upgrading and saving it if an upgrade
    /// applies, or the bundled one if there is no usable user file.
    pub fn load_table(&self) -> TranslationTable {
        let loaded = self.store.load();
        let mut table = TranslationTable::from_csv(&loaded.text);
        if loaded.origin == Origin::User {
            self.upgrade_user_table(&mut table);
        }
        info!(
            "{} data loaded ({} translated, {} keep original).",
            self.config.language,
            table.translated_count(),
            table.keep_original_count()
        );
        table
    }

    fn upgrade_user_table(&self, table: &mut TranslationTable) {
        let latest = self.store.default_table();
        match bundled::upgrader(&self.config.language).upgrade(table, &latest) {
            Ok(report) if report.changed => {
                info!("{} entries upgraded.", report.applied.len() + report.migrated.len());
                if let Err(e) = self.store.save(table) {
                    warn!("Upgraded translation not saved: {}", e);
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Translation file not upgraded: {}", e),
        }
    }
}

/// Point the host's language map at the translated column.
///
/// Replacing drops whatever language owned column 1; appending keeps the
/// source languages and adds the translation after them.
fn select_language(columns: &mut HashMap<String, usize>, language: &str, mode: ColumnMode) {
    let index = mode.language_index();
    columns.retain(|name, i| name != language && *i != index);
    columns.insert(language.to_string(), index);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merger::MissingText;
    use std::fs;

    const DEFAULT: &str = "v3,chinese\r\nGreeting,你好呀\r\nBye,再见\r\nLogo,\r\n";

    fn localizer(dir: &Path, config: Config) -> Localizer {
        let store = TranslationStore::new(dir.join("t.csv"), DEFAULT);
        let config = Config {
            data_dir: Some(dir.to_path_buf()),
            ..config
        };
        Localizer::with_store(config, store)
    }

    fn game() -> (Vec<String>, String, HashMap<String, usize>) {
        let lines = ["Column,english", "Greeting,Hello", "Bye,Goodbye", "Logo,HUE", "New,Fresh"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let columns = HashMap::from([("english".to_string(), 1)]);
        (lines, "english".to_string(), columns)
    }

    #[test]
    fn test_merges_bundled_when_no_user_file() {
        let dir = tempfile::tempdir().unwrap();
        let localizer = localizer(dir.path(), Config::default());
        let (mut lines, mut selected, mut columns) = game();

        let applied = localizer.apply(HostTables {
            lines: &mut lines,
            selected_language: &mut selected,
            language_columns: &mut columns,
        });

        let Some(Applied::Merged(report)) = applied else {
            panic!("expected a merge");
        };
        assert_eq!(report.updated, 2);
        assert_eq!(report.kept, 1);
        assert_eq!(report.untranslated, vec!["New"]);
        assert_eq!(
            lines,
            vec!["Column,chinese", "Greeting,你好呀", "Bye,再见", "Logo,HUE", "New,Fresh"]
        );
        assert_eq!(selected, "chinese");
        assert_eq!(columns, HashMap::from([("chinese".to_string(), 1)]));
        assert_eq!(fs::read_to_string(localizer.store().path()).unwrap(), DEFAULT);
    }

    #[test]
    fn test_user_file_is_upgraded_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let localizer = localizer(dir.path(), Config::default());
        fs::write(
            localizer.store().path(),
            "v2,chinese\nMenu_Continue,继续游戏\nGreeting,嗨\nBye,再见\n",
        )
        .unwrap();
        // Rule targets must exist in the default for the rule to fire
        let store = TranslationStore::new(
            localizer.store().path(),
            "v3,chinese\nMenu_Continue,继续\nGreeting,你好呀\nBye,再见\n",
        );
        let localizer = Localizer::with_store(localizer.config().clone(), store);

        let table = localizer.load_table();

        assert_eq!(table.get("Menu_Continue"), Some("继续"));
        assert_eq!(table.get("Greeting"), Some("嗨"));
        let saved = TranslationTable::from_csv(&localizer.store.load().text);
        assert_eq!(saved, table);
        assert_eq!(saved.header.as_deref().map(|h| h[0].as_str()), Some("v3"));
    }

    #[test]
    fn test_already_active_only_selects_column() {
        let dir = tempfile::tempdir().unwrap();
        let localizer = localizer(dir.path(), Config::default());
        let (mut lines, _, mut columns) = game();
        let before = lines.clone();
        let mut selected = "chinese".to_string();

        let applied = localizer.apply(HostTables {
            lines: &mut lines,
            selected_language: &mut selected,
            language_columns: &mut columns,
        });

        assert_eq!(applied, Some(Applied::AlreadyActive));
        assert_eq!(lines, before);
        assert_eq!(columns.get("chinese"), Some(&1));
        assert!(!localizer.store().path().exists());
    }

    #[test]
    fn test_append_mode_keeps_source_language() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            column_mode: ColumnMode::Append,
            missing_text: MissingText::Marker,
            ..Config::default()
        };
        let localizer = localizer(dir.path(), config);
        let (mut lines, mut selected, mut columns) = game();

        localizer
            .apply(HostTables {
                lines: &mut lines,
                selected_language: &mut selected,
                language_columns: &mut columns,
            })
            .unwrap();

        assert_eq!(lines[0], "Column,english,chinese");
        assert_eq!(lines[4], "New,Fresh,?");
        assert_eq!(columns.get("english"), Some(&1));
        assert_eq!(columns.get("chinese"), Some(&2));
        assert_eq!(localizer.language_index(), 2);
        assert_eq!(subtitle_language_index(ColumnMode::Append), 2);
    }

    #[test]
    fn test_corrupt_user_file_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let localizer = localizer(dir.path(), Config::default());
        fs::write(localizer.store().path(), "v3,chinese\nGreeting,嗨\n").unwrap();
        let (mut lines, mut selected, mut columns) = game();
        let before = (lines.clone(), selected.clone(), columns.clone());

        let applied = localizer.apply(HostTables {
            lines: &mut lines,
            selected_language: &mut selected,
            language_columns: &mut columns,
        });

        assert!(applied.is_none());
        assert_eq!((lines, selected, columns), before);
    }

    #[test]
    fn test_header_only_table_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let localizer = localizer(dir.path(), Config::default());
        let mut lines = vec!["Column,english".to_string()];
        let mut selected = "english".to_string();
        let mut columns = HashMap::new();

        let err = localizer.try_apply(HostTables {
            lines: &mut lines,
            selected_language: &mut selected,
            language_columns: &mut columns,
        });

        assert!(matches!(err, Err(Error::EmptyLineTable)));
    }

    #[test]
    fn test_dump_is_written_before_merge() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            dump_original: true,
            ..Config::default()
        };
        let localizer = localizer(dir.path(), config);
        let (mut lines, mut selected, mut columns) = game();
        let original = lines.join("\r\n");

        localizer
            .apply(HostTables {
                lines: &mut lines,
                selected_language: &mut selected,
                language_columns: &mut columns,
            })
            .unwrap();

        let dump = dir.path().join(DUMP_FILE_NAME);
        for _ in 0..100 {
            if fs::read_to_string(&dump).is_ok_and(|text| text == original) {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        panic!("dump was not written");
    }

    #[test]
    fn test_panic_message() {
        let payload = panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload = panic::catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "code 7");
    }
}
