//! Translation data shipped with the plugin

use crate::table::TranslationTable;
use crate::upgrade::{LegacyCleanup, UpgradeRule, Upgrader};

/// Default translation, also the reference for upgrades
pub const BUNDLED_CSV: &str = include_str!("../assets/HueZh.csv");

/// File name of the user-editable copy
pub const FILE_NAME: &str = "HueZh.csv";

/// Language name the game and the translation file header use
pub const LANGUAGE: &str = "chinese";

/// Strings reworded since earlier releases, with every wording they shipped as
pub const UPGRADE_RULES: &[UpgradeRule] = &[
    UpgradeRule::new("Menu_Continue", &["继续游戏"], "继续"),
    UpgradeRule::new("Options_Subtitles", &["字幕显示", "显示字幕"], "字幕"),
    UpgradeRule::new("Pause_Restart", &["重新开始"], "从上一个存档点重新开始"),
    UpgradeRule::new(
        "Hint_ColourWheel",
        &["按住 Shift 打开色轮", "按住 Shift 键打开色轮"],
        "按住 Shift 键打开色轮，选择颜色",
    ),
];

/// First release shipped this credits line with a placeholder
pub const LEGACY_CLEANUP: LegacyCleanup = LegacyCleanup {
    key: "Credits_Localisation",
    placeholder: "中文化：（待定）",
};

/// Decode the bundled translation
pub fn bundled_table() -> TranslationTable {
    TranslationTable::from_csv(BUNDLED_CSV)
}

/// Upgrader carrying the shipped rules
pub fn upgrader(language: &str) -> Upgrader<'_> {
    Upgrader::new(language, UPGRADE_RULES).with_legacy_cleanup(LEGACY_CLEANUP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Header;

    #[test]
    fn test_bundled_table_is_usable() {
        let table = bundled_table();

        assert!(table.translated_count() > 1);
        assert!(matches!(
            table.header_info(),
            Some(Header::Versioned { language, .. }) if language == LANGUAGE
        ));
        assert!(table.get("Letter_01").is_some_and(|t| !t.contains('\n')));
        assert!(table.is_keep_original("Logo_Title"));
    }

    #[test]
    fn test_rules_target_bundled_text() {
        let table = bundled_table();

        for rule in UPGRADE_RULES {
            assert_eq!(table.get(rule.key), Some(rule.value), "{}", rule.key);
            assert!(!rule.accepted.contains(&rule.value), "{}", rule.key);
        }
        assert!(table.is_keep_original(LEGACY_CLEANUP.key));
    }

    #[test]
    fn test_bundled_table_needs_no_upgrade() {
        let mut table = bundled_table();

        let report = upgrader(LANGUAGE).upgrade(&mut table, &bundled_table()).unwrap();
        assert!(!report.changed);
    }
}
