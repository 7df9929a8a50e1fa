//! Upgrade engine for user translation files
//!
//! A user's file is a snapshot of some earlier release plus their own
//! edits. Pinned rules move known old strings to their new wording; a
//! string that matches none of the known old values is a hand edit and is
//! never overwritten.

use crate::error::{Error, Result};
use crate::table::{Header, TranslationTable};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Replace `key`'s text with `value`, but only if it currently holds one
/// of the `accepted` values shipped by earlier releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeRule {
    pub key: &'static str,
    pub accepted: &'static [&'static str],
    pub value: &'static str,
}

/// Result of checking one rule against a user table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// Key missing from the user table or the latest table
    Missing,
    /// User already has the latest text
    Current,
    /// User text is not a known old value
    Customized,
    /// Text replaced
    Applied,
}

impl UpgradeRule {
    /// Create a rule
    pub const fn new(
        key: &'static str,
        accepted: &'static [&'static str],
        value: &'static str,
    ) -> Self {
        Self {
            key,
            accepted,
            value,
        }
    }

    /// Check the rule and apply it if safe
    pub fn apply(&self, user: &mut TranslationTable, latest: &TranslationTable) -> RuleOutcome {
        let (Some(current), Some(newest)) = (user.get(self.key), latest.get(self.key)) else {
            return RuleOutcome::Missing;
        };
        if current == newest {
            return RuleOutcome::Current;
        }
        if !self.accepted.contains(&current) {
            info!("{} has been customised, not upgrading: {}", self.key, current);
            return RuleOutcome::Customized;
        }
        info!("Upgrading {}: {} => {}", self.key, current, self.value);
        user.insert(self.key, self.value);
        RuleOutcome::Applied
    }
}

/// One-off cleanup for files still carrying the first release's header:
/// a credits line that only ever held a placeholder becomes keep-original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyCleanup {
    pub key: &'static str,
    pub placeholder: &'static str,
}

impl LegacyCleanup {
    fn apply(&self, user: &mut TranslationTable) -> bool {
        if user.get(self.key) != Some(self.placeholder) {
            return false;
        }
        info!("Removing obsolete placeholder {}", self.key);
        user.keep_original(self.key);
        true
    }
}

/// What an upgrade did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpgradeReport {
    /// The user table was modified and should be saved
    pub changed: bool,
    /// Keys whose text was replaced
    pub applied: Vec<String>,
    /// Keys left alone because the user edited them
    pub customized: Vec<String>,
    /// Keys moved to keep-original by the legacy cleanup
    pub migrated: Vec<String>,
}

impl UpgradeReport {
    fn record(&mut self, key: &str, outcome: RuleOutcome) {
        match outcome {
            RuleOutcome::Applied => {
                self.changed = true;
                self.applied.push(key.to_string());
            }
            RuleOutcome::Customized => self.customized.push(key.to_string()),
            RuleOutcome::Missing | RuleOutcome::Current => {}
        }
    }
}

/// Applies a fixed rule list to user tables
#[derive(Debug, Clone)]
pub struct Upgrader<'a> {
    language: &'a str,
    rules: &'a [UpgradeRule],
    legacy: Option<LegacyCleanup>,
}

impl<'a> Upgrader<'a> {
    /// Create an upgrader for files of `language`
    pub fn new(language: &'a str, rules: &'a [UpgradeRule]) -> Self {
        Self {
            language,
            rules,
            legacy: None,
        }
    }

    /// Also run a first-release cleanup
    pub fn with_legacy_cleanup(mut self, cleanup: LegacyCleanup) -> Self {
        self.legacy = Some(cleanup);
        self
    }

    /// Bring `user` up to `latest`.
    ///
    /// Fails without touching `user` if its header is missing or names
    /// another language. A user file already at the latest version is left
    /// alone. When anything changes, the header is moved to the latest
    /// version so the next run is a no-op.
    pub fn upgrade(
        &self,
        user: &mut TranslationTable,
        latest: &TranslationTable,
    ) -> Result<UpgradeReport> {
        let latest_version = match latest.header_info() {
            Some(Header::Versioned { version, .. }) => Some(version),
            _ => None,
        };

        let legacy = match user.header_info().ok_or(Error::MissingHeader)? {
            Header::Legacy => true,
            Header::Versioned { language, .. } if language != self.language => {
                return Err(Error::LanguageMismatch {
                    expected: self.language.to_string(),
                    found: language,
                });
            }
            Header::Versioned { version, .. } => {
                if latest_version.as_ref() == Some(&version) {
                    debug!("Translation file is at version {}, nothing to upgrade.", version);
                    return Ok(UpgradeReport::default());
                }
                info!(
                    "Upgrading translation file from version {} to {}.",
                    version,
                    latest_version.as_deref().unwrap_or("?")
                );
                false
            }
        };

        let mut report = UpgradeReport::default();
        if let Some(cleanup) = self.legacy.filter(|_| legacy) {
            if cleanup.apply(user) {
                report.changed = true;
                report.migrated.push(cleanup.key.to_string());
            }
        }
        for rule in self.rules {
            let outcome = rule.apply(user, latest);
            report.record(rule.key, outcome);
        }

        if report.changed {
            if let Some(version) = latest_version {
                user.set_header(version, self.language);
            }
        } else if !report.customized.is_empty() {
            warn!(
                "{} entries kept as customised, translation file not upgraded.",
                report.customized.len()
            );
        }
        Ok(report)
    }
}
