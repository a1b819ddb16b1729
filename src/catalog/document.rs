/*!
 * String catalog document model.
 *
 * A `LocalizationDocument` maps every source string of a run to the
 * translations produced for it, keyed by language code. Maps are ordered so
 * that serialization is deterministic at every level.
 */

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::DocumentError;

use super::codec;

/// Catalog format version written by Xcode
pub const CATALOG_VERSION: &str = "1.0";

/// State recorded on every unit the orchestrator produces
pub const TRANSLATED_STATE: &str = "translated";

/// Source language of a brand-new catalog
pub const DEFAULT_SOURCE_LANGUAGE: &str = "en";

/// Complete string catalog with all translations of the current run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizationDocument {
    /// Language the source strings are written in
    source_language: String,

    /// Entries keyed by the exact source string
    strings: BTreeMap<String, LocalizationEntry>,

    /// Catalog format version
    #[serde(default = "default_version")]
    version: String,
}

impl LocalizationDocument {
    /// Create an empty document for the given source language.
    pub fn new(source_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            strings: BTreeMap::new(),
            version: CATALOG_VERSION.to_string(),
        }
    }

    /// Record the translation of `source_text` into `language_code`.
    ///
    /// Recording the same pair twice keeps only the last value.
    pub fn record_translation(&mut self, source_text: &str, language_code: &str, value: &str) {
        self.strings
            .entry(source_text.to_string())
            .or_default()
            .localizations
            .insert(
                language_code.to_string(),
                Localization {
                    string_unit: TranslationUnit::translated(value),
                },
            );
    }

    /// Drop every entry and switch to a new source language.
    pub fn reset(&mut self, source_language: &str) {
        self.source_language = source_language.to_string();
        self.strings.clear();
    }

    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Number of distinct source strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Look up the entry for a source string.
    pub fn entry(&self, source_text: &str) -> Option<&LocalizationEntry> {
        self.strings.get(source_text)
    }

    /// Iterate entries in source-string order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &LocalizationEntry)> {
        self.strings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Translated value of `source_text` in `language_code`, if recorded.
    pub fn translation(&self, source_text: &str, language_code: &str) -> Option<&str> {
        self.entry(source_text)
            .and_then(|entry| entry.unit(language_code))
            .map(TranslationUnit::value)
    }

    /// Every language code that appears in at least one entry.
    pub fn languages(&self) -> BTreeSet<&str> {
        self.strings
            .values()
            .flat_map(|entry| entry.localizations.keys().map(String::as_str))
            .collect()
    }

    /// Number of translation units per language code.
    pub fn coverage(&self) -> BTreeMap<&str, usize> {
        let mut coverage = BTreeMap::new();
        for entry in self.strings.values() {
            for language in entry.localizations.keys() {
                *coverage.entry(language.as_str()).or_insert(0) += 1;
            }
        }
        coverage
    }

    /// Total number of translation units across all entries.
    pub fn unit_count(&self) -> usize {
        self.strings.values().map(|e| e.localizations.len()).sum()
    }

    /// Encode the document in the Xcode string catalog layout.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        codec::encode(self)
    }

    /// Decode a catalog.
    ///
    /// An empty payload yields the default document; anything that is not a
    /// valid catalog is reported as `DocumentError::Malformed`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        codec::decode(bytes)
    }
}

impl Default for LocalizationDocument {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_LANGUAGE)
    }
}

/// All localizations of a single source string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizationEntry {
    #[serde(default)]
    localizations: BTreeMap<String, Localization>,
}

impl LocalizationEntry {
    /// Translation unit for a language, if recorded.
    pub fn unit(&self, language_code: &str) -> Option<&TranslationUnit> {
        self.localizations.get(language_code).map(|l| &l.string_unit)
    }

    pub fn language_codes(&self) -> impl Iterator<Item = &str> {
        self.localizations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.localizations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.localizations.is_empty()
    }
}

/// Wrapper matching the catalog's `{ "stringUnit": .. }` nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localization {
    #[serde(rename = "stringUnit")]
    string_unit: TranslationUnit,
}

/// One translated value. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationUnit {
    state: String,
    value: String,
}

impl TranslationUnit {
    fn translated(value: &str) -> Self {
        Self {
            state: TRANSLATED_STATE.to_string(),
            value: value.to_string(),
        }
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

fn default_version() -> String {
    CATALOG_VERSION.to_string()
}
