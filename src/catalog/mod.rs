/*!
 * Xcode string catalog (`.xcstrings`) support.
 *
 * - `document`: the in-memory catalog built during a translation run
 * - `codec`: deterministic encoder and lenient-on-empty decoder
 */

pub mod codec;
pub mod document;

pub use document::{
    LocalizationDocument, LocalizationEntry, TranslationUnit, CATALOG_VERSION,
    DEFAULT_SOURCE_LANGUAGE, TRANSLATED_STATE,
};

/// File extension of a string catalog
pub const CATALOG_EXTENSION: &str = "xcstrings";
