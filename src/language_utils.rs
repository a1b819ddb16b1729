use anyhow::{Result, anyhow};
use isolang::Language;
use std::hash::{Hash, Hasher};

/// Language utilities for catalog language codes
///
/// String catalogs key localizations by BCP 47 style tags ("de", "pt-BR",
/// "zh-Hans"). The primary subtag is an ISO 639-1 or ISO 639-2 code; this
/// module validates, normalizes and names such codes, and holds the list of
/// languages a caller can pick from.
/// Language code type
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Languages offered for selection, as (catalog code, display name)
const SELECTABLE_LANGUAGES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("zh-Hans", "Chinese (Simplified)"),
    ("zh-Hant", "Chinese (Traditional)"),
    ("nl", "Dutch"),
    ("en", "English"),
    ("fr", "French"),
    ("de", "German"),
    ("hi", "Hindi"),
    ("id", "Indonesian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("pl", "Polish"),
    ("pt-BR", "Portuguese (Brazil)"),
    ("ru", "Russian"),
    ("es", "Spanish"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("vi", "Vietnamese"),
];

/// A language the caller can translate into.
///
/// Identity is the catalog code alone: two entries with the same code are
/// the same language regardless of name or selection.
#[derive(Debug, Clone)]
pub struct TargetLanguage {
    /// Catalog language code (e.g. "de", "pt-BR")
    pub code: String,
    /// Human readable name
    pub display_name: String,
    /// Whether the caller picked this language
    pub selected: bool,
}

impl TargetLanguage {
    /// Create an unselected language
    pub fn new(code: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
            selected: false,
        }
    }

    /// Create a selected language, naming it from its code when possible
    pub fn selected(code: impl Into<String>) -> Self {
        let code = code.into();
        let display_name = display_name(&code).unwrap_or_else(|_| code.clone());
        Self {
            code,
            display_name,
            selected: true,
        }
    }

    /// Toggle the selection state
    pub fn toggle(&mut self) {
        self.selected = !self.selected;
    }
}

impl PartialEq for TargetLanguage {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for TargetLanguage {}

impl Hash for TargetLanguage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

/// All selectable target languages, none selected
pub fn selectable_languages() -> Vec<TargetLanguage> {
    SELECTABLE_LANGUAGES
        .iter()
        .map(|(code, name)| TargetLanguage::new(*code, *name))
        .collect()
}

/// Build a selection from a list of codes, preserving order and dropping repeats
pub fn select_languages<S: AsRef<str>>(codes: &[S]) -> Vec<TargetLanguage> {
    let mut selection: Vec<TargetLanguage> = Vec::with_capacity(codes.len());
    for code in codes {
        let language = TargetLanguage::selected(code.as_ref().trim());
        if !selection.contains(&language) {
            selection.push(language);
        }
    }
    selection
}

/// Primary language subtag of a catalog code ("pt-BR" -> "pt")
pub fn primary_subtag(code: &str) -> &str {
    let code = code.trim();
    code.split(['-', '_']).next().unwrap_or(code)
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let normalized_code = primary_subtag(code).to_lowercase();

    if normalized_code.len() == 2 {
        if Language::from_639_1(&normalized_code).is_some() {
            return Ok(LanguageCodeType::Part1);
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(LanguageCodeType::Part2T);
        }
        if PART2B_TO_PART2T.iter().any(|(b, _)| *b == normalized_code) {
            return Ok(LanguageCodeType::Part2B);
        }
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = primary_subtag(code).to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
        if let Some((_, t)) = PART2B_TO_PART2T.iter().find(|(b, _)| *b == normalized_code) {
            return Ok(t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two language codes represent the same primary language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Display name for a catalog code, preferring the selectable list
pub fn display_name(code: &str) -> Result<String> {
    if let Some((_, name)) = SELECTABLE_LANGUAGES.iter().find(|(c, _)| *c == code) {
        return Ok(name.to_string());
    }
    get_language_name(code)
}
