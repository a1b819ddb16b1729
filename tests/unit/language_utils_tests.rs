/*!
 * Tests for language code utilities
 */

use autotranslate::language_utils::{
    display_name, get_language_name, language_codes_match, normalize_to_part2t, select_languages,
    selectable_languages, validate_language_code, LanguageCodeType, TargetLanguage,
};

#[test]
fn test_validateLanguageCode_withPart1AndPart2_shouldDetectType() {
    assert!(matches!(validate_language_code("fr").unwrap(), LanguageCodeType::Part1));
    assert!(matches!(validate_language_code("fra").unwrap(), LanguageCodeType::Part2T));
    assert!(matches!(validate_language_code("fre").unwrap(), LanguageCodeType::Part2B));
    assert!(validate_language_code("").is_err());
    assert!(validate_language_code("french").is_err());
}

#[test]
fn test_normalizeToPart2t_withAllForms_shouldAgree() {
    assert_eq!(normalize_to_part2t("de").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("DEU").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("zh-Hant").unwrap(), "zho");
}

#[test]
fn test_languageCodesMatch_shouldCompareByPrimaryLanguage() {
    assert!(language_codes_match("pt", "pt-BR"));
    assert!(language_codes_match("fre", "fr"));
    assert!(!language_codes_match("de", "nl"));
    assert!(!language_codes_match("zz", "zz"));
}

#[test]
fn test_getLanguageName_shouldReturnEnglishName() {
    assert_eq!(get_language_name("ja").unwrap(), "Japanese");
    assert_eq!(display_name("pt-BR").unwrap(), "Portuguese (Brazil)");
}

#[test]
fn test_selectableLanguages_shouldContainScriptVariants() {
    let codes: Vec<String> = selectable_languages().into_iter().map(|l| l.code).collect();

    assert!(codes.contains(&"zh-Hans".to_string()));
    assert!(codes.contains(&"zh-Hant".to_string()));
}

#[test]
fn test_targetLanguage_toggle_shouldFlipSelection() {
    let mut language = TargetLanguage::new("it", "Italian");
    assert!(!language.selected);

    language.toggle();
    assert!(language.selected);
    assert_eq!(select_languages(&["it"])[0], language);
}
