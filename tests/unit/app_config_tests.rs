/*!
 * Tests for application configuration functionality
 */

use autotranslate::app_config::{Config, LogLevel, OllamaConfig, TranslationProvider, MAX_RETRIES};

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_languages, vec!["de", "fr"]);
    assert_eq!(config.output_path, "Localizable.xcstrings");
    assert_eq!(config.provider, TranslationProvider::Ollama);
    assert_eq!(config.ollama.model, "llama3.2:3b");
    assert_eq!(config.ollama.endpoint, "http://localhost:11434");
    assert_eq!(config.ollama.timeout_secs, 120);
    assert!(config.ollama.pull_missing_models);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();

    config.target_languages = vec!["de".to_string(), "nope".to_string()];
    assert!(config.validate().is_err());
    config.target_languages = vec!["pt-BR".to_string(), "zh-Hans".to_string()];
    assert!(config.validate().is_ok());

    config.ollama.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());

    // The echo provider never talks to the endpoint
    config.provider = TranslationProvider::Echo;
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_withZeroTimeout_shouldFail() {
    let config = Config {
        ollama: OllamaConfig {
            timeout_secs: 0,
            ..OllamaConfig::default()
        },
        ..Config::default()
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_config_deserialize_withMissingFields_shouldUseDefaults() {
    let json = r#"{ "source_language": "fr", "provider": "echo" }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.source_language, "fr");
    assert_eq!(config.provider, TranslationProvider::Echo);
    assert!(config.target_languages.is_empty());
    assert_eq!(config.ollama.max_retries, 2);
    assert_eq!(config.output_path, "Localizable.xcstrings");
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("conf.json");

    let created = Config::load_or_create(&path).unwrap();
    assert!(path.exists());

    let reloaded = Config::from_file(&path).unwrap();
    assert_eq!(reloaded.source_language, created.source_language);
    assert_eq!(reloaded.target_languages, created.target_languages);
}

#[test]
fn test_fromFile_withInvalidJson_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ nope").unwrap();

    assert!(Config::from_file(&path).is_err());
}

#[test]
fn test_translationProvider_display_shouldBeLowercaseIdentifier() {
    assert_eq!(TranslationProvider::Echo.to_string(), "echo");
    assert_eq!(TranslationProvider::Ollama.to_string(), "ollama");
    assert_eq!(TranslationProvider::Ollama.display_name(), "Ollama");
}

#[test]
fn test_targetsMatchingSource_shouldCompareByLanguageNotSpelling() {
    let config = Config {
        source_language: "fr".to_string(),
        target_languages: vec!["de".to_string(), "fre".to_string(), "fr".to_string(), "pt-BR".to_string()],
        ..Config::default()
    };

    assert_eq!(config.targets_matching_source(), vec!["fre", "fr"]);
    // Same-language targets are reported, not rejected
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_withTooManyRetries_shouldFail() {
    let mut config = Config::default();
    config.ollama.max_retries = MAX_RETRIES;
    assert!(config.validate().is_ok());

    config.ollama.max_retries = u32::MAX;
    assert!(config.validate().is_err());
}

#[test]
fn test_logLevel_toLevelFilter_shouldMapEachLevel() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
