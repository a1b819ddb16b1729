/*!
 * Full app lifecycle tests: text file in, string catalog out
 */

use autotranslate::app_config::{Config, TranslationProvider};
use autotranslate::app_controller::Controller;
use autotranslate::catalog::LocalizationDocument;
use autotranslate::file_utils;
use autotranslate::providers::mock::MockProvider;
use autotranslate::translation::CancelFlag;
use std::fs;

use crate::common;

/// Test the complete flow from source text to catalog file
#[test]
fn test_run_withEchoProvider_shouldWriteCatalog() {
    common::init_logging();
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_source_text(temp_dir.path(), "strings.txt").unwrap();
    let output = temp_dir.path().join("Localizable");

    let controller = Controller::new_for_test().unwrap();
    let written = tokio_test::block_on(controller.run(&input, &output, false, CancelFlag::new())).unwrap();

    assert_eq!(written, temp_dir.path().join("Localizable.xcstrings"));
    let doc = LocalizationDocument::from_bytes(&fs::read(&written).unwrap()).unwrap();
    assert_eq!(doc.len(), 3);
    assert_eq!(doc.translation("Settings", "de"), Some("[de] Settings"));
    assert_eq!(doc.translation("Goodbye", "fr"), Some("[fr] Goodbye"));
}

#[test]
fn test_run_existingOutputWithoutForce_shouldRefuse() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_source_text(temp_dir.path(), "strings.txt").unwrap();
    let output = common::create_test_file(temp_dir.path(), "Localizable.xcstrings", "keep me").unwrap();
    let controller = Controller::new_for_test().unwrap();

    let result = tokio_test::block_on(controller.run(&input, &output, false, CancelFlag::new()));
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&output).unwrap(), "keep me");

    tokio_test::block_on(controller.run(&input, &output, true, CancelFlag::new())).unwrap();
    assert!(file_utils::load_catalog_or_default(&output).unwrap().len() == 3);
}

#[test]
fn test_run_missingInput_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    let controller = Controller::new_for_test().unwrap();

    let result = tokio_test::block_on(controller.run(
        &temp_dir.path().join("missing.txt"),
        &temp_dir.path().join("out.xcstrings"),
        false,
        CancelFlag::new(),
    ));

    assert!(result.is_err());
    assert!(!temp_dir.path().join("out.xcstrings").exists());
}

#[test]
fn test_run_unavailableLanguage_shouldNotWriteCatalog() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_source_text(temp_dir.path(), "strings.txt").unwrap();
    let output = temp_dir.path().join("out.xcstrings");
    let config = Config {
        provider: TranslationProvider::Echo,
        target_languages: vec!["de".to_string(), "fr".to_string(), "ja".to_string()],
        ..Config::default()
    };
    let controller = Controller::with_provider(config, Box::new(MockProvider::echo().unavailable_for("fr")));

    let result = tokio_test::block_on(controller.run(&input, &output, false, CancelFlag::new()));

    let message = result.unwrap_err().to_string();
    assert!(message.contains("fr"), "{}", message);
    assert!(!output.exists());
}

#[test]
fn test_run_cancelledBeforeStart_shouldNotWriteCatalog() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_source_text(temp_dir.path(), "strings.txt").unwrap();
    let output = temp_dir.path().join("out.xcstrings");
    let cancel = CancelFlag::new();
    cancel.cancel();
    let controller = Controller::new_for_test().unwrap();

    assert!(tokio_test::block_on(controller.run(&input, &output, false, cancel)).is_err());
    assert!(!output.exists());
}

#[test]
fn test_inspect_shouldDescribeWrittenCatalog() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_source_text(temp_dir.path(), "strings.txt").unwrap();
    let output = temp_dir.path().join("out.xcstrings");
    let controller = Controller::new_for_test().unwrap();
    tokio_test::block_on(controller.run(&input, &output, false, CancelFlag::new())).unwrap();

    let summary = Controller::inspect(&output).unwrap();

    assert!(summary.contains("Source language: en"));
    assert!(summary.contains("strings: 3"));
    assert!(summary.contains("German"));
    assert!(summary.contains("French"));
}

#[test]
fn test_inspect_emptyFile_shouldDescribeDefaultCatalog() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(temp_dir.path(), "empty.xcstrings", "").unwrap();

    let summary = Controller::inspect(&path).unwrap();

    assert!(summary.contains("Source language: en | strings: 0"));
}
