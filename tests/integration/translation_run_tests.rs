/*!
 * End-to-end translation runs against the mock provider
 */

use autotranslate::catalog::{LocalizationDocument, TRANSLATED_STATE};
use autotranslate::errors::TranslationError;
use autotranslate::language_utils::{select_languages, TargetLanguage};
use autotranslate::providers::mock::MockProvider;
use autotranslate::providers::SessionProvider;
use autotranslate::translation::{
    BatchResult, CancelFlag, RunDriver, RunState, Step, TranslationOrchestrator,
};
use std::time::Duration;

use crate::common;

#[tokio::test]
async fn test_run_twoLanguages_shouldTranslateEveryLine() {
    common::init_logging();
    let provider = MockProvider::echo();
    let mut orchestrator = TranslationOrchestrator::default();

    let doc = RunDriver::new(&provider)
        .run(&mut orchestrator, "Hello\nGoodbye", "en", &select_languages(&["de", "fr"]))
        .await
        .unwrap();

    assert_eq!(orchestrator.current_state(), &RunState::Done);
    assert_eq!(doc.source_language(), "en");
    assert_eq!(doc.len(), 2);
    for line in ["Hello", "Goodbye"] {
        let entry = doc.entry(line).unwrap();
        assert_eq!(entry.language_codes().collect::<Vec<_>>(), vec!["de", "fr"]);
        for language in ["de", "fr"] {
            let unit = entry.unit(language).unwrap();
            assert_eq!(unit.state(), TRANSLATED_STATE);
            assert_eq!(unit.value(), MockProvider::translate_text(language, line));
        }
    }
}

#[tokio::test]
async fn test_run_nLanguagesMLines_shouldProduceNTimesMUnits() {
    let provider = MockProvider::echo();
    let stats = provider.stats();
    let targets = select_languages(&["de", "fr", "ja", "pt-BR"]);
    let text = "One\nTwo\nThree\nFour\nFive";
    let mut orchestrator = TranslationOrchestrator::default();

    let doc = RunDriver::new(&provider)
        .run(&mut orchestrator, text, "en", &targets)
        .await
        .unwrap();

    assert_eq!(doc.unit_count(), 4 * 5);
    let requested: Vec<(String, String)> = stats.session_requests();
    assert_eq!(
        requested,
        vec![
            ("en".to_string(), "de".to_string()),
            ("en".to_string(), "fr".to_string()),
            ("en".to_string(), "ja".to_string()),
            ("en".to_string(), "pt-BR".to_string()),
        ]
    );
    assert_eq!(stats.batch_count(), 4);
}

#[tokio::test]
async fn test_run_blankLinesOnly_shouldRecordOneEmptyEntry() {
    let provider = MockProvider::echo();
    let mut orchestrator = TranslationOrchestrator::default();

    let doc = RunDriver::new(&provider)
        .run(&mut orchestrator, "\n\n", "en", &select_languages(&["de", "fr"]))
        .await
        .unwrap();

    assert_eq!(orchestrator.current_state(), &RunState::Done);
    assert_eq!(doc.len(), 1);
    assert_eq!(doc.unit_count(), 2);
    let entry = doc.entry("").unwrap();
    assert_eq!(entry.language_codes().collect::<Vec<_>>(), vec!["de", "fr"]);
    for language in ["de", "fr"] {
        assert_eq!(entry.unit(language).unwrap().value(), MockProvider::translate_text(language, ""));
    }
}

#[tokio::test]
async fn test_run_withSlowSessions_shouldNeverHoldTwoSessions() {
    let provider = MockProvider::echo().with_session_delay(Duration::from_millis(5));
    let stats = provider.stats();
    let mut orchestrator = TranslationOrchestrator::default();

    RunDriver::new(&provider)
        .run(&mut orchestrator, "A\nB", "en", &select_languages(&["de", "fr", "it", "es"]))
        .await
        .unwrap();

    assert_eq!(stats.max_live_sessions(), 1);
    assert_eq!(stats.live_sessions(), 0);
}

#[tokio::test]
async fn test_run_emptySelection_shouldStayIdleWithoutSessions() {
    let provider = MockProvider::echo();
    let mut orchestrator = TranslationOrchestrator::default();
    let unselected = vec![TargetLanguage::new("de", "German"), TargetLanguage::new("fr", "French")];

    let result = RunDriver::new(&provider)
        .run(&mut orchestrator, "Hello", "en", &unselected)
        .await;

    assert_eq!(result, Err(TranslationError::EmptySelection));
    assert_eq!(orchestrator.current_state(), &RunState::Idle);
    assert!(provider.stats().session_requests().is_empty());
}

#[tokio::test]
async fn test_run_secondOfThreeUnavailable_shouldFailAndKeepFirstLanguage() {
    let provider = MockProvider::echo().unavailable_for("fr");
    let stats = provider.stats();
    let mut orchestrator = TranslationOrchestrator::default();

    let result = RunDriver::new(&provider)
        .run(&mut orchestrator, "Hello\nGoodbye", "en", &select_languages(&["de", "fr", "ja"]))
        .await;

    let error = result.unwrap_err();
    assert!(matches!(
        &error,
        TranslationError::SessionUnavailable { target_language, .. } if target_language == "fr"
    ));
    assert_eq!(orchestrator.current_state(), &RunState::Failed(error));

    let partial = orchestrator.document();
    assert_eq!(partial.languages().into_iter().collect::<Vec<_>>(), vec!["de"]);
    assert_eq!(partial.unit_count(), 2);

    // Japanese is never requested and nothing is retried
    assert_eq!(stats.session_requests().len(), 2);
    assert!(matches!(
        orchestrator.export_document(),
        Err(TranslationError::NotReady { .. })
    ));
}

#[tokio::test]
async fn test_run_misalignedBatch_shouldFailWithTranslationFailed() {
    let provider = MockProvider::echo().misaligned_for("de");
    let mut orchestrator = TranslationOrchestrator::default();

    let result = RunDriver::new(&provider)
        .run(&mut orchestrator, "One\nTwo", "en", &select_languages(&["de"]))
        .await;

    assert!(matches!(result, Err(TranslationError::TranslationFailed { .. })));
    assert!(orchestrator.document().is_empty());
}

#[tokio::test]
async fn test_run_afterFailure_shouldStartCleanRun() {
    let failing = MockProvider::echo().unavailable_for("fr");
    let mut orchestrator = TranslationOrchestrator::default();
    let targets = select_languages(&["de", "fr"]);

    assert!(RunDriver::new(&failing).run(&mut orchestrator, "Hi", "en", &targets).await.is_err());

    let healthy = MockProvider::echo();
    let doc = RunDriver::new(&healthy)
        .run(&mut orchestrator, "Bye", "en", &targets)
        .await
        .unwrap();

    assert_eq!(doc.len(), 1);
    assert!(doc.entry("Hi").is_none());
    assert_eq!(doc.translation("Bye", "fr"), Some("[fr] Bye"));
}

#[tokio::test]
async fn test_run_cancelledWhileWaitingForSession_shouldReturnToIdle() {
    let provider = MockProvider::echo().with_session_delay(Duration::from_millis(100));
    let stats = provider.stats();
    let cancel = CancelFlag::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });
    let mut orchestrator = TranslationOrchestrator::default();

    let result = RunDriver::new(&provider)
        .with_cancel_flag(cancel)
        .run(&mut orchestrator, "Hello", "en", &select_languages(&["de", "fr"]))
        .await;

    assert_eq!(result, Err(TranslationError::Cancelled));
    assert_eq!(orchestrator.current_state(), &RunState::Idle);
    assert_eq!(stats.session_requests().len(), 1);
    assert_eq!(stats.live_sessions(), 0);
    assert_eq!(stats.batch_count(), 0);
}

#[tokio::test]
async fn test_staleEvents_afterCancel_shouldBeDiscarded() {
    let provider = MockProvider::echo();
    let mut orchestrator = TranslationOrchestrator::default();

    let request = orchestrator.start("Hello", "en", &select_languages(&["de"])).unwrap();
    let session = provider.request_session("en", "de").await.unwrap();
    assert!(orchestrator.cancel());

    let stale = orchestrator.on_session_ready(request.ticket, session.as_ref()).unwrap();
    assert!(stale.is_none());

    let late_results = vec![BatchResult::new("Hello", "de", "Hallo")];
    assert!(orchestrator.on_batch_complete(request.ticket, late_results).unwrap().is_none());
    assert!(orchestrator.document().is_empty());
    assert_eq!(orchestrator.current_state(), &RunState::Idle);
}

#[tokio::test]
async fn test_manualStepping_shouldMatchDriverResult() {
    let provider = MockProvider::echo();
    let targets = select_languages(&["de", "fr"]);
    let mut orchestrator = TranslationOrchestrator::default();

    let mut request = orchestrator.start("Hello\nGoodbye", "en", &targets).unwrap();
    loop {
        let session = provider
            .request_session(&request.source_language, &request.target_language)
            .await
            .unwrap();
        let batch = orchestrator.on_session_ready(request.ticket, session.as_ref()).unwrap().unwrap();
        let lines = session.translate_batch(&batch.lines).await.unwrap();
        drop(session);

        let results = BatchResult::from_translated(&batch.target_language, lines);
        match orchestrator.on_batch_complete(batch.ticket, results).unwrap() {
            Some(Step::RequestSession(next)) => request = next,
            Some(Step::Finished) => break,
            None => panic!("event unexpectedly discarded"),
        }
    }

    let mut reference = TranslationOrchestrator::default();
    let expected = RunDriver::new(&MockProvider::echo())
        .run(&mut reference, "Hello\nGoodbye", "en", &targets)
        .await
        .unwrap();
    assert_eq!(orchestrator.finished_document().unwrap(), expected);
}

#[tokio::test]
async fn test_exportDocument_afterRun_shouldRoundTrip() {
    let provider = MockProvider::echo();
    let mut orchestrator = TranslationOrchestrator::default();

    let doc = RunDriver::new(&provider)
        .run(&mut orchestrator, "Save\nCancel\nSave", "en", &select_languages(&["ko"]))
        .await
        .unwrap();

    let bytes = orchestrator.export_document().unwrap();
    assert_eq!(LocalizationDocument::from_bytes(&bytes).unwrap(), doc);
    // Duplicate source lines share one entry
    assert_eq!(doc.len(), 2);
    assert_eq!(LocalizationDocument::from_bytes(b"").unwrap().source_language(), "en");
}
