/*!
 * Async run driver.
 *
 * Executes the commands of a `TranslationOrchestrator` against a
 * `SessionProvider`. The driver owns at most one session at a time: the
 * session for a language is dropped before the session for the next
 * language is requested. Cancellation is checked at state boundaries only,
 * so a batch that is already in flight runs to completion and its results
 * are then discarded.
 */

use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::catalog::LocalizationDocument;
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils::TargetLanguage;
use crate::providers::SessionProvider;

use super::orchestrator::{
    BatchResult, RunProgress, RunTicket, SessionRequest, Step, TranslationOrchestrator,
};

/// Shared cancellation switch for a run
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop at the next state boundary
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Callback receiving progress after every transition
pub type ProgressCallback = Box<dyn Fn(&RunProgress) + Send + Sync>;

/// Drives one orchestrator against one provider
pub struct RunDriver<'a, P: SessionProvider + ?Sized> {
    provider: &'a P,
    cancel: CancelFlag,
    progress_callback: Option<ProgressCallback>,
}

impl<'a, P: SessionProvider + ?Sized> RunDriver<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            cancel: CancelFlag::new(),
            progress_callback: None,
        }
    }

    /// Use an externally controlled cancellation flag
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Report progress to `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Run a complete translation and return the finished catalog.
    ///
    /// On failure the orchestrator is left in `Failed` with the entries of
    /// every language finished before the failure.
    pub async fn run(
        &self,
        orchestrator: &mut TranslationOrchestrator,
        text: &str,
        source_language: &str,
        targets: &[TargetLanguage],
    ) -> Result<LocalizationDocument, TranslationError> {
        let request = orchestrator.start(text, source_language, targets)?;
        self.drive(orchestrator, request).await
    }

    /// Run from the source language the orchestrator is armed with
    pub async fn run_armed(
        &self,
        orchestrator: &mut TranslationOrchestrator,
        text: &str,
        targets: &[TargetLanguage],
    ) -> Result<LocalizationDocument, TranslationError> {
        let request = orchestrator.start_armed(text, targets)?;
        self.drive(orchestrator, request).await
    }

    async fn drive(
        &self,
        orchestrator: &mut TranslationOrchestrator,
        mut request: SessionRequest,
    ) -> Result<LocalizationDocument, TranslationError> {
        self.report(orchestrator);
        info!("Using provider '{}'", self.provider.name());

        loop {
            self.check_cancelled(orchestrator)?;

            debug!(
                "Requesting session {} -> {} ({}/{})",
                request.source_language,
                request.target_language,
                request.position + 1,
                orchestrator.targets().len()
            );
            let session = match self
                .provider
                .request_session(&request.source_language, &request.target_language)
                .await
            {
                Ok(session) => session,
                Err(e) => return Err(Self::fail(orchestrator, request.ticket, e)),
            };

            self.check_cancelled(orchestrator)?;

            let Some(batch) = orchestrator.on_session_ready(request.ticket, session.as_ref())? else {
                return Err(TranslationError::Cancelled);
            };
            self.report(orchestrator);

            let outcome = session.translate_batch(&batch.lines).await;
            // Release the session before anything else is requested
            drop(session);

            self.check_cancelled(orchestrator)?;

            let lines = match outcome {
                Ok(lines) => lines,
                Err(e) => return Err(Self::fail(orchestrator, batch.ticket, e)),
            };

            let results = BatchResult::from_translated(&batch.target_language, lines);
            match orchestrator.on_batch_complete(batch.ticket, results)? {
                Some(Step::RequestSession(next)) => {
                    self.report(orchestrator);
                    request = next;
                }
                Some(Step::Finished) => {
                    self.report(orchestrator);
                    return orchestrator.finished_document();
                }
                None => return Err(TranslationError::Cancelled),
            }
        }
    }

    fn check_cancelled(&self, orchestrator: &mut TranslationOrchestrator) -> Result<(), TranslationError> {
        if self.cancel.is_cancelled() {
            orchestrator.cancel();
            self.report(orchestrator);
            return Err(TranslationError::Cancelled);
        }
        Ok(())
    }

    fn fail(orchestrator: &mut TranslationOrchestrator, ticket: RunTicket, error: ProviderError) -> TranslationError {
        orchestrator
            .on_provider_error(ticket, error)
            .unwrap_or(TranslationError::Cancelled)
    }

    fn report(&self, orchestrator: &TranslationOrchestrator) {
        if let Some(ref callback) = self.progress_callback {
            callback(&orchestrator.progress());
        }
    }
}
