/*!
 * Translation orchestrator state machine.
 *
 * The orchestrator walks the selected target languages strictly in order.
 * For each language it asks for a fresh session bound to
 * (source language -> that language), submits every source line as one
 * batch, and records the results in the run's `LocalizationDocument` before
 * moving on. It performs no I/O: every transition returns the next command
 * (`SessionRequest` or `BatchRequest`) for the caller to execute, and the
 * caller feeds the outcome back in as an event.
 *
 * ```text
 * Idle -> AwaitingSession -> Translating -> (AwaitingSession <-> Translating)* -> Done
 *               \________________\______________> Failed
 * ```
 *
 * Every command carries the `RunTicket` of its run. Events with an older
 * ticket, or arriving in a state that does not expect them, are discarded;
 * this is how results that arrive after `cancel()` are dropped.
 */

use log::{debug, error, info, warn};
use std::fmt;

use crate::catalog::{LocalizationDocument, DEFAULT_SOURCE_LANGUAGE};
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils::TargetLanguage;
use crate::providers::{TranslatedLine, TranslationSession};

/// Generation number identifying one run
pub type RunTicket = u64;

/// Observable state of the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    /// No run in flight
    Idle,
    /// Waiting for the provider to hand out a session
    AwaitingSession,
    /// A batch has been submitted and results are pending
    Translating,
    /// Every language has been translated; the document is final
    Done,
    /// The run stopped on a provider failure
    Failed(TranslationError),
}

impl RunState {
    /// Short state name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::AwaitingSession => "awaiting session",
            RunState::Translating => "translating",
            RunState::Done => "done",
            RunState::Failed(_) => "failed",
        }
    }

    /// Whether a run is in flight
    pub fn is_active(&self) -> bool {
        matches!(self, RunState::AwaitingSession | RunState::Translating)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Failed(reason) => write!(f, "failed: {}", reason),
            other => f.write_str(other.name()),
        }
    }
}

/// Command: establish a session for one language pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub ticket: RunTicket,
    pub source_language: String,
    pub target_language: String,
    /// Zero-based index of the language in the run
    pub position: usize,
}

/// Command: translate these lines with the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub ticket: RunTicket,
    pub target_language: String,
    pub lines: Vec<String>,
}

/// One translated line as reported back to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub source_line: String,
    pub target_language_code: String,
    pub target_text: String,
}

impl BatchResult {
    pub fn new(
        source_line: impl Into<String>,
        target_language_code: impl Into<String>,
        target_text: impl Into<String>,
    ) -> Self {
        Self {
            source_line: source_line.into(),
            target_language_code: target_language_code.into(),
            target_text: target_text.into(),
        }
    }

    /// Tag session output with the language it was translated into
    pub fn from_translated(target_language_code: &str, lines: Vec<TranslatedLine>) -> Vec<Self> {
        lines
            .into_iter()
            .map(|line| Self::new(line.input, target_language_code, line.target_text))
            .collect()
    }
}

/// What to do after a batch has been recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Request a session for the next language
    RequestSession(SessionRequest),
    /// All languages are translated
    Finished,
}

/// Progress snapshot for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProgress {
    pub state: &'static str,
    pub completed_languages: usize,
    pub total_languages: usize,
    /// Language currently being worked on
    pub current_language: Option<String>,
    pub lines_per_language: usize,
}

impl RunProgress {
    /// Completed fraction of the run (0.0 - 1.0)
    pub fn fraction(&self) -> f32 {
        if self.total_languages == 0 {
            return 0.0;
        }
        self.completed_languages as f32 / self.total_languages as f32
    }
}

/// Split source text into translation units, one per line.
///
/// Blank lines are kept so every target variant lines up with the source.
/// `\r\n` line endings are accepted and a single trailing newline does not
/// add an extra empty unit.
pub fn split_source_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Sequential multi-language translation state machine
#[derive(Debug)]
pub struct TranslationOrchestrator {
    /// Source language used when the caller does not give one
    source_language: String,
    lines: Vec<String>,
    targets: Vec<TargetLanguage>,
    position: usize,
    state: RunState,
    ticket: RunTicket,
    document: LocalizationDocument,
}

impl Default for TranslationOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_LANGUAGE)
    }
}

impl TranslationOrchestrator {
    /// Create an idle orchestrator armed for `source_language`
    pub fn new(source_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            lines: Vec::new(),
            targets: Vec::new(),
            position: 0,
            state: RunState::Idle,
            ticket: 0,
            document: LocalizationDocument::new(source_language),
        }
    }

    /// Source language armed for the next run
    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    /// Re-arm the orchestrator for another source language.
    ///
    /// Only allowed between runs; nothing is requested until `start`.
    pub fn set_source_language(&mut self, source_language: &str) -> Result<(), TranslationError> {
        if self.state.is_active() {
            return Err(TranslationError::RunInProgress);
        }
        debug!("Source language set to '{}'", source_language);
        self.source_language = source_language.to_string();
        Ok(())
    }

    pub fn current_state(&self) -> &RunState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_active()
    }

    /// Ticket of the latest run
    pub fn current_ticket(&self) -> RunTicket {
        self.ticket
    }

    /// Target languages of the latest run, in processing order
    pub fn targets(&self) -> &[TargetLanguage] {
        &self.targets
    }

    /// The document as built so far
    pub fn document(&self) -> &LocalizationDocument {
        &self.document
    }

    /// Begin a run over the selected languages of `targets`.
    ///
    /// Languages are processed in the given order; repeated codes are
    /// translated once. Fails with `EmptySelection` (and stays as it was)
    /// when nothing is selected.
    pub fn start(
        &mut self,
        text: &str,
        source_language: &str,
        targets: &[TargetLanguage],
    ) -> Result<SessionRequest, TranslationError> {
        if self.state.is_active() {
            warn!("Ignoring start request: a run is already {}", self.state.name());
            return Err(TranslationError::RunInProgress);
        }

        let mut selection: Vec<TargetLanguage> = Vec::new();
        for target in targets.iter().filter(|t| t.selected) {
            if !selection.contains(target) {
                selection.push(target.clone());
            }
        }

        if selection.is_empty() {
            warn!("Cannot start a translation run without target languages");
            return Err(TranslationError::EmptySelection);
        }

        self.source_language = source_language.to_string();
        self.lines = split_source_lines(text);
        self.targets = selection;
        self.position = 0;
        self.ticket += 1;
        self.document.reset(source_language);
        self.state = RunState::AwaitingSession;

        info!(
            "Translating {} line(s) from '{}' into {} language(s): {}",
            self.lines.len(),
            source_language,
            self.targets.len(),
            self.targets.iter().map(|t| t.code.as_str()).collect::<Vec<_>>().join(", ")
        );

        Ok(self.session_request())
    }

    /// Begin a run from the armed source language.
    ///
    /// Same as `start` with the language last given to `new` or
    /// `set_source_language`.
    pub fn start_armed(
        &mut self,
        text: &str,
        targets: &[TargetLanguage],
    ) -> Result<SessionRequest, TranslationError> {
        let source_language = self.source_language.clone();
        self.start(text, &source_language, targets)
    }

    /// The provider delivered a session for the requested pair.
    ///
    /// Returns the batch to submit, or `None` if the event is stale.
    pub fn on_session_ready(
        &mut self,
        ticket: RunTicket,
        session: &dyn TranslationSession,
    ) -> Result<Option<BatchRequest>, TranslationError> {
        if !self.accepts(ticket, &RunState::AwaitingSession, "session") {
            return Ok(None);
        }

        let target = self.current_target_code();
        if session.source_language() != self.source_language || session.target_language() != target {
            let error = TranslationError::SessionUnavailable {
                source_language: self.source_language.clone(),
                target_language: target.clone(),
                message: format!(
                    "provider returned a session for {} -> {}",
                    session.source_language(),
                    session.target_language()
                ),
            };
            return Err(self.fail(error));
        }

        self.state = RunState::Translating;
        debug!("Submitting {} line(s) for '{}'", self.lines.len(), target);

        Ok(Some(BatchRequest {
            ticket,
            target_language: target,
            lines: self.lines.clone(),
        }))
    }

    /// The session finished the batch for the current language.
    ///
    /// Records every result and returns the next step, or `None` if the
    /// event is stale. Results that do not line up with the submitted
    /// lines fail the run with `TranslationFailed`.
    pub fn on_batch_complete(
        &mut self,
        ticket: RunTicket,
        results: Vec<BatchResult>,
    ) -> Result<Option<Step>, TranslationError> {
        if !self.accepts(ticket, &RunState::Translating, "batch") {
            return Ok(None);
        }

        let target = self.current_target_code();
        if let Err(message) = self.check_results(&target, &results) {
            let error = TranslationError::TranslationFailed {
                target_language: target,
                message,
            };
            return Err(self.fail(error));
        }

        for result in &results {
            self.document
                .record_translation(&result.source_line, &result.target_language_code, &result.target_text);
        }
        info!("Finished '{}' ({}/{})", target, self.position + 1, self.targets.len());

        self.position += 1;
        if self.position == self.targets.len() {
            self.state = RunState::Done;
            info!(
                "Translation run complete: {} string(s), {} unit(s)",
                self.document.len(),
                self.document.unit_count()
            );
            return Ok(Some(Step::Finished));
        }

        self.state = RunState::AwaitingSession;
        Ok(Some(Step::RequestSession(self.session_request())))
    }

    /// The provider failed while a run was active.
    ///
    /// Moves to `Failed` and returns the recorded error. Nothing is retried
    /// and the entries of already finished languages are kept. Returns
    /// `None` if the event is stale.
    pub fn on_provider_error(&mut self, ticket: RunTicket, error: ProviderError) -> Option<TranslationError> {
        if ticket != self.ticket || !self.state.is_active() {
            debug!("Discarding provider error from a finished run: {}", error);
            return None;
        }

        let target = self.current_target_code();
        Some(self.fail(TranslationError::from_provider(error, &target)))
    }

    /// Abandon the active run.
    ///
    /// Any session or batch result still in flight is discarded when it
    /// arrives. Returns `false` if there was nothing to cancel.
    pub fn cancel(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        info!("Translation run cancelled while {}", self.state.name());
        self.ticket += 1;
        self.state = RunState::Idle;
        true
    }

    /// Progress of the current or latest run
    pub fn progress(&self) -> RunProgress {
        RunProgress {
            state: self.state.name(),
            completed_languages: self.position.min(self.targets.len()),
            total_languages: self.targets.len(),
            current_language: if self.state.is_active() {
                self.targets.get(self.position).map(|t| t.code.clone())
            } else {
                None
            },
            lines_per_language: self.lines.len(),
        }
    }

    /// Serialized catalog of a finished run
    pub fn export_document(&self) -> Result<Vec<u8>, TranslationError> {
        self.ensure_done()?;
        Ok(self.document.to_bytes()?)
    }

    /// Owned copy of the catalog of a finished run
    pub fn finished_document(&self) -> Result<LocalizationDocument, TranslationError> {
        self.ensure_done()?;
        Ok(self.document.clone())
    }

    fn ensure_done(&self) -> Result<(), TranslationError> {
        if self.state != RunState::Done {
            return Err(TranslationError::NotReady {
                state: self.state.name().to_string(),
            });
        }
        Ok(())
    }

    fn accepts(&self, ticket: RunTicket, expected: &RunState, event: &str) -> bool {
        if ticket != self.ticket || &self.state != expected {
            debug!(
                "Discarding stale {} event (ticket {}, current ticket {}, state {})",
                event,
                ticket,
                self.ticket,
                self.state.name()
            );
            return false;
        }
        true
    }

    fn check_results(&self, target: &str, results: &[BatchResult]) -> Result<(), String> {
        if results.len() != self.lines.len() {
            return Err(format!(
                "expected {} result(s), got {}",
                self.lines.len(),
                results.len()
            ));
        }

        for (index, (line, result)) in self.lines.iter().zip(results).enumerate() {
            if result.source_line != *line {
                return Err(format!(
                    "result {} answers '{}' instead of '{}'",
                    index, result.source_line, line
                ));
            }
            if result.target_language_code != target {
                return Err(format!(
                    "result {} is in '{}' instead of '{}'",
                    index, result.target_language_code, target
                ));
            }
        }
        Ok(())
    }

    fn fail(&mut self, error: TranslationError) -> TranslationError {
        error!("Translation run failed: {}", error);
        self.state = RunState::Failed(error.clone());
        error
    }

    fn current_target_code(&self) -> String {
        self.targets
            .get(self.position)
            .map(|t| t.code.clone())
            .unwrap_or_default()
    }

    fn session_request(&self) -> SessionRequest {
        SessionRequest {
            ticket: self.ticket,
            source_language: self.source_language.clone(),
            target_language: self.current_target_code(),
            position: self.position,
        }
    }
}
