/*!
 * Mock provider implementation for testing and dry runs.
 *
 * The mock translates by tagging each line with its target language and
 * can be scripted to fail for chosen languages:
 * - `unavailable_for` - session requests for a language are rejected
 * - `failing_for` - batches for a language fail
 * - `misaligned_for` - batches for a language drop their last result
 *
 * It also records every session request and tracks how many sessions are
 * alive at once, so tests can check the one-session-at-a-time rule.
 */

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{SessionProvider, TranslatedLine, TranslationSession};

/// Counters shared between a mock provider and its sessions
#[derive(Debug, Default)]
pub struct MockStats {
    requests: Mutex<Vec<(String, String)>>,
    live_sessions: AtomicUsize,
    max_live_sessions: AtomicUsize,
    batches: AtomicUsize,
}

impl MockStats {
    /// Every (source, target) pair requested, in order
    pub fn session_requests(&self) -> Vec<(String, String)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Sessions currently alive
    pub fn live_sessions(&self) -> usize {
        self.live_sessions.load(Ordering::SeqCst)
    }

    /// Highest number of sessions alive at the same time
    pub fn max_live_sessions(&self) -> usize {
        self.max_live_sessions.load(Ordering::SeqCst)
    }

    /// Number of batches submitted
    pub fn batch_count(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

/// Scripted session provider
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    unavailable: HashSet<String>,
    failing: HashSet<String>,
    misaligned: HashSet<String>,
    session_delay: Option<Duration>,
    stats: Arc<MockStats>,
}

impl MockProvider {
    /// A provider that supports every pair and always succeeds
    pub fn echo() -> Self {
        Self::default()
    }

    /// Reject session requests targeting `language`
    pub fn unavailable_for(mut self, language: &str) -> Self {
        self.unavailable.insert(language.to_string());
        self
    }

    /// Fail every batch translated into `language`
    pub fn failing_for(mut self, language: &str) -> Self {
        self.failing.insert(language.to_string());
        self
    }

    /// Return one result too few for batches into `language`
    pub fn misaligned_for(mut self, language: &str) -> Self {
        self.misaligned.insert(language.to_string());
        self
    }

    /// Wait before handing out each session, like a model download would
    pub fn with_session_delay(mut self, delay: Duration) -> Self {
        self.session_delay = Some(delay);
        self
    }

    /// Shared counters of this provider
    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }

    /// The text the mock produces for `input` in `target_language`
    pub fn translate_text(target_language: &str, input: &str) -> String {
        format!("[{}] {}", target_language, input)
    }
}

#[async_trait]
impl SessionProvider for MockProvider {
    async fn request_session(
        &self,
        source_language: &str,
        target_language: &str,
    ) -> Result<Box<dyn TranslationSession>, ProviderError> {
        if let Ok(mut requests) = self.stats.requests.lock() {
            requests.push((source_language.to_string(), target_language.to_string()));
        }

        if let Some(delay) = self.session_delay {
            tokio::time::sleep(delay).await;
        }

        if self.unavailable.contains(target_language) {
            return Err(ProviderError::SessionUnavailable {
                source_language: source_language.to_string(),
                target_language: target_language.to_string(),
                message: "language pair not supported by mock".to_string(),
            });
        }

        let live = self.stats.live_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_live_sessions.fetch_max(live, Ordering::SeqCst);

        Ok(Box::new(MockSession {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            failing: self.failing.contains(target_language),
            misaligned: self.misaligned.contains(target_language),
            stats: Arc::clone(&self.stats),
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Session handed out by `MockProvider`
#[derive(Debug)]
pub struct MockSession {
    source_language: String,
    target_language: String,
    failing: bool,
    misaligned: bool,
    stats: Arc<MockStats>,
}

#[async_trait]
impl TranslationSession for MockSession {
    fn source_language(&self) -> &str {
        &self.source_language
    }

    fn target_language(&self) -> &str {
        &self.target_language
    }

    async fn translate_batch(&self, inputs: &[String]) -> Result<Vec<TranslatedLine>, ProviderError> {
        self.stats.batches.fetch_add(1, Ordering::SeqCst);

        if self.failing {
            return Err(ProviderError::TranslationFailed {
                target_language: self.target_language.clone(),
                message: "mock configured to fail".to_string(),
            });
        }

        let mut results: Vec<TranslatedLine> = inputs
            .iter()
            .map(|input| {
                TranslatedLine::new(
                    input.clone(),
                    MockProvider::translate_text(&self.target_language, input),
                )
            })
            .collect();

        if self.misaligned {
            results.pop();
        }

        Ok(results)
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.stats.live_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}
