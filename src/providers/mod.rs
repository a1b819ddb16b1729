/*!
 * Translation provider adapters.
 *
 * A provider hands out sessions, each bound to one fixed
 * (source language, target language) pair. Translating into another
 * language means dropping the current session and requesting a new one.
 *
 * - `ollama`: local Ollama server, pulls missing models on first use
 * - `mock`: scripted provider for tests and dry runs
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One translated line returned by a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedLine {
    /// The input string exactly as submitted
    pub input: String,
    /// The translation of `input`
    pub target_text: String,
}

impl TranslatedLine {
    pub fn new(input: impl Into<String>, target_text: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            target_text: target_text.into(),
        }
    }
}

/// Factory for language-pair sessions
#[async_trait]
pub trait SessionProvider: Send + Sync + Debug {
    /// Establish a session translating `source_language` into `target_language`
    ///
    /// This may take a long time when the provider has to fetch a model first.
    /// Fails with `ProviderError::SessionUnavailable` if the pair is unsupported.
    async fn request_session(
        &self,
        source_language: &str,
        target_language: &str,
    ) -> Result<Box<dyn TranslationSession>, ProviderError>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}

/// A live session bound to one language pair
#[async_trait]
pub trait TranslationSession: Send + Sync + Debug {
    fn source_language(&self) -> &str;

    fn target_language(&self) -> &str;

    /// Translate every input, returning results in input order
    ///
    /// The result has exactly one entry per input; anything else is a
    /// `ProviderError::TranslationFailed`.
    async fn translate_batch(&self, inputs: &[String]) -> Result<Vec<TranslatedLine>, ProviderError>;
}

/// Check that `results` answer `inputs` one to one and in order
pub fn check_batch_alignment(
    target_language: &str,
    inputs: &[String],
    results: &[TranslatedLine],
) -> Result<(), ProviderError> {
    if inputs.len() != results.len() {
        return Err(ProviderError::TranslationFailed {
            target_language: target_language.to_string(),
            message: format!("expected {} results, got {}", inputs.len(), results.len()),
        });
    }

    if let Some((index, (input, result))) = inputs
        .iter()
        .zip(results)
        .enumerate()
        .find(|(_, (input, result))| **input != result.input)
    {
        return Err(ProviderError::TranslationFailed {
            target_language: target_language.to_string(),
            message: format!(
                "result {} answers '{}' instead of '{}'",
                index, result.input, input
            ),
        });
    }

    Ok(())
}

pub mod mock;
pub mod ollama;
