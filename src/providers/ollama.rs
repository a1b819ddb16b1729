use async_trait::async_trait;
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use url::Url;

use crate::app_config::OllamaConfig;
use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::{check_batch_alignment, SessionProvider, TranslatedLine, TranslationSession};

/// Whole-line marker in prompts and responses: `<<TAG_n>>` before an entry, `<<TAG_END>>` after the last
static MARKER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*<<([A-Z]+)_(\d+|END)>>[ \t]*\r?$").expect("marker pattern is valid")
});

const BASE_MARKER_TAG: &str = "ENTRY";

/// Generate request for the Ollama API
#[derive(Debug, Serialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    temperature: f32,
}

/// Generation response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

/// Response of `GET /api/tags`
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Request body of `POST /api/pull`
#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    name: &'a str,
    stream: bool,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: false,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options = Some(GenerationOptions { temperature });
        self
    }
}

/// HTTP client for the Ollama API
#[derive(Debug)]
pub struct OllamaClient {
    /// Base URL of the Ollama API, always ending with '/'
    base_url: Url,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

impl OllamaClient {
    /// Create a client from the Ollama configuration
    pub fn new(config: &OllamaConfig) -> Result<Self, ProviderError> {
        let mut base_url = Url::parse(&config.endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", config.endpoint, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            // Ollama speaks HTTP/1.1
            .http1_only()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Ok(Self {
            base_url,
            client,
            max_retries: config.max_retries.min(crate::app_config::MAX_RETRIES),
            backoff_base_ms: config.retry_backoff_ms,
        })
    }

    /// Absolute URL of an API path such as "api/tags"
    pub fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid API path '{}': {}", path, e)))
    }

    /// Names of the models installed on the server
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = self.endpoint("api/tags")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError { status_code: status.as_u16(), message });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Download a model, blocking until the pull has finished
    pub async fn pull_model(&self, model: &str) -> Result<(), ProviderError> {
        let url = self.endpoint("api/pull")?;
        // Pulling can take far longer than a generation request
        let response = self
            .client
            .post(url)
            .timeout(Duration::from_secs(60 * 60))
            .json(&PullRequest { name: model, stream: false })
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError { status_code: status.as_u16(), message });
        }
        Ok(())
    }

    /// Generate text, retrying transport failures and server errors
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = self.endpoint("api/generate")?;

        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.max_retries {
            match self.client.post(url.clone()).json(request).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let text = response
                            .text()
                            .await
                            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
                        return parse_generation_response(&text);
                    }

                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());
                    if !status.is_server_error() {
                        // Client error - don't retry
                        error!("Ollama API error ({}): {}", status, message);
                        return Err(ProviderError::ApiError { status_code: status.as_u16(), message });
                    }
                    error!(
                        "Ollama API error ({}): {} - attempt {}/{}",
                        status, message, attempt + 1, self.max_retries + 1
                    );
                    last_error = Some(ProviderError::ApiError { status_code: status.as_u16(), message });
                }
                Err(e) => {
                    error!(
                        "Ollama API network error: {} - attempt {}/{}",
                        e, attempt + 1, self.max_retries + 1
                    );
                    last_error = Some(ProviderError::ConnectionError(e.to_string()));
                }
            }

            attempt += 1;

            if attempt <= self.max_retries {
                tokio::time::sleep(backoff_delay(self.backoff_base_ms, attempt)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!(
                "Ollama API request failed after {} attempts",
                self.max_retries + 1
            ))
        }))
    }
}

/// Delay before retry number `attempt` (1-based): the base doubled per
/// earlier retry, saturating instead of overflowing
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor))
}

/// Parse a generation body, accepting both a single object and JSONL chunks
fn parse_generation_response(text: &str) -> Result<GenerationResponse, ProviderError> {
    if let Ok(response) = serde_json::from_str::<GenerationResponse>(text) {
        return Ok(response);
    }

    let mut full_response = String::new();
    let mut done = false;
    let mut parsed_any = false;
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let chunk: GenerationResponse = serde_json::from_str(line)
            .map_err(|e| ProviderError::ParseError(format!("Invalid response chunk: {}", e)))?;
        full_response.push_str(&chunk.response);
        done |= chunk.done;
        parsed_any = true;
    }

    if !parsed_any {
        return Err(ProviderError::ParseError("Empty response body".to_string()));
    }
    Ok(GenerationResponse { response: full_response, done })
}

/// Session provider backed by a local Ollama server
#[derive(Debug)]
pub struct OllamaProvider {
    client: Arc<OllamaClient>,
    model: String,
    temperature: f32,
    pull_missing_models: bool,
    model_ready: AtomicBool,
}

impl OllamaProvider {
    pub fn new(config: &OllamaConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: Arc::new(OllamaClient::new(config)?),
            model: config.model.clone(),
            temperature: config.temperature,
            pull_missing_models: config.pull_missing_models,
            model_ready: AtomicBool::new(false),
        })
    }

    /// Make sure the model is installed, pulling it once if allowed
    async fn ensure_model(&self, source_language: &str, target_language: &str) -> Result<(), ProviderError> {
        if self.model_ready.load(Ordering::SeqCst) {
            return Ok(());
        }

        let unavailable = |message: String| ProviderError::SessionUnavailable {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            message,
        };

        let models = self
            .client
            .list_models()
            .await
            .map_err(|e| unavailable(format!("cannot list models: {}", e)))?;
        if !models.iter().any(|m| model_names_match(m, &self.model)) {
            if !self.pull_missing_models {
                return Err(unavailable(format!("model '{}' is not installed", self.model)));
            }
            info!("Downloading model '{}', this can take a while", self.model);
            self.client
                .pull_model(&self.model)
                .await
                .map_err(|e| unavailable(format!("failed to pull model '{}': {}", self.model, e)))?;
            info!("Model '{}' is ready", self.model);
        }

        self.model_ready.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// "llama3.2" and "llama3.2:latest" name the same model
fn model_names_match(installed: &str, wanted: &str) -> bool {
    let with_tag = |name: &str| {
        if name.contains(':') {
            name.to_string()
        } else {
            format!("{}:latest", name)
        }
    };
    with_tag(installed) == with_tag(wanted)
}

#[async_trait]
impl SessionProvider for OllamaProvider {
    async fn request_session(
        &self,
        source_language: &str,
        target_language: &str,
    ) -> Result<Box<dyn TranslationSession>, ProviderError> {
        let name_of = |code: &str| {
            language_utils::display_name(code).map_err(|e| ProviderError::SessionUnavailable {
                source_language: source_language.to_string(),
                target_language: target_language.to_string(),
                message: e.to_string(),
            })
        };
        let source_name = name_of(source_language)?;
        let target_name = name_of(target_language)?;

        self.ensure_model(source_language, target_language).await?;
        debug!("Opened Ollama session {} -> {} with '{}'", source_language, target_language, self.model);

        Ok(Box::new(OllamaSession {
            client: Arc::clone(&self.client),
            model: self.model.clone(),
            temperature: self.temperature,
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            system_prompt: system_prompt(&source_name, &target_name, target_language),
        }))
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

fn system_prompt(source_name: &str, target_name: &str, target_code: &str) -> String {
    format!(
        "You are a professional software localizer. Translate every entry from {} to {} ({}). \
         Each entry starts with a marker line such as <<ENTRY_0>>. Repeat every marker line unchanged, \
         put only the translation of that entry below it, and finish with the end marker line \
         that closes the input. Do not add explanations or notes.",
        source_name, target_name, target_code
    )
}

/// Session bound to one language pair on an Ollama server
#[derive(Debug)]
pub struct OllamaSession {
    client: Arc<OllamaClient>,
    model: String,
    temperature: f32,
    source_language: String,
    target_language: String,
    system_prompt: String,
}

#[async_trait]
impl TranslationSession for OllamaSession {
    fn source_language(&self) -> &str {
        &self.source_language
    }

    fn target_language(&self) -> &str {
        &self.target_language
    }

    async fn translate_batch(&self, inputs: &[String]) -> Result<Vec<TranslatedLine>, ProviderError> {
        // Blank lines translate to themselves and are never sent to the model
        let pending: Vec<(usize, &String)> = inputs
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .collect();

        let mut translated: Vec<String> = inputs.to_vec();

        if !pending.is_empty() {
            let tag = marker_tag(&pending);
            let prompt = build_prompt(&pending, &tag);
            let request = GenerationRequest::new(&self.model, prompt)
                .system(&self.system_prompt)
                .temperature(self.temperature);

            let response = self.client.generate(&request).await?;
            if !response.done {
                warn!("Ollama reported an unfinished generation for '{}'", self.target_language);
            }

            let entries = parse_marked_entries(&response.response, &tag);
            for (index, _) in &pending {
                let text = entries.get(index).ok_or_else(|| ProviderError::TranslationFailed {
                    target_language: self.target_language.clone(),
                    message: format!("response is missing entry {}", index),
                })?;
                translated[*index] = text.clone();
            }
        }

        let results: Vec<TranslatedLine> = inputs
            .iter()
            .zip(translated)
            .map(|(input, target_text)| TranslatedLine::new(input.clone(), target_text))
            .collect();

        check_batch_alignment(&self.target_language, inputs, &results)?;
        Ok(results)
    }
}

/// Pick a marker tag that no input line contains, so source text can never pose as a marker
fn marker_tag(pending: &[(usize, &String)]) -> String {
    let mut tag = BASE_MARKER_TAG.to_string();
    while pending.iter().any(|(_, text)| text.contains(&format!("<<{}_", tag))) {
        tag.push('X');
    }
    tag
}

/// Build the marked prompt for the non-blank inputs
fn build_prompt(pending: &[(usize, &String)], tag: &str) -> String {
    let mut prompt = String::new();
    for (index, text) in pending {
        prompt.push_str(&format!("<<{}_{}>>\n{}\n", tag, index, text));
    }
    prompt.push_str(&format!("<<{}_END>>", tag));
    prompt
}

/// Split a marked response into entry texts keyed by entry index
///
/// Only whole marker lines carrying `tag` count; anything after the end marker is dropped.
fn parse_marked_entries(response: &str, tag: &str) -> std::collections::HashMap<usize, String> {
    let mut markers: Vec<(Option<usize>, usize, usize)> = Vec::new();
    for caps in MARKER_LINE.captures_iter(response) {
        let (Some(whole), Some(found_tag), Some(id)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if found_tag.as_str() != tag {
            continue;
        }
        if id.as_str() == "END" {
            markers.push((None, whole.start(), whole.end()));
            break;
        }
        if let Ok(index) = id.as_str().parse() {
            markers.push((Some(index), whole.start(), whole.end()));
        }
    }

    let mut entries = std::collections::HashMap::new();
    for (i, (index, _, text_start)) in markers.iter().enumerate() {
        let Some(index) = index else {
            break;
        };
        let text_end = markers.get(i + 1).map_or(response.len(), |(_, start, _)| *start);
        // Entries are single lines, so collapse whatever line breaks the model added
        let text = response[*text_start..text_end]
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        entries.insert(*index, text);
    }
    entries
}
