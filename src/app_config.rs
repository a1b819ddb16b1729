use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language of the source text (catalog code)
    pub source_language: String,

    /// Languages to translate into, in processing order
    #[serde(default)]
    pub target_languages: Vec<String>,

    /// Where the string catalog is written
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Ollama settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: offline echo provider, tags lines with the target language
    Echo,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::Echo => "Echo",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::Echo => "echo".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

/// Ollama service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
    /// Model name (e.g., "llama3.2:3b", "mistral")
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Service endpoint URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transport failures and server errors
    #[serde(default = "default_retry_count")]
    pub max_retries: u32,

    /// Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Pull the model when the server does not have it yet
    #[serde(default = "default_true")]
    pub pull_missing_models: bool,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: default_ollama_model(),
            endpoint: default_ollama_endpoint(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            pull_missing_models: default_true(),
            temperature: default_temperature(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Upper bound for `OllamaConfig::max_retries`
pub const MAX_RETRIES: u32 = 10;

fn default_output_path() -> String {
    "Localizable.xcstrings".to_string()
}

fn default_timeout_secs() -> u64 {
    120 // local models can be slow on the first request
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

impl Config {
    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .context(format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .context(format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Load the configuration, writing a default one first if the file is missing
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Targets naming the source language, possibly under another code ("fre" for "fr")
    pub fn targets_matching_source(&self) -> Vec<&str> {
        self.target_languages
            .iter()
            .filter(|target| crate::language_utils::language_codes_match(target, &self.source_language))
            .map(String::as_str)
            .collect()
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.source_language)
            .context("Invalid source language")?;

        for target in &self.target_languages {
            crate::language_utils::validate_language_code(target)
                .context(format!("Invalid target language '{}'", target))?;
        }
        for target in self.targets_matching_source() {
            warn!(
                "Target language '{}' is the same language as the source '{}'",
                target, self.source_language
            );
        }

        if self.output_path.trim().is_empty() {
            return Err(anyhow!("Output path must not be empty"));
        }

        if self.provider == TranslationProvider::Ollama {
            Url::parse(&self.ollama.endpoint)
                .context(format!("Invalid Ollama endpoint: {}", self.ollama.endpoint))?;

            if self.ollama.model.trim().is_empty() {
                return Err(anyhow!("An Ollama model name is required"));
            }
            if self.ollama.max_retries > MAX_RETRIES {
                return Err(anyhow!(
                    "Ollama max_retries must be at most {}, got {}",
                    MAX_RETRIES,
                    self.ollama.max_retries
                ));
            }
            if self.ollama.timeout_secs == 0 {
                return Err(anyhow!("Ollama timeout must be greater than zero"));
            }
            if !(0.0..=2.0).contains(&self.ollama.temperature) {
                return Err(anyhow!(
                    "Temperature must be between 0.0 and 2.0, got {}",
                    self.ollama.temperature
                ));
            }
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_languages: vec!["de".to_string(), "fr".to_string()],
            output_path: default_output_path(),
            provider: TranslationProvider::default(),
            ollama: OllamaConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
