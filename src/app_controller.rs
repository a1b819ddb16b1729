use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::app_config::{Config, TranslationProvider};
use crate::catalog::LocalizationDocument;
use crate::file_utils::{self, FileManager};
use crate::language_utils::{self, TargetLanguage};
use crate::providers::mock::MockProvider;
use crate::providers::ollama::OllamaProvider;
use crate::providers::SessionProvider;
use crate::translation::{CancelFlag, RunDriver, RunProgress, TranslationOrchestrator};

// @module: Application controller for catalog translation

/// Main application controller: turns a text file into a string catalog
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Provider handing out translation sessions
    provider: Box<dyn SessionProvider>,
}

impl Controller {
    /// Create a controller for test purposes, backed by the echo provider
    pub fn new_for_test() -> Result<Self> {
        let config = Config {
            provider: TranslationProvider::Echo,
            ..Config::default()
        };
        Self::with_config(config)
    }

    // @method: Create a new controller, building the configured provider
    pub fn with_config(config: Config) -> Result<Self> {
        let provider: Box<dyn SessionProvider> = match config.provider {
            TranslationProvider::Ollama => Box::new(
                OllamaProvider::new(&config.ollama).context("Failed to set up the Ollama provider")?,
            ),
            TranslationProvider::Echo => Box::new(MockProvider::echo()),
        };
        Ok(Self::with_provider(config, provider))
    }

    /// Create a controller around an existing provider
    pub fn with_provider(config: Config, provider: Box<dyn SessionProvider>) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Selected target languages from the configuration, in order
    pub fn selected_targets(&self) -> Vec<TargetLanguage> {
        language_utils::select_languages(&self.config.target_languages)
    }

    /// Translate `text` into every configured target language
    pub async fn translate_text(&self, text: &str, cancel: CancelFlag) -> Result<LocalizationDocument> {
        let targets = self.selected_targets();
        let mut orchestrator = TranslationOrchestrator::default();
        orchestrator.set_source_language(&self.config.source_language)?;

        let progress_bar = ProgressBar::new(targets.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} languages {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("=> "));

        let bar = progress_bar.clone();
        let result = RunDriver::new(self.provider.as_ref())
            .with_cancel_flag(cancel)
            .with_progress(Box::new(move |progress: &RunProgress| {
                bar.set_position(progress.completed_languages as u64);
                match &progress.current_language {
                    Some(code) => bar.set_message(format!("{} ({})", code, progress.state)),
                    None => bar.set_message(progress.state.to_string()),
                }
            }))
            .run_armed(&mut orchestrator, text, &targets)
            .await;

        match result {
            Ok(document) => {
                progress_bar.finish_with_message("done");
                Ok(document)
            }
            Err(e) => {
                progress_bar.abandon_with_message(orchestrator.current_state().name());
                let partial = orchestrator.document().unit_count();
                if partial > 0 {
                    warn!("{} translation(s) were finished before the run stopped", partial);
                }
                Err(e.into())
            }
        }
    }

    /// Translate the text file at `input_file` and write the catalog to `output_file`
    pub async fn run(&self, input_file: &Path, output_file: &Path, force_overwrite: bool, cancel: CancelFlag) -> Result<PathBuf> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_file = FileManager::with_catalog_extension(output_file);
        if output_file.exists() && !force_overwrite {
            return Err(anyhow!(
                "Output file already exists: {:?}. Use -f to force overwrite.",
                output_file
            ));
        }

        let text = FileManager::read_to_string(input_file)?;
        let document = self.translate_text(&text, cancel).await?;

        file_utils::write_catalog(&output_file, &document)?;
        info!(
            "Wrote {} string(s) in {} language(s) to {:?} in {:.1}s",
            document.len(),
            document.languages().len(),
            output_file,
            start_time.elapsed().as_secs_f32()
        );

        Ok(output_file)
    }

    /// Human readable summary of a catalog on disk
    pub fn inspect(path: &Path) -> Result<String> {
        let document = file_utils::load_catalog_or_default(path)?;
        Ok(describe_catalog(&document))
    }
}

/// Summarize a catalog: source language, string count and per-language coverage
pub fn describe_catalog(document: &LocalizationDocument) -> String {
    let mut summary = String::new();
    let _ = writeln!(
        summary,
        "Source language: {} | strings: {} | version: {}",
        document.source_language(),
        document.len(),
        document.version()
    );

    for (language, count) in document.coverage() {
        let name = language_utils::display_name(language).unwrap_or_else(|_| language.to_string());
        let percent = if document.is_empty() {
            0.0
        } else {
            count as f32 * 100.0 / document.len() as f32
        };
        let _ = writeln!(summary, "  {:<8} {:<24} {:>5} ({:.0}%)", language, name, count, percent);
    }
    summary
}
