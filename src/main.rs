// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use autotranslate::app_config::{self, Config, TranslationProvider};
use autotranslate::app_controller::Controller;
use autotranslate::language_utils;
use autotranslate::translation::CancelFlag;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    Echo,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::Echo => TranslationProvider::Echo,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate every line of a text file into a string catalog
    Translate(TranslateArgs),

    /// List the languages that can be picked as translation targets
    Languages,

    /// Show the languages and coverage of an existing string catalog
    Inspect {
        /// Catalog file to read
        #[arg(value_name = "CATALOG")]
        catalog: PathBuf,
    },

    /// Generate shell completions for autotranslate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Text file with one source string per line
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Source language code (e.g., 'en')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Comma separated target language codes (e.g., 'de,fr,ja')
    #[arg(short, long, value_delimiter = ',')]
    target_languages: Option<Vec<String>>,

    /// Catalog file to write
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Force overwrite of an existing catalog
    #[arg(short, long)]
    force_overwrite: bool,
}

/// autotranslate - batch translation into Xcode string catalogs
#[derive(Parser, Debug)]
#[command(name = "autotranslate")]
#[command(version)]
#[command(about = "Translate source strings into several languages and write an .xcstrings catalog")]
#[command(long_about = "autotranslate reads one source string per line, translates the lines into each
selected language in turn and writes the result as an Xcode string catalog.

EXAMPLES:
    autotranslate translate strings.txt -s en -t de,fr
    autotranslate translate strings.txt -t ja -o Localizable.xcstrings -f
    autotranslate translate strings.txt -p echo         # dry run without a model
    autotranslate inspect Localizable.xcstrings
    autotranslate completions bash > autotranslate.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file does not
    exist a default one is created. Command line flags override its values.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // The max level is raised or lowered after the config is read
        metadata.level() <= self.level.max(log::max_level())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (colour, tag) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                colour,
                now,
                tag,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Translate(args) => run_translate(args).await,
        Commands::Languages => {
            list_languages();
            Ok(())
        }
        Commands::Inspect { catalog } => {
            print!("{}", Controller::inspect(&catalog)?);
            Ok(())
        }
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "autotranslate", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn list_languages() {
    for language in language_utils::selectable_languages() {
        println!("{:<8} {}", language.code, language.display_name);
    }
}

/// Load the config file and apply command line overrides
fn load_config(options: &TranslateArgs) -> Result<Config> {
    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(provider) = &options.provider {
        config.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.ollama.model = model.clone();
    }
    if let Some(source_language) = &options.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(targets) = &options.target_languages {
        config.target_languages = targets.clone();
    }
    if let Some(output) = &options.output {
        config.output_path = output.to_string_lossy().into_owned();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = load_config(&options)?;
    log::set_max_level(config.log_level.to_level_filter());

    if config.target_languages.is_empty() {
        warn!("No target languages configured, nothing to translate");
    }

    info!(
        "Translating {:?} from {} into [{}] with {}",
        options.input,
        config.source_language,
        config.target_languages.join(", "),
        config.provider.display_name()
    );

    let cancel = CancelFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current batch");
            signal_flag.cancel();
        }
    });

    let output = PathBuf::from(&config.output_path);
    let controller = Controller::with_config(config)?;
    match controller
        .run(&options.input, &output, options.force_overwrite, cancel)
        .await
    {
        Ok(path) => {
            info!("Success: {:?}", path);
            Ok(())
        }
        Err(e) => {
            error!("Translation failed: {}", e);
            Err(e)
        }
    }
}
