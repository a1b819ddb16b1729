/*!
 * # autotranslate
 *
 * Batch translation of source strings into Xcode string catalogs.
 *
 * ## Features
 *
 * - Translate every line of a source text into several target languages
 * - One translation session per language, strictly one after another
 * - Local translation through an Ollama server, or an offline echo provider
 * - Read and write `.xcstrings` catalogs in Xcode's own layout
 * - Cancellation with partial results kept in memory
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `catalog`: The string catalog document and its JSON codec
 * - `translation`: Translation runs:
 *   - `translation::orchestrator`: I/O-free run state machine
 *   - `translation::driver`: Async loop executing the state machine
 * - `providers`: Session providers:
 *   - `providers::ollama`: Ollama API client and provider
 *   - `providers::mock`: Deterministic in-process provider
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: Language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod catalog;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use catalog::{LocalizationDocument, LocalizationEntry, TranslationUnit};
pub use errors::{AppError, DocumentError, ProviderError, TranslationError};
pub use language_utils::{TargetLanguage, get_language_name, language_codes_match, normalize_to_part2t};
pub use providers::{SessionProvider, TranslationSession};
pub use translation::{RunDriver, RunState, TranslationOrchestrator};
