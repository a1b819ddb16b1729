/*!
 * Multi-language translation runs.
 *
 * - `orchestrator`: the I/O-free state machine that sequences languages
 *   and builds the string catalog
 * - `driver`: async loop executing the orchestrator's commands against a
 *   session provider
 */

// Re-export main types for easier usage
pub use self::driver::{CancelFlag, ProgressCallback, RunDriver};
pub use self::orchestrator::{
    split_source_lines, BatchRequest, BatchResult, RunProgress, RunState, RunTicket,
    SessionRequest, Step, TranslationOrchestrator,
};

// Submodules
pub mod driver;
pub mod orchestrator;
