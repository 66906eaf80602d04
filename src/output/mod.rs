//! Output abstraction layer for separating IO from business logic.
//!
//! This module provides the `Output` trait that abstracts all output operations,
//! so the analysis engine never calls `println!`/`eprintln!` directly and can be
//! driven identically from the CLI and from tests.
//!
//! ```ignore
//! pub fn run_with_output(args: Args, output: &mut dyn Output) -> Result<()> {
//!     output.step("Materialising branches...");
//!     output.result("drift (sd) = 1.75");
//!     Ok(())
//! }
//! ```

mod cli;

pub use cli::CliOutput;
pub use test::{OutputEntry, TestOutput};

/// Configuration for output behavior.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Suppress all but the final result when true.
    pub quiet: bool,
    /// Show per-step progress when true.
    pub verbose: bool,
    /// Emit only the JSON artifact to stdout, no human-readable chatter.
    pub json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            verbose: false,
            json: false,
        }
    }
}

impl OutputConfig {
    pub fn new(quiet: bool, verbose: bool, json: bool) -> Self {
        Self {
            quiet,
            verbose,
            json,
        }
    }
}

/// Trait for abstracting output operations.
///
/// Implementors should respect `quiet` and `verbose` modes where appropriate.
pub trait Output {
    /// Display an intermediate step message (e.g. "Checking out branch X").
    /// Only shown in verbose mode.
    fn step(&mut self, msg: &str);

    /// Display a warning. Always shown, not affected by quiet mode.
    fn warning(&mut self, msg: &str);

    /// Display an error. Always shown, not affected by quiet mode.
    fn error(&mut self, msg: &str);

    /// Display a debug message. Only shown in verbose mode.
    fn debug(&mut self, msg: &str);

    /// Display the final result (e.g. the computed drift). Shown unless quiet.
    fn result(&mut self, msg: &str);

    /// Display a key-value detail line.
    fn detail(&mut self, key: &str, value: &str);

    /// Signal the start of a long-running operation (e.g. a merge measurement pass).
    fn operation_start(&mut self, operation: &str);

    /// Signal the end of a long-running operation.
    fn operation_end(&mut self, operation: &str, success: bool);

    /// Emit raw, unformatted content (used for the `--json` artifact dump).
    fn raw(&mut self, content: &str);

    fn is_quiet(&self) -> bool;
    fn is_verbose(&self) -> bool;
}
