//! CLI output implementation.

use super::{Output, OutputConfig};
use crate::styles::{self, colors_enabled, colors_enabled_stderr};
use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::time::Duration;

/// CLI output implementation that writes directly to stdout/stderr.
///
/// Git-like output format:
/// - `step()` → verbose only, no prefix
/// - `result()` → primary output, always shown (unless quiet)
/// - `warning()` → `eprintln!("warning: {msg}")`
/// - `error()` → `eprintln!("error: {msg}")`
/// - `raw()` → the `--json` artifact dump, unaffected by quiet mode
pub struct CliOutput {
    config: OutputConfig,
    spinner: Option<ProgressBar>,
}

impl CliOutput {
    /// Create a new CLI output with the given configuration.
    pub fn new(config: OutputConfig) -> Self {
        Self {
            config,
            spinner: None,
        }
    }

    /// Create a CLI output with default (non-quiet, non-verbose, non-json) settings.
    pub fn default_output() -> Self {
        Self::new(OutputConfig::default())
    }

    /// Create a CLI output in quiet mode.
    pub fn quiet() -> Self {
        Self::new(OutputConfig::new(true, false, false))
    }

    /// Create a CLI output in verbose mode.
    pub fn verbose() -> Self {
        Self::new(OutputConfig::new(false, true, false))
    }
}

impl CliOutput {
    /// Print a line to stdout, suspending any active spinner first.
    fn stdout_line(&self, line: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.suspend(|| println!("{line}"));
        } else {
            println!("{line}");
        }
    }

    /// Print a line to stderr, printing above any active spinner.
    fn stderr_line(&self, line: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.println(line);
        } else {
            eprintln!("{line}");
        }
    }

    fn start_spinner(&mut self, msg: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        if cfg!(test) || env::var("DRIFTOOL_TESTING").is_ok() {
            return;
        }
        if !colors_enabled_stderr() {
            return;
        }

        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_chars(
                "\u{2807}\u{2819}\u{2839}\u{2838}\u{283c}\u{2834}\u{2826}\u{2827}\u{2807}\u{280f}",
            );

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.set_message(msg.to_string());
        spinner.tick();
        spinner.enable_steady_tick(Duration::from_millis(80));

        self.spinner = Some(spinner);
    }

    fn finish_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
            use std::io::Write;
            let _ = std::io::stderr().write_all(b"\x1b[2K\r");
            let _ = std::io::stderr().flush();
        }
    }
}

impl Output for CliOutput {
    fn step(&mut self, msg: &str) {
        if self.config.json {
            return;
        }
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(msg.to_string());
            return;
        }
        if self.config.verbose && !self.config.quiet {
            if colors_enabled() {
                self.stdout_line(&format!("{}{msg}{}", styles::DIM, styles::RESET));
            } else {
                self.stdout_line(msg);
            }
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.config.json {
            return;
        }
        if colors_enabled_stderr() {
            self.stderr_line(&format!(
                "{}warning:{} {msg}",
                styles::YELLOW,
                styles::RESET
            ));
        } else {
            self.stderr_line(&format!("warning: {msg}"));
        }
    }

    fn error(&mut self, msg: &str) {
        if self.config.json {
            return;
        }
        if colors_enabled_stderr() {
            self.stderr_line(&format!("{}error:{} {msg}", styles::RED, styles::RESET));
        } else {
            self.stderr_line(&format!("error: {msg}"));
        }
    }

    fn debug(&mut self, msg: &str) {
        if self.config.json || !self.config.verbose {
            return;
        }
        if colors_enabled() {
            self.stdout_line(&format!("{}debug: {msg}{}", styles::DIM, styles::RESET));
        } else {
            self.stdout_line(&format!("debug: {msg}"));
        }
    }

    fn result(&mut self, msg: &str) {
        if self.config.json || self.config.quiet {
            return;
        }
        if colors_enabled() {
            self.stdout_line(&format!("{}{msg}{}", styles::BOLD, styles::RESET));
        } else {
            self.stdout_line(msg);
        }
    }

    fn detail(&mut self, key: &str, value: &str) {
        if self.config.json || self.config.quiet {
            return;
        }
        if colors_enabled() {
            self.stdout_line(&format!(
                "  {}{key}:{} {value}",
                styles::BOLD,
                styles::RESET
            ));
        } else {
            self.stdout_line(&format!("  {key}: {value}"));
        }
    }

    fn operation_start(&mut self, operation: &str) {
        self.start_spinner(operation);
    }

    fn operation_end(&mut self, operation: &str, success: bool) {
        self.finish_spinner();
        if self.config.json || self.config.quiet {
            return;
        }
        if self.config.verbose {
            if success {
                self.stdout_line(&format!("{operation} completed"));
            } else {
                self.stderr_line(&format!("{operation} failed"));
            }
        }
    }

    fn raw(&mut self, content: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.suspend(|| print!("{content}"));
        } else {
            print!("{content}");
        }
    }

    fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    fn is_verbose(&self) -> bool {
        self.config.verbose
    }
}

impl Drop for CliOutput {
    fn drop(&mut self) {
        self.finish_spinner();
    }
}
