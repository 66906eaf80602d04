//! Analysis configuration: a YAML file deserialised into a typed, validated
//! in-memory form.
//!
//! Loading is two-phase: a permissive `serde_yaml` deserialize into a struct
//! of `Option`/defaulted fields (mirroring how a config author may omit
//! anything but the required ones), followed by an explicit [`Config::validate`]
//! pass. `SystemConfig` is kept as a separate, much smaller document so a CI
//! runner can override thread count without touching the analysis config.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Analysis options, loaded from the YAML file passed via `-c`/`--config`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Path to the source Git repository. Required unless `csv_file` is set.
    pub input_repository: Option<String>,

    /// If true, `git pull origin <branch>` is run during branch materialisation.
    pub fetch_updates: bool,

    /// Regexes; matching branch names are excluded from analysis.
    pub branch_ignore: Vec<String>,

    /// Regexes; matching files are deleted from every materialised branch before analysis.
    /// Accepts the `file_ignore` alias used by some configs.
    #[serde(alias = "file_ignore")]
    pub blacklist: Vec<String>,

    /// Regexes; only matching files are retained in every materialised branch.
    /// Accepts the `file_whitelist` alias used by some configs.
    #[serde(alias = "file_whitelist")]
    pub whitelist: Vec<String>,

    /// Branches with no commit in this many days are excluded. `None` disables the check.
    pub timeout: Option<i64>,

    /// Directory where result artifacts (`driftool.log`, JSON, simple export) are written.
    pub output_directory: Option<String>,

    /// If set, bypass Git analysis entirely and ingest this semicolon-delimited distance CSV.
    pub csv_file: Option<String>,

    /// Title used to name simple-export artifacts.
    pub report_title: Option<String>,

    /// Accepted and validated, but a no-op (no plotting backend is implemented).
    pub print_plot: bool,

    /// Accepted and validated, but a no-op (no HTML backend is implemented).
    pub html: bool,

    /// Accepted and validated, but a no-op (no HTML backend is implemented).
    pub show_html: bool,

    /// If true, additionally write `d_<report_title>.txt` containing just the `sd` value.
    pub simple_export: bool,

    /// If true, additionally write the measured distance matrix as a
    /// semicolon-delimited CSV, in the same shape `csv_file` reads.
    pub csv_export: bool,
}

impl Config {
    /// Parse and validate a YAML config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Enforce the required fields and cross-field rules described in the
    /// analysis configuration's external interface.
    pub fn validate(&self) -> Result<()> {
        if self.csv_file.is_none() && self.input_repository.is_none() {
            bail!("config is missing required field `input_repository` (or `csv_file`)");
        }
        if self.csv_file.is_some()
            && (!self.branch_ignore.is_empty()
                || !self.blacklist.is_empty()
                || !self.whitelist.is_empty()
                || self.fetch_updates)
        {
            bail!(
                "config field `csv_file` forbids repository operations: unset \
                 `branch_ignore`, `blacklist`, `whitelist`, and `fetch_updates`"
            );
        }
        if let Some(timeout) = self.timeout {
            if timeout < 0 {
                bail!("config field `timeout` must not be negative, got {timeout}");
            }
        }
        for (field, patterns) in [
            ("branch_ignore", &self.branch_ignore),
            ("blacklist", &self.blacklist),
            ("whitelist", &self.whitelist),
        ] {
            for pattern in patterns {
                regex::Regex::new(pattern)
                    .with_context(|| format!("config field `{field}` has invalid regex {pattern:?}"))?;
            }
        }
        Ok(())
    }

    /// Whether this run bypasses Git analysis in favor of CSV ingress.
    pub fn uses_csv_ingress(&self) -> bool {
        self.csv_file.is_some()
    }

    pub fn output_directory_path(&self) -> Option<PathBuf> {
        self.output_directory.as_ref().map(PathBuf::from)
    }
}

/// Execution-environment options, independent of analysis semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Worker-thread count. Worker-pool mode activates when this is >= 2.
    pub number_threads: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self { number_threads: 1 }
    }
}

impl SystemConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading system config file {}", path.display()))?;
        let config: SystemConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing system config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.number_threads == 0 {
            bail!("config field `number_threads` must be at least 1");
        }
        Ok(())
    }

    pub fn worker_pool_enabled(&self) -> bool {
        self.number_threads >= 2
    }
}
