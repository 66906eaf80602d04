//! Reference/working sandbox lifecycle.
//!
//! A reference sandbox is a plain file copy of the input repository, turned
//! into a Git repository once and then "baked": every surviving branch is
//! checked out in turn and restricted to the configured whitelist/blacklist,
//! committing the restricted tree as that branch's new tip. A working
//! sandbox is a fresh copy of the (already baked) reference, checked out
//! twice and merged once per measured pair, then discarded.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::branches::{compile_patterns, filter_branches, parse_branch_activity, parse_branch_list};
use super::directory::{copy_dir_all, count_files, keep_whitelist, purge_blacklist};
use crate::git::GitCommand;
use crate::logging::RunLog;
use crate::utils::validate_branch_name;

pub struct ReferenceSandbox {
    _root: TempDir,
    path: PathBuf,
}

impl ReferenceSandbox {
    /// Copies `input_repository` into a fresh temp directory and configures
    /// the synthetic commit identity used for every commit this sandbox
    /// (and its working-sandbox copies) will make.
    pub fn create(input_repository: &Path, run_log: &RunLog) -> Result<Self> {
        let root = TempDir::new().context("creating reference sandbox directory")?;
        let path = root.path().to_path_buf();
        copy_dir_all(input_repository, &path)
            .with_context(|| format!("copying {} into reference sandbox", input_repository.display()))?;

        GitCommand::new(&path, true).configure_identity()?;
        run_log.push(format!(
            "reference sandbox created at {} ({} files)",
            path.display(),
            count_files(&path)
        ));
        Ok(Self { _root: root, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lists branches, drops ones matching `branch_ignore` or past
    /// `timeout_days`, then checks out each survivor in turn and commits it
    /// restricted to `whitelist`/`blacklist` — baking the file selection
    /// into every branch tip before any merge is attempted.
    pub fn materialize_branches(
        &self,
        branch_ignore: &[String],
        whitelist: &[String],
        blacklist: &[String],
        timeout_days: Option<i64>,
        fetch_updates: bool,
        run_log: &RunLog,
    ) -> Result<Vec<String>> {
        let git = GitCommand::new(&self.path, true);
        let all = parse_branch_list(&git.branch_all()?);
        let activity = parse_branch_activity(&git.branch_activity()?);
        let ignore_patterns = compile_patterns(branch_ignore)?;
        let (timeout_kept, timeout_excluded) = filter_branches(&all, &ignore_patterns, &activity, timeout_days);
        for excluded in &timeout_excluded {
            run_log.push(format!("excluded branch {}: {}", excluded.branch, excluded.reason));
        }
        let kept: Vec<String> = timeout_kept
            .into_iter()
            .filter(|branch| match validate_branch_name(branch) {
                Ok(()) => true,
                Err(err) => {
                    run_log.push(format!("excluded branch {branch}: {err:#}"));
                    false
                }
            })
            .collect();

        let whitelist_patterns = compile_patterns(whitelist)?;
        let blacklist_patterns = compile_patterns(blacklist)?;

        for branch in &kept {
            git.checkout(branch)
                .with_context(|| format!("checking out branch {branch} for materialization"))?;
            git.reset_hard()?;
            git.clean_fdx()?;

            if fetch_updates {
                if let Err(err) = git.pull("origin", branch) {
                    run_log.push(format!("fetch_updates: {branch}: {err:#}"));
                }
            }

            if !whitelist_patterns.is_empty() {
                keep_whitelist(&whitelist_patterns, &self.path)?;
            }
            if !blacklist_patterns.is_empty() {
                purge_blacklist(&blacklist_patterns, &self.path)?;
            }
            git.add_all()?;
            git.commit("close setup (driftool)")?;

            git.reset_hard()?;
            git.clean_fdx()?;
            run_log.push(format!("materialized branch {branch}"));
        }

        Ok(kept)
    }

    /// Copies this (baked) reference into a fresh working sandbox.
    pub fn spawn_working(&self) -> Result<WorkingSandbox> {
        WorkingSandbox::create(&self.path)
    }
}

pub struct WorkingSandbox {
    _root: TempDir,
    path: PathBuf,
}

impl WorkingSandbox {
    /// Copies `reference_path` into a fresh working sandbox. Public so a
    /// worker thread can spawn its own sandbox straight from a reference
    /// path without holding a borrow of the [`ReferenceSandbox`] itself.
    pub fn create(reference_path: &Path) -> Result<Self> {
        let root = TempDir::new().context("creating working sandbox directory")?;
        let path = root.path().to_path_buf();
        copy_dir_all(reference_path, &path)?;
        GitCommand::new(&path, true).configure_identity()?;
        Ok(Self { _root: root, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn git(&self) -> GitCommand {
        GitCommand::new(&self.path, true)
    }

    fn reset_to_branch(&self, branch: &str) -> Result<()> {
        let git = self.git();
        git.checkout(branch)
            .with_context(|| format!("checking out branch {branch} in working sandbox"))?;
        git.reset_hard()?;
        git.clean_fdx()?;
        Ok(())
    }

    /// Merges `incoming` into `base`, returning the number of conflicting
    /// lines. Only files `git merge`'s stdout explicitly names as
    /// conflicted are opened and scanned for conflict markers; any other
    /// dirty state left in the tree is ignored since the sandbox is
    /// discarded after this call.
    pub fn merge_and_count_conflicts(&self, base: &str, incoming: &str, run_log: &RunLog) -> Result<f64> {
        self.reset_to_branch(incoming)?;
        self.reset_to_branch(base)?;

        let git = self.git();
        let output = git.merge(incoming)?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        let conflict_files = parse_conflict_files(&stdout);
        let mut total_lines = 0.0;
        for file in &conflict_files {
            match git.read_worktree_file(Path::new(file)) {
                Some(contents) => total_lines += count_conflict_lines(&contents),
                None => run_log.push(format!(
                    "merge {base} <- {incoming}: skipped non-UTF-8 conflicted file {file}"
                )),
            }
        }

        git.merge_abort().ok();
        Ok(total_lines)
    }
}

/// Extracts file paths from `git merge` stdout lines of the form
/// `Merge conflict in <path>`. Conflict volume is only ever counted inside
/// files Git itself names this way — never a blind whole-tree scan.
fn parse_conflict_files(stdout: &str) -> Vec<String> {
    const MARKER: &str = "Merge conflict in ";
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix(MARKER).map(|path| path.trim().to_string()))
        .collect()
}

/// Counts lines spanned by `<<<<<<<`/`>>>>>>>` conflict regions in `contents`.
fn count_conflict_lines(contents: &str) -> f64 {
    let mut total = 0usize;
    let mut inside = false;
    let mut start = 0usize;
    for (index, line) in contents.lines().enumerate() {
        if line.starts_with("<<<<<<<") {
            inside = true;
            start = index;
        } else if line.starts_with(">>>>>>>") && inside {
            total += index - start;
            inside = false;
        }
    }
    total as f64
}
