//! Pure parsing helpers for branch enumeration and activity. Kept free of
//! any subprocess I/O so the date/ignore-list logic is directly testable;
//! the sandbox is the only caller that actually shells out to `git`.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use regex::Regex;
use std::collections::HashMap;

/// Whether `ref_name` is the `HEAD` symref itself — the bare `HEAD` entry
/// or the `HEAD -> origin/main` pointer line `git branch --all` emits —
/// rather than a legitimately named branch that merely contains the
/// substring `HEAD` (e.g. `feature/HEADER`, `overhead-fix`).
fn is_head_symref(ref_name: &str) -> bool {
    ref_name == "HEAD" || ref_name == "origin/HEAD" || ref_name.starts_with("HEAD ->") || ref_name.starts_with("origin/HEAD ->")
}

/// Normalises one line of `git branch --all` output: strips the
/// `remotes/origin/` prefix and the current-branch marker `*`, trims
/// whitespace. Returns `None` for the HEAD symref or blank lines.
pub fn normalize_branch_line(line: &str) -> Option<String> {
    let cleaned = line.replace("remotes/origin/", "").replace('*', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || is_head_symref(cleaned) {
        return None;
    }
    Some(cleaned.to_string())
}

/// Parses `git branch --all` output into a deduplicated, sorted branch list.
pub fn parse_branch_list(raw: &str) -> Vec<String> {
    let mut branches: Vec<String> = Vec::new();
    for line in raw.lines() {
        if let Some(branch) = normalize_branch_line(line) {
            if !branches.contains(&branch) {
                branches.push(branch);
            }
        }
    }
    branches.sort();
    branches
}

/// Parses `%(committerdate:short)~%(refname:short)` lines (as produced by
/// [`crate::git::GitCommand::branch_activity`]) into a branch -> age-in-days
/// map, using today's date as the reference point.
pub fn parse_branch_activity(raw: &str) -> HashMap<String, i64> {
    parse_branch_activity_as_of(raw, Utc::now().date_naive())
}

/// As [`parse_branch_activity`], but with an explicit "today" so the
/// day-delta computation is deterministic in tests.
pub fn parse_branch_activity_as_of(raw: &str, today: NaiveDate) -> HashMap<String, i64> {
    let mut activity = HashMap::new();
    for line in raw.lines() {
        if line.is_empty() {
            continue;
        }
        let Some((date_str, refname)) = line.split_once('~') else {
            continue;
        };
        let Ok(commit_date) = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d") else {
            continue;
        };
        let refname = refname.trim().trim_start_matches('*').trim();
        if is_head_symref(refname) {
            continue;
        }
        let branch = refname.strip_prefix("origin/").unwrap_or(refname).to_string();
        let age_days = today.signed_duration_since(commit_date).num_days();
        activity.insert(branch, age_days);
    }
    activity
}

/// Compiles a list of regex strings, attaching the offending field/pattern
/// to the error context on failure.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("invalid regex {p:?}")))
        .collect()
}

/// Whether `branch` matches any of the compiled ignore patterns.
pub fn matches_any(branch: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|p| p.is_match(branch))
}

/// A branch dropped by [`filter_branches`], paired with why.
pub struct ExcludedBranch {
    pub branch: String,
    pub reason: String,
}

/// Applies the ignore-regex list and, if set, the activity timeout to a raw
/// branch list. A branch whose activity lookup fails (no entry in
/// `activity`) is excluded rather than kept whenever a timeout is
/// configured — per spec §4.3/§9, an unparseable or missing last-commit
/// date makes a branch suspect, not exempt.
pub fn filter_branches(
    branches: &[String],
    ignore_patterns: &[Regex],
    activity: &HashMap<String, i64>,
    timeout_days: Option<i64>,
) -> (Vec<String>, Vec<ExcludedBranch>) {
    let mut kept = Vec::new();
    let mut excluded = Vec::new();

    for branch in branches {
        if matches_any(branch, ignore_patterns) {
            excluded.push(ExcludedBranch {
                branch: branch.clone(),
                reason: "matched branch_ignore pattern".to_string(),
            });
            continue;
        }
        if let Some(limit) = timeout_days {
            match activity.get(branch) {
                Some(age) if *age <= limit => {}
                Some(age) => {
                    excluded.push(ExcludedBranch {
                        branch: branch.clone(),
                        reason: format!("last activity {age} days ago exceeds timeout of {limit} days"),
                    });
                    continue;
                }
                None => {
                    excluded.push(ExcludedBranch {
                        branch: branch.clone(),
                        reason: "activity lookup failed; treated as suspect".to_string(),
                    });
                    continue;
                }
            }
        }
        kept.push(branch.clone());
    }

    (kept, excluded)
}
