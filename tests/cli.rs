//! End-to-end tests driving the compiled `driftool` binary against small,
//! throwaway Git repositories, covering the concrete scenarios a config's
//! branch/file filtering is supposed to produce.

use assert_cmd::Command;
use predicates::str::contains;
use std::path::Path;
use std::process::Command as StdCommand;

fn git(dir: &Path, args: &[&str]) {
    let status = StdCommand::new("git")
        .current_dir(dir)
        .args(args)
        .status()
        .expect("failed to run git");
    assert!(status.success(), "git {args:?} failed in {}", dir.display());
}

fn init_repo(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    git(dir, &["init", "--quiet"]);
    git(dir, &["config", "user.name", "test"]);
    git(dir, &["config", "user.email", "test@localhost"]);
    std::fs::write(dir.join("shared.txt"), "line one\nline two\nline three\n").unwrap();
    git(dir, &["add", "--all"]);
    git(dir, &["commit", "--quiet", "-m", "initial"]);
    // Normalize the default branch name regardless of the host's git config.
    git(dir, &["branch", "-M", "main"]);
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("driftool.yaml");
    std::fs::write(&path, body).unwrap();
    path
}

fn result_json(output_dir: &Path) -> serde_json::Value {
    let entry = std::fs::read_dir(output_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .find(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            name.starts_with("driftool_results_") && name.ends_with(".json")
        })
        .expect("no driftool_results_*.json artifact was written");
    let raw = std::fs::read_to_string(entry.path()).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn test_empty_drift_between_additive_branches() {
    let repo = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    init_repo(repo.path());

    git(repo.path(), &["checkout", "-b", "additive_feature"]);
    std::fs::write(repo.path().join("new_file.txt"), "brand new content\n").unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "additive change"]);
    git(repo.path(), &["checkout", "main"]);

    let config_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(
        config_dir.path(),
        &format!(
            "input_repository: {}\noutput_directory: {}\n",
            repo.path().display(),
            output.path().display()
        ),
    );

    Command::cargo_bin("driftool")
        .unwrap()
        .arg("-c")
        .arg(&config_path)
        .current_dir(config_dir.path())
        .assert()
        .success();

    let result = result_json(output.path());
    assert_eq!(result["sd"].as_f64().unwrap(), 0.0);
    let branches: Vec<&str> = result["branches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(branches.contains(&"main"));
    assert!(branches.contains(&"additive_feature"));
}

#[test]
fn test_symmetric_conflict_produces_positive_drift() {
    let repo = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    init_repo(repo.path());

    git(repo.path(), &["checkout", "-b", "conflicting_feature_a"]);
    std::fs::write(repo.path().join("shared.txt"), "line one\nline two A\nline three\n").unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "a's change"]);
    git(repo.path(), &["checkout", "main"]);

    git(repo.path(), &["checkout", "-b", "conflicting_feature_b"]);
    std::fs::write(repo.path().join("shared.txt"), "line one\nline two B\nline three\n").unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "b's change"]);
    git(repo.path(), &["checkout", "main"]);

    let config_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(
        config_dir.path(),
        &format!(
            "input_repository: {}\noutput_directory: {}\n",
            repo.path().display(),
            output.path().display()
        ),
    );

    Command::cargo_bin("driftool")
        .unwrap()
        .arg("-c")
        .arg(&config_path)
        .current_dir(config_dir.path())
        .assert()
        .success();

    let result = result_json(output.path());
    assert!(result["sd"].as_f64().unwrap() > 0.0);

    let branches: Vec<String> = result["branches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    let i = branches.iter().position(|b| b == "conflicting_feature_a").unwrap();
    let j = branches.iter().position(|b| b == "conflicting_feature_b").unwrap();
    let matrix = result["line_matrix"].as_array().unwrap();
    let d_ij = matrix[i].as_array().unwrap()[j].as_f64().unwrap();
    let d_ji = matrix[j].as_array().unwrap()[i].as_f64().unwrap();
    assert!(d_ij > 0.0);
    assert_eq!(d_ij, d_ji);
}

#[test]
fn test_blacklist_removes_conflicting_file_and_zeroes_drift() {
    let repo = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    init_repo(repo.path());

    git(repo.path(), &["checkout", "-b", "conflicting_feature_a"]);
    std::fs::write(repo.path().join("shared.txt"), "line one\nline two A\nline three\n").unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "a's change"]);
    git(repo.path(), &["checkout", "main"]);

    git(repo.path(), &["checkout", "-b", "conflicting_feature_b"]);
    std::fs::write(repo.path().join("shared.txt"), "line one\nline two B\nline three\n").unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "b's change"]);
    git(repo.path(), &["checkout", "main"]);

    let config_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(
        config_dir.path(),
        &format!(
            "input_repository: {}\noutput_directory: {}\nblacklist:\n  - \"shared\\\\.txt\"\n",
            repo.path().display(),
            output.path().display()
        ),
    );

    Command::cargo_bin("driftool")
        .unwrap()
        .arg("-c")
        .arg(&config_path)
        .current_dir(config_dir.path())
        .assert()
        .success();

    let result = result_json(output.path());
    assert_eq!(result["sd"].as_f64().unwrap(), 0.0);
}

#[test]
fn test_whitelist_retains_only_matching_file_and_zeroes_drift() {
    let repo = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    init_repo(repo.path());
    std::fs::write(repo.path().join("safe.txt"), "unrelated content\n").unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "add safe file"]);

    git(repo.path(), &["checkout", "-b", "conflicting_feature_a"]);
    std::fs::write(repo.path().join("shared.txt"), "line one\nline two A\nline three\n").unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "a's change"]);
    git(repo.path(), &["checkout", "main"]);

    git(repo.path(), &["checkout", "-b", "conflicting_feature_b"]);
    std::fs::write(repo.path().join("shared.txt"), "line one\nline two B\nline three\n").unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "b's change"]);
    git(repo.path(), &["checkout", "main"]);

    let config_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(
        config_dir.path(),
        &format!(
            "input_repository: {}\noutput_directory: {}\nwhitelist:\n  - \"safe\\\\.txt\"\n",
            repo.path().display(),
            output.path().display()
        ),
    );

    Command::cargo_bin("driftool")
        .unwrap()
        .arg("-c")
        .arg(&config_path)
        .current_dir(config_dir.path())
        .assert()
        .success();

    let result = result_json(output.path());
    assert_eq!(result["sd"].as_f64().unwrap(), 0.0);
}

#[test]
fn test_golden_four_branch_topology_reproduces_known_drift() {
    let repo = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    init_repo(repo.path());

    git(repo.path(), &["checkout", "-b", "additive_feature"]);
    std::fs::write(repo.path().join("new_file.txt"), "brand new content\n").unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "additive change"]);
    git(repo.path(), &["checkout", "main"]);

    // Both feature branches replace the shared repo's middle line with a
    // different number of lines, so merging one into the other always
    // leaves a single conflict hunk spanning exactly 2 + 3 + 2 = 7 lines
    // (ours + theirs + the <<<<<<</======= />>>>>>> markers), regardless of
    // merge direction. Every other pair in this topology merges cleanly, so
    // classical MDS collapses to a single non-zero axis and the drift
    // scalar works out to 7 / 4 = 1.75.
    git(repo.path(), &["checkout", "-b", "conflicting_feature_a"]);
    std::fs::write(repo.path().join("shared.txt"), "line one\nline two A1\nline two A2\nline three\n").unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "a's change"]);
    git(repo.path(), &["checkout", "main"]);

    git(repo.path(), &["checkout", "-b", "conflicting_feature_b"]);
    std::fs::write(
        repo.path().join("shared.txt"),
        "line one\nline two B1\nline two B2\nline two B3\nline three\n",
    )
    .unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "b's change"]);
    git(repo.path(), &["checkout", "main"]);

    let config_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(
        config_dir.path(),
        &format!(
            "input_repository: {}\noutput_directory: {}\nsimple_export: true\nreport_title: golden\n",
            repo.path().display(),
            output.path().display()
        ),
    );

    Command::cargo_bin("driftool")
        .unwrap()
        .arg("-c")
        .arg(&config_path)
        .current_dir(config_dir.path())
        .assert()
        .success();

    let result = result_json(output.path());
    let sd = result["sd"].as_f64().unwrap();
    assert!((sd - 1.75).abs() < 1e-6, "sd = {sd}");

    let simple_export = std::fs::read_to_string(output.path().join("d_golden.txt")).unwrap();
    let exported: f64 = simple_export.trim().parse().unwrap();
    assert!((exported - 1.75).abs() < 1e-6, "exported sd = {exported}");
}

#[test]
fn test_multi_threaded_worker_pool_matches_symmetric_conflict() {
    let repo = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    init_repo(repo.path());

    git(repo.path(), &["checkout", "-b", "conflicting_feature_a"]);
    std::fs::write(repo.path().join("shared.txt"), "line one\nline two A\nline three\n").unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "a's change"]);
    git(repo.path(), &["checkout", "main"]);

    git(repo.path(), &["checkout", "-b", "conflicting_feature_b"]);
    std::fs::write(repo.path().join("shared.txt"), "line one\nline two B\nline three\n").unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "b's change"]);
    git(repo.path(), &["checkout", "main"]);

    let config_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(
        config_dir.path(),
        &format!(
            "input_repository: {}\noutput_directory: {}\n",
            repo.path().display(),
            output.path().display()
        ),
    );
    let system_config_path = config_dir.path().join("driftool_system.yaml");
    std::fs::write(&system_config_path, "number_threads: 2\n").unwrap();

    Command::cargo_bin("driftool")
        .unwrap()
        .arg("-c")
        .arg(&config_path)
        .current_dir(config_dir.path())
        .assert()
        .success();

    let result = result_json(output.path());
    assert!(result["sd"].as_f64().unwrap() > 0.0);

    let branches: Vec<String> = result["branches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    let i = branches.iter().position(|b| b == "conflicting_feature_a").unwrap();
    let j = branches.iter().position(|b| b == "conflicting_feature_b").unwrap();
    let matrix = result["line_matrix"].as_array().unwrap();
    let d_ij = matrix[i].as_array().unwrap()[j].as_f64().unwrap();
    let d_ji = matrix[j].as_array().unwrap()[i].as_f64().unwrap();
    assert!(d_ij > 0.0);
    assert_eq!(d_ij, d_ji);
}

#[test]
fn test_branch_ignore_excludes_matching_branch() {
    let repo = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    init_repo(repo.path());

    git(repo.path(), &["checkout", "-b", "conflicting_feature_a"]);
    std::fs::write(repo.path().join("shared.txt"), "line one\nline two A\nline three\n").unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "a's change"]);
    git(repo.path(), &["checkout", "main"]);

    git(repo.path(), &["checkout", "-b", "conflicting_feature_b"]);
    std::fs::write(repo.path().join("shared.txt"), "line one\nline two B\nline three\n").unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "b's change"]);
    git(repo.path(), &["checkout", "main"]);

    let config_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(
        config_dir.path(),
        &format!(
            "input_repository: {}\noutput_directory: {}\nbranch_ignore:\n  - \"conflicting_feature_b\"\n",
            repo.path().display(),
            output.path().display()
        ),
    );

    Command::cargo_bin("driftool")
        .unwrap()
        .arg("-c")
        .arg(&config_path)
        .current_dir(config_dir.path())
        .assert()
        .success();

    let result = result_json(output.path());
    let branches: Vec<String> = result["branches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert!(!branches.contains(&"conflicting_feature_b".to_string()));
    assert_eq!(result["sd"].as_f64().unwrap(), 0.0);
}

#[test]
fn test_missing_required_field_exits_nonzero() {
    let config_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(config_dir.path(), "fetch_updates: true\n");

    Command::cargo_bin("driftool")
        .unwrap()
        .arg("-c")
        .arg(&config_path)
        .current_dir(config_dir.path())
        .assert()
        .code(2)
        .stderr(contains("input_repository"));
}

#[test]
fn test_csv_ingress_round_trips_through_csv_export() {
    let output = tempfile::tempdir().unwrap();
    let csv_dir = tempfile::tempdir().unwrap();
    let csv_path = csv_dir.path().join("matrix.csv");
    std::fs::write(&csv_path, "main;feature\n0;6\n6;0\n").unwrap();

    let config_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(
        config_dir.path(),
        &format!(
            "csv_file: {}\noutput_directory: {}\ncsv_export: true\n",
            csv_path.display(),
            output.path().display()
        ),
    );

    Command::cargo_bin("driftool")
        .unwrap()
        .arg("-c")
        .arg(&config_path)
        .current_dir(config_dir.path())
        .assert()
        .success();

    let exported = std::fs::read_to_string(output.path().join("driftool_matrix.csv")).unwrap();
    assert!(exported.contains("main;feature") || exported.contains("feature;main"));

    let first_result = result_json(output.path());

    // Feed the exported matrix back in and confirm the drift scalar matches.
    let second_config_dir = tempfile::tempdir().unwrap();
    let second_output = tempfile::tempdir().unwrap();
    let second_config_path = write_config(
        second_config_dir.path(),
        &format!(
            "csv_file: {}\noutput_directory: {}\n",
            output.path().join("driftool_matrix.csv").display(),
            second_output.path().display()
        ),
    );
    Command::cargo_bin("driftool")
        .unwrap()
        .arg("-c")
        .arg(&second_config_path)
        .current_dir(second_config_dir.path())
        .assert()
        .success();
    let second_result = result_json(second_output.path());

    assert!((first_result["sd"].as_f64().unwrap() - second_result["sd"].as_f64().unwrap()).abs() < 1e-9);
}
