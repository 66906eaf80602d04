//! Writes analysis results to disk: the JSON artifact, the run log (always,
//! regardless of outcome), and the optional simple `d_<report_title>.txt`
//! scalar export.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::core::csv_ingress::write_distance_matrix;
use crate::core::environment::DistanceMatrix;
use crate::core::MeasuredEnvironment;
use crate::logging::RunLog;

/// Writes every artifact this run's config calls for into `output_directory`
/// (defaulting to the current directory), and always writes `driftool.log`
/// regardless of the run's outcome. Returns the path of the JSON artifact.
pub fn write_artifacts(config: &Config, environment: &MeasuredEnvironment, run_log: &RunLog) -> Result<PathBuf> {
    let output_dir = config.output_directory_path().unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let timestamp = Utc::now().format("%Y%m%dT%H%M%SZ");
    let json_path = output_dir.join(format!("driftool_results_{timestamp}.json"));
    write_json(&json_path, environment)?;

    if config.simple_export {
        let report_title = config.report_title.clone().unwrap_or_default();
        let simple_path = output_dir.join(format!("d_{report_title}.txt"));
        std::fs::write(&simple_path, environment.sd.to_string())
            .with_context(|| format!("writing simple export {}", simple_path.display()))?;
    }

    if config.csv_export {
        let matrix = DistanceMatrix {
            branches: environment.branches.clone(),
            values: environment.line_matrix.clone(),
        };
        let csv_path = output_dir.join("driftool_matrix.csv");
        write_distance_matrix(&csv_path, &matrix)
            .with_context(|| format!("writing CSV export {}", csv_path.display()))?;
    }

    run_log
        .flush_to_file(&output_dir.join("driftool.log"))
        .with_context(|| format!("writing run log to {}", output_dir.display()))?;

    Ok(json_path)
}

fn write_json(path: &Path, environment: &MeasuredEnvironment) -> Result<()> {
    let json = serde_json::to_string_pretty(environment).context("serializing measured environment")?;
    std::fs::write(path, json).with_context(|| format!("writing JSON artifact {}", path.display()))
}
