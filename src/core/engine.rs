//! Top-level orchestration tying configuration, sandboxing, scheduling, and
//! the distance/MDS/drift pipeline together into one analysis run.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, SystemConfig};
use crate::logging::RunLog;
use crate::output::Output;

use super::aggregate::build_distance_matrix;
use super::csv_ingress;
use super::drift::calculate_drift;
use super::environment::{DistanceMatrix, MeasuredEnvironment};
use super::mds::classical_mds;
use super::sandbox::{ReferenceSandbox, WorkingSandbox};
use super::scheduler::{partition_pairs, unordered_pairs};
use super::workers::{run_partitioned, WorkerPoolError};

/// Runs the full Git-analysis pipeline described by `config`/`system`.
pub fn run_analysis(
    config: &Config,
    system: &SystemConfig,
    output: &mut dyn Output,
    run_log: &Arc<RunLog>,
) -> Result<MeasuredEnvironment> {
    let input_repository = config
        .input_repository
        .as_ref()
        .context("config is missing `input_repository`")?;
    let input_path = PathBuf::from(input_repository);

    output.operation_start("materializing repository sandbox");
    let reference = ReferenceSandbox::create(&input_path, run_log)?;

    if config.fetch_updates {
        output.step("fetching updates is enabled; pulling tracked branches before materialization");
    }

    let branches = reference.materialize_branches(
        &config.branch_ignore,
        &config.whitelist,
        &config.blacklist,
        config.timeout,
        config.fetch_updates,
        run_log,
    )?;
    output.detail("branches", &branches.len().to_string());
    output.operation_end("materializing repository sandbox", true);

    if branches.len() < 2 {
        output.warning("fewer than two branches survived filtering; drift is trivially zero");
        let matrix = DistanceMatrix::zeroed(branches.clone());
        let embedding = classical_mds(&matrix);
        let sd = calculate_drift(&embedding);
        return Ok(MeasuredEnvironment::from_matrix(matrix, embedding, sd));
    }

    let pairs = unordered_pairs(&branches);
    output.operation_start("measuring pairwise merge conflicts");
    let measurements = if system.worker_pool_enabled() {
        match measure_multi_threaded(&reference, &pairs, system.number_threads, run_log) {
            Ok(measurements) => measurements,
            Err(err) if err.downcast_ref::<WorkerPoolError>().is_some() => {
                output.operation_end("measuring pairwise merge conflicts", false);
                output.error(&format!("worker pool failed: {err:#}"));
                run_log.push(format!("worker pool failed: {err:#}; degrading to sentinel result"));
                return Ok(MeasuredEnvironment::degraded(branches));
            }
            Err(err) => return Err(err),
        }
    } else {
        measure_single_threaded(&reference, &pairs, run_log)?
    };
    output.operation_end("measuring pairwise merge conflicts", true);

    let matrix = build_distance_matrix(&branches, &measurements);
    let embedding = classical_mds(&matrix);
    let sd = calculate_drift(&embedding);
    output.result(&format!("drift (sd) = {sd:.4}"));

    Ok(MeasuredEnvironment::from_matrix(matrix, embedding, sd))
}

/// Bypasses Git analysis entirely: reads a precomputed distance matrix from
/// a CSV file and runs only MDS + drift over it.
pub fn run_csv_analysis(config: &Config, output: &mut dyn Output) -> Result<MeasuredEnvironment> {
    let csv_file = config.csv_file.as_ref().context("config is missing `csv_file`")?;
    let matrix = csv_ingress::read_distance_matrix(&PathBuf::from(csv_file))?;
    output.detail("branches", &matrix.len().to_string());

    let embedding = classical_mds(&matrix);
    let sd = calculate_drift(&embedding);
    output.result(&format!("drift (sd) = {sd:.4}"));

    Ok(MeasuredEnvironment::from_matrix(matrix, embedding, sd))
}

/// Measures both merge directions for every pair and averages them — twice
/// the sandbox churn of the worker-pool path, in exchange for
/// direction-independent results.
fn measure_single_threaded(
    reference: &ReferenceSandbox,
    pairs: &[(String, String)],
    run_log: &Arc<RunLog>,
) -> Result<Vec<(String, String, f64)>> {
    let mut measurements = Vec::with_capacity(pairs.len());
    for (a, b) in pairs {
        let working = reference.spawn_working()?;
        let distance_a = working.merge_and_count_conflicts(a, b, run_log)?;
        let distance_b = working.merge_and_count_conflicts(b, a, run_log)?;
        let average = (distance_a + distance_b) * 0.5;
        measurements.push((a.clone(), b.clone(), average));
    }
    Ok(measurements)
}

/// Measures only one merge direction per pair and reuses that value for
/// both directions during aggregation — half the sandbox churn of the
/// single-thread path, at the documented cost of assuming both merge
/// directions conflict identically.
fn measure_multi_threaded(
    reference: &ReferenceSandbox,
    pairs: &[(String, String)],
    number_threads: usize,
    run_log: &Arc<RunLog>,
) -> Result<Vec<(String, String, f64)>> {
    let buckets = partition_pairs(pairs, number_threads);
    let reference_path = reference.path().to_path_buf();
    let run_log = Arc::clone(run_log);

    let bucket_results = run_partitioned(buckets, move |bucket| {
        let working = WorkingSandbox::create(&reference_path)?;
        let mut measured = Vec::with_capacity(bucket.len());
        for (a, b) in bucket {
            let distance = working.merge_and_count_conflicts(a, b, &run_log)?;
            measured.push((a.clone(), b.clone(), distance));
        }
        if measured.len() != bucket.len() {
            anyhow::bail!("worker produced {} results for {} pairs", measured.len(), bucket.len());
        }
        Ok(measured)
    })?;

    Ok(bucket_results.into_iter().flatten().collect())
}
