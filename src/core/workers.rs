//! Thread-pool execution of branch-pair partitions. One OS thread per
//! partition, batched to the machine's available parallelism; results are
//! collected keyed by original index so output order is deterministic
//! regardless of which thread finishes first.

use anyhow::{anyhow, Result};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread;

struct IndexedResult<T> {
    index: usize,
    value: T,
}

/// Marks a failure as originating from the worker pool itself (a partition's
/// `work` closure returning `Err`, a poisoned result lock, or a panicked
/// thread) rather than from some other stage of analysis. Callers that want
/// to degrade instead of aborting on a worker-pool fault can distinguish it
/// with `err.downcast_ref::<WorkerPoolError>()`.
#[derive(Debug)]
pub struct WorkerPoolError(pub anyhow::Error);

impl fmt::Display for WorkerPoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker pool failed: {:#}", self.0)
    }
}

impl std::error::Error for WorkerPoolError {}

/// Runs `work` over each of `partitions` on its own OS thread, batched to
/// the machine's available parallelism, and returns results in the same
/// order as `partitions`. Any partition's failure fails the whole run and is
/// reported as a [`WorkerPoolError`] so callers can tell a worker-level fault
/// apart from a fatal configuration/filesystem/git error.
pub fn run_partitioned<T, F>(partitions: Vec<Vec<(String, String)>>, work: F) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: Fn(&[(String, String)]) -> Result<T> + Send + Sync + 'static,
{
    if partitions.is_empty() {
        return Ok(Vec::new());
    }

    let batch_size = thread::available_parallelism().map(|n| n.get()).unwrap_or(1).max(1);
    let work = Arc::new(work);
    let results: Arc<Mutex<Vec<IndexedResult<T>>>> = Arc::new(Mutex::new(Vec::with_capacity(partitions.len())));
    let indexed: Vec<(usize, Vec<(String, String)>)> = partitions.into_iter().enumerate().collect();

    for batch in indexed.chunks(batch_size) {
        let mut handles = Vec::with_capacity(batch.len());
        for (index, partition) in batch.iter().cloned() {
            let work = Arc::clone(&work);
            let results = Arc::clone(&results);
            handles.push(thread::spawn(move || -> Result<()> {
                let value = work(&partition)?;
                results
                    .lock()
                    .map_err(|_| anyhow!("worker result lock poisoned"))?
                    .push(IndexedResult { index, value });
                Ok(())
            }));
        }
        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(err)) => return Err(WorkerPoolError(err).into()),
                Err(_) => return Err(WorkerPoolError(anyhow!("worker thread panicked")).into()),
            }
        }
    }

    let mut collected = Arc::try_unwrap(results)
        .map_err(|_| WorkerPoolError(anyhow!("worker results still shared after join")))?
        .into_inner()
        .map_err(|_| WorkerPoolError(anyhow!("worker result lock poisoned")))?;
    collected.sort_by_key(|r| r.index);
    Ok(collected.into_iter().map(|r| r.value).collect())
}
