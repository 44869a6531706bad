use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::config::BatchOptions;
use crate::error::{JobError, SetupError};
use crate::executor::{EncoderRunner, JobExecutor};
use crate::jobs::{enumerate_jobs, resolve_job, BatchResult, Job, JobOutcome, JobRecord};
use crate::overrides::OverrideSet;
use crate::preset::PresetStore;

/// Run every (input × preset) job and collect the outcome log.
///
/// Setup problems (unknown preset, unwritable output directory) fail the
/// whole call before any job starts. Everything after that is job-scoped:
/// a failing job is logged and recorded, and the rest of the batch still
/// runs.
pub async fn run_batch<R: EncoderRunner>(
    inputs: &[PathBuf],
    preset_names: &[String],
    store: &PresetStore,
    overrides: &OverrideSet,
    options: &BatchOptions,
    runner: Arc<R>,
) -> Result<BatchResult, SetupError> {
    store.ensure_known(preset_names)?;

    if !options.dry_run {
        std::fs::create_dir_all(&options.output_dir).map_err(|source| SetupError::OutputDir {
            path: options.output_dir.clone(),
            source,
        })?;
    }

    let specs = enumerate_jobs(inputs, preset_names);
    info!(
        "Scheduling {} jobs ({} inputs x {} presets)",
        specs.len(),
        inputs.len(),
        preset_names.len()
    );

    let executor = JobExecutor::new(options.max_concurrent_jobs);
    let mut running: JoinSet<JobRecord> = JoinSet::new();
    // Spawned jobs that have not reported yet, keyed by schedule index.
    let mut pending: BTreeMap<usize, JobRecord> = BTreeMap::new();
    let mut result = BatchResult::new();

    for spec in specs {
        let started_at = Utc::now();
        let base = store.get(&spec.preset_name)?;

        let job = match resolve_job(
            &spec,
            base,
            overrides,
            &options.encoder,
            &options.output_dir,
        ) {
            Ok(job) => job,
            Err(e) => {
                let outcome = JobOutcome::from_error(&e);
                log_outcome(&spec.input, &spec.preset_name, &outcome);
                result.push(JobRecord {
                    index: spec.index,
                    input: spec.input,
                    preset_name: spec.preset_name,
                    output: None,
                    command: None,
                    outcome,
                    started_at,
                    finished_at: Utc::now(),
                });
                continue;
            }
        };

        let rendered = job.command.render();

        if options.dry_run {
            println!("DRY RUN: {}", rendered);
            result.push(record_for(job, rendered, JobOutcome::Success, started_at));
            continue;
        }

        // Take the slot here so jobs start in schedule order.
        let slot = match executor.acquire_slot().await {
            Ok(slot) => slot,
            Err(e) => {
                let outcome = JobOutcome::from_error(&e);
                log_outcome(&job.spec.input, &job.spec.preset_name, &outcome);
                result.push(record_for(job, rendered, outcome, started_at));
                continue;
            }
        };

        let started_at = Utc::now();
        let unreported = JobError::Aborted("panicked or cancelled".to_string());
        pending.insert(
            job.spec.index,
            record_for(
                job.clone(),
                rendered.clone(),
                JobOutcome::from_error(&unreported),
                started_at,
            ),
        );

        let runner = Arc::clone(&runner);
        running.spawn(async move {
            let _slot = slot;
            info!("Running: {}", rendered);

            let outcome = match runner.run(&job.command).await {
                Ok(code) => JobOutcome::from_exit_code(code),
                Err(e) => JobOutcome::from_error(&e),
            };
            log_outcome(&job.spec.input, &job.spec.preset_name, &outcome);
            record_for(job, rendered, outcome, started_at)
        });
    }

    while let Some(joined) = running.join_next().await {
        match joined {
            Ok(record) => {
                pending.remove(&record.index);
                result.push(record);
            }
            Err(e) => error!("Job task failed: {}", e),
        }
    }

    // A task that panicked or was cancelled still counts as a failed job.
    for (_, mut record) in pending {
        record.finished_at = Utc::now();
        log_outcome(&record.input, &record.preset_name, &record.outcome);
        result.push(record);
    }

    info!(
        "Batch finished: {} succeeded, {} failed",
        result.succeeded(),
        result.failed()
    );
    Ok(result)
}

fn record_for(
    job: Job,
    rendered: String,
    outcome: JobOutcome,
    started_at: DateTime<Utc>,
) -> JobRecord {
    JobRecord {
        index: job.spec.index,
        input: job.spec.input,
        preset_name: job.spec.preset_name,
        output: Some(job.output),
        command: Some(rendered),
        outcome,
        started_at,
        finished_at: Utc::now(),
    }
}

fn log_outcome(input: &Path, preset_name: &str, outcome: &JobOutcome) {
    match outcome {
        JobOutcome::Success => debug!(
            "Finished {} with preset {}",
            input.display(),
            preset_name
        ),
        JobOutcome::Failure { exit_code, reason } => error!(
            "Error processing {} with preset {} (exit {}): {}",
            input.display(),
            preset_name,
            exit_code,
            reason
        ),
    }
}
