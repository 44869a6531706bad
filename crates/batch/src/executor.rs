use std::future::Future;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use crate::command::EncoderCommand;
use crate::error::{JobError, EXIT_JOB_REJECTED};

/// Capability to run an encoder command and report its exit status.
///
/// `Ok(0)` is success, `Ok(n)` is the encoder's nonzero exit code, `Err`
/// covers everything that kept the process from producing one.
pub trait EncoderRunner: Send + Sync + 'static {
    fn run(&self, command: &EncoderCommand) -> impl Future<Output = Result<i32, JobError>> + Send;
}

/// Runs the real encoder as a child process.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl EncoderRunner for ProcessRunner {
    async fn run(&self, command: &EncoderCommand) -> Result<i32, JobError> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| JobError::Spawn(e.to_string()))?;

        let waited = match self.timeout {
            Some(limit) => {
                let result = tokio::time::timeout(limit, child.wait()).await;
                match result {
                    Ok(waited) => waited,
                    Err(_) => {
                        warn!("Encoder exceeded {:?}, killing it", limit);
                        if let Err(e) = child.kill().await {
                            warn!("Failed to kill timed out encoder: {}", e);
                        }
                        return Err(JobError::Timeout(limit));
                    }
                }
            }
            None => child.wait().await,
        };
        let status = waited.map_err(|e| JobError::Spawn(e.to_string()))?;

        // A signal-terminated process has no exit code.
        let code = status.code().unwrap_or(EXIT_JOB_REJECTED);
        debug!("Encoder exited with {}", code);
        Ok(code)
    }
}

/// JobExecutor bounds how many encoder processes run at once
pub struct JobExecutor {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl JobExecutor {
    /// Create a new JobExecutor with the specified maximum concurrent jobs
    pub fn new(max_concurrent_jobs: usize) -> Self {
        let max_concurrent = max_concurrent_jobs.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a free slot. The slot is released when the permit drops,
    /// so it can be moved into a spawned task.
    pub async fn acquire_slot(&self) -> Result<OwnedSemaphorePermit, JobError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| JobError::Spawn(format!("executor closed: {}", e)))
    }
}
