use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Exit code recorded for a job that failed before the encoder was started.
pub const EXIT_JOB_REJECTED: i32 = 1;
/// Exit code recorded for a job whose encoder exceeded the per-job timeout.
pub const EXIT_TIMEOUT: i32 = 124;
/// Exit code recorded when the encoder process could not be spawned.
pub const EXIT_SPAWN_FAILED: i32 = 127;

/// Failures that abort the whole run before any job is started.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("encoder '{binary}' is not installed or not in PATH: {reason}")]
    EncoderNotFound { binary: String, reason: String },

    #[error("preset file not found at {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("failed to parse preset file {}: {reason}", .path.display())]
    ConfigParseError { path: PathBuf, reason: String },

    #[error("preset '{name}' is invalid: {reason}")]
    InvalidPreset { name: String, reason: String },

    #[error("preset(s) not found in {}: {}", .path.display(), .names.join(", "))]
    UnknownPreset { path: PathBuf, names: Vec<String> },

    #[error("input path does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("no videos found in {}", .0.display())]
    NoInputs(PathBuf),

    #[error("failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures scoped to a single (input, preset) job. These are logged and
/// counted but never stop the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("strategy must be 'cover' or 'contain', got '{0}'")]
    InvalidStrategy(String),

    #[error("encode mode must be 'bitrate' or 'crf', got '{0}'")]
    InvalidEncodeMode(String),

    #[error("invalid value '{value}' for override '{field}'")]
    InvalidOverride { field: &'static str, value: String },

    #[error("invalid bitrate '{value}': {reason}")]
    InvalidBitrate { value: String, reason: String },

    #[error("failed to spawn encoder: {0}")]
    Spawn(String),

    #[error("encoder did not finish within {0:?}")]
    Timeout(Duration),

    #[error("job task ended without a result: {0}")]
    Aborted(String),
}

impl JobError {
    /// Exit code folded into the batch result for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            JobError::Spawn(_) => EXIT_SPAWN_FAILED,
            JobError::Timeout(_) => EXIT_TIMEOUT,
            _ => EXIT_JOB_REJECTED,
        }
    }
}
