use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Runtime options for a batch, independent of the presets themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// Encoder binary, looked up on PATH.
    pub encoder: String,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub max_concurrent_jobs: usize,
    /// Per-job limit; `None` waits forever.
    pub job_timeout_secs: Option<u64>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            encoder: "ffmpeg".to_string(),
            output_dir: PathBuf::from("outputs"),
            dry_run: false,
            max_concurrent_jobs: 1,
            job_timeout_secs: None,
        }
    }
}

/// Read batch options from an optional TOML settings file.
///
/// No path means built-in defaults. A path that does not exist is logged and
/// also falls back to defaults.
pub fn load_options(path: Option<&Path>) -> Result<BatchOptions> {
    let options = match path {
        Some(settings) if settings.exists() => read_settings(settings)?,
        Some(settings) => {
            warn!(
                "No settings at {}, running with built-in options",
                settings.display()
            );
            BatchOptions::default()
        }
        None => BatchOptions::default(),
    };

    validate_options(&options)
        .with_context(|| format!("rejected batch options ({})", describe_source(path)))?;
    Ok(options)
}

fn read_settings(settings: &Path) -> Result<BatchOptions> {
    let raw = std::fs::read_to_string(settings)
        .with_context(|| format!("cannot read settings {}", settings.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("settings {} is not valid batch TOML", settings.display()))
}

fn describe_source(path: Option<&Path>) -> String {
    match path {
        Some(p) if p.exists() => p.display().to_string(),
        _ => "defaults".to_string(),
    }
}

pub fn validate_options(options: &BatchOptions) -> Result<()> {
    if options.encoder.trim().is_empty() {
        anyhow::bail!("no encoder binary configured");
    }

    if options.max_concurrent_jobs == 0 {
        anyhow::bail!("max_concurrent_jobs is 0; at least one encoder slot is needed");
    }

    if options.job_timeout_secs == Some(0) {
        anyhow::bail!("job_timeout_secs is 0; omit it to wait without a limit");
    }

    Ok(())
}
