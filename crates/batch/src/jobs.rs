use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::command::{build_command, EncoderCommand};
use crate::error::JobError;
use crate::naming::output_path;
use crate::overrides::{merge, OverrideSet};
use crate::preset::Preset;

/// One cell of the input × preset cross product, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// Position in schedule order.
    pub index: usize,
    pub input: PathBuf,
    pub preset_name: String,
}

/// A fully resolved job. Each job owns its own preset copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub spec: JobSpec,
    pub preset: Preset,
    pub output: PathBuf,
    pub command: EncoderCommand,
}

/// Cross product in schedule order: every preset for the first input, then
/// every preset for the next input.
pub fn enumerate_jobs(inputs: &[PathBuf], preset_names: &[String]) -> Vec<JobSpec> {
    inputs
        .iter()
        .flat_map(|input| preset_names.iter().map(move |name| (input, name)))
        .enumerate()
        .map(|(index, (input, name))| JobSpec {
            index,
            input: input.clone(),
            preset_name: name.clone(),
        })
        .collect()
}

/// Merge overrides into the base preset, name the output and build the
/// encoder invocation.
pub fn resolve_job(
    spec: &JobSpec,
    base: &Preset,
    overrides: &OverrideSet,
    encoder: &str,
    output_dir: &Path,
) -> Result<Job, JobError> {
    let preset = merge(base, overrides)?;
    let output = output_path(&spec.input, output_dir, &spec.preset_name, &preset.container);
    let command = build_command(encoder, &spec.input, &output, &preset)?;

    Ok(Job {
        spec: spec.clone(),
        preset,
        output,
        command,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobOutcome {
    Success,
    Failure { exit_code: i32, reason: String },
}

impl JobOutcome {
    pub fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            JobOutcome::Success
        } else {
            JobOutcome::Failure {
                exit_code: code,
                reason: format!("encoder exited with {}", code),
            }
        }
    }

    pub fn from_error(err: &JobError) -> Self {
        JobOutcome::Failure {
            exit_code: err.exit_code(),
            reason: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success)
    }
}

/// Entry in the batch outcome log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub index: usize,
    pub input: PathBuf,
    pub preset_name: String,
    pub output: Option<PathBuf>,
    /// Rendered command line, absent when the job failed to resolve.
    pub command: Option<String>,
    pub outcome: JobOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Append-only outcome log for a run, reduced to one exit code at the end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    records: Vec<JobRecord>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: JobRecord) {
        self.records.push(record);
    }

    /// Records in schedule order.
    pub fn records(&self) -> Vec<&JobRecord> {
        let mut sorted: Vec<&JobRecord> = self.records.iter().collect();
        sorted.sort_by_key(|r| r.index);
        sorted
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// 0 when every job succeeded, otherwise the exit code of the last
    /// failing job in schedule order.
    pub fn exit_code(&self) -> i32 {
        self.records()
            .into_iter()
            .filter_map(|r| match &r.outcome {
                JobOutcome::Failure { exit_code, .. } => Some(*exit_code),
                JobOutcome::Success => None,
            })
            .last()
            .unwrap_or(0)
    }

    /// Write the outcome log as pretty JSON.
    pub fn write_report(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let mut ordered = self.clone();
        ordered.records.sort_by_key(|r| r.index);
        let json = serde_json::to_string_pretty(&ordered)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::{EncodeMode, Strategy};

    fn record(index: usize, outcome: JobOutcome) -> JobRecord {
        let now = Utc::now();
        JobRecord {
            index,
            input: PathBuf::from(format!("clip{}.mp4", index)),
            preset_name: "reel".to_string(),
            output: None,
            command: None,
            outcome,
            started_at: now,
            finished_at: now,
        }
    }

    #[test]
    fn test_enumerate_cross_product_order() {
        let inputs = vec![PathBuf::from("a.mp4"), PathBuf::from("b.mp4")];
        let names = vec!["p".to_string(), "q".to_string(), "r".to_string()];
        let jobs = enumerate_jobs(&inputs, &names);

        assert_eq!(jobs.len(), 6);
        let pairs: Vec<(&str, &str)> = jobs
            .iter()
            .map(|j| (j.input.to_str().unwrap(), j.preset_name.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("a.mp4", "p"),
                ("a.mp4", "q"),
                ("a.mp4", "r"),
                ("b.mp4", "p"),
                ("b.mp4", "q"),
                ("b.mp4", "r"),
            ]
        );
        assert!(jobs.iter().enumerate().all(|(i, j)| j.index == i));
    }

    #[test]
    fn test_resolve_job_reel_example() {
        let mut base = Preset::new(1080, 1920);
        base.strategy = Strategy::Cover;
        base.encode.mode = EncodeMode::Crf;
        base.encode.crf = 20;

        let spec = JobSpec {
            index: 0,
            input: PathBuf::from("clip.mp4"),
            preset_name: "instagram_reel".to_string(),
        };
        let job = resolve_job(
            &spec,
            &base,
            &OverrideSet::default(),
            "ffmpeg",
            Path::new("outputs"),
        )
        .unwrap();

        assert_eq!(job.output, PathBuf::from("outputs/clip_instagram_reel.mp4"));
        assert_eq!(job.preset, base);
        assert_eq!(job.command.output(), Some("outputs/clip_instagram_reel.mp4"));
    }

    #[test]
    fn test_resolve_job_propagates_override_error() {
        let spec = JobSpec {
            index: 0,
            input: PathBuf::from("clip.mp4"),
            preset_name: "p".to_string(),
        };
        let overrides = OverrideSet {
            fps: Some("fast".into()),
            ..Default::default()
        };
        let err = resolve_job(&spec, &Preset::new(640, 360), &overrides, "ffmpeg", Path::new("o"))
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidOverride { field: "fps", .. }));
    }

    #[test]
    fn test_outcome_from_exit_code() {
        assert_eq!(JobOutcome::from_exit_code(0), JobOutcome::Success);
        assert!(matches!(
            JobOutcome::from_exit_code(2),
            JobOutcome::Failure { exit_code: 2, .. }
        ));
    }

    #[test]
    fn test_exit_code_all_success() {
        let mut result = BatchResult::new();
        result.push(record(0, JobOutcome::Success));
        result.push(record(1, JobOutcome::Success));
        assert_eq!(result.exit_code(), 0);
        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.failed(), 0);
    }

    #[test]
    fn test_exit_code_last_failure_in_schedule_order() {
        let mut result = BatchResult::new();
        // pushed out of order, as a worker pool would
        result.push(record(2, JobOutcome::from_exit_code(7)));
        result.push(record(0, JobOutcome::from_exit_code(3)));
        result.push(record(1, JobOutcome::Success));
        result.push(record(3, JobOutcome::Success));

        assert_eq!(result.exit_code(), 7);
        assert_eq!(result.failed(), 2);
        let order: Vec<usize> = result.records().iter().map(|r| r.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_result_exit_code() {
        assert_eq!(BatchResult::new().exit_code(), 0);
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reports/run.json");

        let mut result = BatchResult::new();
        result.push(record(1, JobOutcome::from_exit_code(1)));
        result.push(record(0, JobOutcome::Success));
        result.write_report(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let records = value["records"].as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["index"], 0);
        assert_eq!(records[0]["outcome"]["status"], "success");
        assert_eq!(records[1]["outcome"]["status"], "failure");
        assert_eq!(records[1]["outcome"]["exit_code"], 1);
    }
}
