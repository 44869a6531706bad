use std::str::FromStr;

use crate::error::JobError;
use crate::preset::{EncodeMode, Preset, Strategy};

/// Per-invocation overrides, kept as the raw strings the user typed.
///
/// Values are parsed during [`merge`], so a malformed override fails each
/// job it touches instead of aborting the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    pub width: Option<String>,
    pub height: Option<String>,
    pub fps: Option<String>,
    pub strategy: Option<String>,
    pub mode: Option<String>,
    pub video_bitrate: Option<String>,
    pub crf: Option<String>,
    pub encoder_preset: Option<String>,
    pub audio_bitrate: Option<String>,
}

impl OverrideSet {
    pub fn is_empty(&self) -> bool {
        *self == OverrideSet::default()
    }
}

fn parse_positive(field: &'static str, raw: &str) -> Result<u32, JobError> {
    match raw.trim().parse::<u32>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(JobError::InvalidOverride {
            field,
            value: raw.to_string(),
        }),
    }
}

fn parse_crf(raw: &str) -> Result<u8, JobError> {
    raw.trim()
        .parse::<u8>()
        .map_err(|_| JobError::InvalidOverride {
            field: "crf",
            value: raw.to_string(),
        })
}

fn non_empty(field: &'static str, raw: &str) -> Result<String, JobError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(JobError::InvalidOverride {
            field,
            value: raw.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Resolve a job's preset: a fresh copy of `base` with every present
/// override applied. `base` is never touched.
///
/// A `crf` override always forces `mode = crf`, even if `mode` was
/// overridden to `bitrate` in the same set.
pub fn merge(base: &Preset, overrides: &OverrideSet) -> Result<Preset, JobError> {
    let mut out = base.clone();

    if let Some(raw) = &overrides.width {
        out.width = parse_positive("width", raw)?;
    }
    if let Some(raw) = &overrides.height {
        out.height = parse_positive("height", raw)?;
    }
    if let Some(raw) = &overrides.fps {
        out.fps = parse_positive("fps", raw)?;
    }
    if let Some(raw) = &overrides.strategy {
        out.strategy = Strategy::from_str(raw)?;
    }
    if let Some(raw) = &overrides.audio_bitrate {
        out.audio_bitrate = non_empty("audio_bitrate", raw)?;
    }

    if let Some(raw) = &overrides.mode {
        out.encode.mode = EncodeMode::from_str(raw)?;
    }
    if let Some(raw) = &overrides.video_bitrate {
        out.encode.video_bitrate = non_empty("video_bitrate", raw)?;
    }
    if let Some(raw) = &overrides.encoder_preset {
        out.encode.encoder_preset = non_empty("encoder_preset", raw)?;
    }
    if let Some(raw) = &overrides.crf {
        out.encode.crf = parse_crf(raw)?;
        out.encode.mode = EncodeMode::Crf;
    }

    Ok(out)
}
