use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::error::{JobError, SetupError};

/// Framing policy used to fit the source into the target frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Strategy {
    /// Scale up to fill the frame, crop the excess.
    #[default]
    Cover,
    /// Scale down to fit inside the frame, pad the remainder.
    Contain,
}

/// Rate control mode handed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum EncodeMode {
    #[default]
    Bitrate,
    Crf,
}

impl FromStr for Strategy {
    type Err = JobError;

    /// Exact match only; `"Cover"` and `" cover"` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cover" => Ok(Strategy::Cover),
            "contain" => Ok(Strategy::Contain),
            _ => Err(JobError::InvalidStrategy(s.to_string())),
        }
    }
}

impl TryFrom<String> for Strategy {
    type Error = JobError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Cover => write!(f, "cover"),
            Strategy::Contain => write!(f, "contain"),
        }
    }
}

impl FromStr for EncodeMode {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bitrate" => Ok(EncodeMode::Bitrate),
            "crf" => Ok(EncodeMode::Crf),
            _ => Err(JobError::InvalidEncodeMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for EncodeMode {
    type Error = JobError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for EncodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeMode::Bitrate => write!(f, "bitrate"),
            EncodeMode::Crf => write!(f, "crf"),
        }
    }
}

/// Rate control settings. `mode` decides whether `video_bitrate` or `crf`
/// is authoritative; the other field is carried but never emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeSettings {
    pub mode: EncodeMode,
    pub video_bitrate: String,
    pub crf: u8,
    #[serde(alias = "x264_preset")]
    pub encoder_preset: String,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            mode: EncodeMode::Bitrate,
            video_bitrate: "5000k".to_string(),
            crf: 20,
            encoder_preset: "medium".to_string(),
        }
    }
}

/// A named rendition target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default = "default_pad_color")]
    pub pad_color: String,
    #[serde(default = "default_video_codec", alias = "vcodec")]
    pub video_codec: String,
    #[serde(default = "default_pixel_format", alias = "pix_fmt")]
    pub pixel_format: String,
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
    #[serde(default = "default_container")]
    pub container: String,
    #[serde(default)]
    pub encode: EncodeSettings,
}

fn default_fps() -> u32 {
    30
}

fn default_pad_color() -> String {
    "black".to_string()
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_pixel_format() -> String {
    "yuv420p".to_string()
}

fn default_profile() -> String {
    "high".to_string()
}

fn default_audio_bitrate() -> String {
    "128k".to_string()
}

fn default_container() -> String {
    "mp4".to_string()
}

impl Preset {
    /// Preset with every optional field at its default.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fps: default_fps(),
            strategy: Strategy::default(),
            pad_color: default_pad_color(),
            video_codec: default_video_codec(),
            pixel_format: default_pixel_format(),
            profile: default_profile(),
            audio_bitrate: default_audio_bitrate(),
            container: default_container(),
            encode: EncodeSettings::default(),
        }
    }
}

/// Structural checks only. Codec, profile and pixel format strings are left
/// for the encoder to reject.
pub fn validate_preset(name: &str, preset: &Preset) -> Result<(), SetupError> {
    let invalid = |reason: &str| SetupError::InvalidPreset {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if preset.width == 0 {
        return Err(invalid("width must be positive"));
    }
    if preset.height == 0 {
        return Err(invalid("height must be positive"));
    }
    if preset.fps == 0 {
        return Err(invalid("fps must be positive"));
    }
    if preset.container.trim().is_empty() {
        return Err(invalid("container cannot be empty"));
    }

    Ok(())
}

/// Source format of a preset file, picked from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetFormat {
    Json,
    Toml,
}

impl PresetFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .as_deref()
        {
            Some("toml") => PresetFormat::Toml,
            _ => PresetFormat::Json,
        }
    }
}

/// Immutable map of preset name to validated preset, loaded once per run.
#[derive(Debug, Clone)]
pub struct PresetStore {
    source: PathBuf,
    presets: BTreeMap<String, Preset>,
}

impl PresetStore {
    pub fn load(path: &Path) -> Result<Self, SetupError> {
        if !path.exists() {
            return Err(SetupError::ConfigNotFound(path.to_path_buf()));
        }

        let contents =
            std::fs::read_to_string(path).map_err(|e| SetupError::ConfigParseError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Self::parse(&contents, PresetFormat::from_path(path), path)
    }

    pub fn parse(contents: &str, format: PresetFormat, source: &Path) -> Result<Self, SetupError> {
        let parse_error = |reason: String| SetupError::ConfigParseError {
            path: source.to_path_buf(),
            reason,
        };

        let presets: BTreeMap<String, Preset> = match format {
            PresetFormat::Json => {
                serde_json::from_str(contents).map_err(|e| parse_error(e.to_string()))?
            }
            PresetFormat::Toml => toml::from_str(contents).map_err(|e| parse_error(e.to_string()))?,
        };

        for (name, preset) in &presets {
            validate_preset(name, preset)?;
        }

        debug!("Loaded {} presets from {}", presets.len(), source.display());
        Ok(Self {
            source: source.to_path_buf(),
            presets,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn get(&self, name: &str) -> Result<&Preset, SetupError> {
        self.presets
            .get(name)
            .ok_or_else(|| SetupError::UnknownPreset {
                path: self.source.clone(),
                names: vec![name.to_string()],
            })
    }

    /// Fails with every requested name that is missing, not just the first.
    pub fn ensure_known(&self, names: &[String]) -> Result<(), SetupError> {
        let missing: Vec<String> = names
            .iter()
            .filter(|n| !self.presets.contains_key(n.as_str()))
            .cloned()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SetupError::UnknownPreset {
                path: self.source.clone(),
                names: missing,
            })
        }
    }
}

/// Split a comma separated preset list, dropping blanks.
pub fn parse_preset_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
