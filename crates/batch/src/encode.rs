// Rate control arguments for the two encode modes

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::error::JobError;
use crate::preset::{EncodeMode, EncodeSettings};

/// Unit suffix carried by a bitrate string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitrateUnit {
    /// No suffix, bits per second.
    Bits,
    /// `k` or `K`.
    Kilo(char),
    /// `m` or `M`.
    Mega(char),
}

impl BitrateUnit {
    fn suffix(&self) -> Option<char> {
        match self {
            BitrateUnit::Bits => None,
            BitrateUnit::Kilo(c) | BitrateUnit::Mega(c) => Some(*c),
        }
    }
}

/// A bitrate such as `6000k`: positive integer plus an optional unit suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitrate {
    pub value: u64,
    pub unit: BitrateUnit,
}

fn bitrate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)([A-Za-z]?)$").expect("bitrate pattern is valid"))
}

impl Bitrate {
    pub fn parse(raw: &str) -> Result<Self, JobError> {
        let invalid = |reason: &str| JobError::InvalidBitrate {
            value: raw.to_string(),
            reason: reason.to_string(),
        };

        let caps = bitrate_regex()
            .captures(raw.trim())
            .ok_or_else(|| invalid("expected a whole number with optional k/M suffix"))?;

        let value: u64 = caps[1]
            .parse()
            .map_err(|_| invalid("number is out of range"))?;
        if value == 0 {
            return Err(invalid("must be positive"));
        }

        let unit = match caps[2].chars().next() {
            None => BitrateUnit::Bits,
            Some(c @ ('k' | 'K')) => BitrateUnit::Kilo(c),
            Some(c @ ('m' | 'M')) => BitrateUnit::Mega(c),
            Some(_) => return Err(invalid("unsupported unit suffix, use k or M")),
        };

        Ok(Self { value, unit })
    }

    /// Buffer size for bitrate mode: twice the target in the same unit.
    pub fn buffer_size(&self) -> Result<Bitrate, JobError> {
        let value = self
            .value
            .checked_mul(2)
            .ok_or_else(|| JobError::InvalidBitrate {
                value: self.to_string(),
                reason: "buffer size overflows".to_string(),
            })?;
        Ok(Bitrate {
            value,
            unit: self.unit,
        })
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit.suffix() {
            Some(c) => write!(f, "{}{}", self.value, c),
            None => write!(f, "{}", self.value),
        }
    }
}

/// Build the rate control arguments for a resolved encode record.
///
/// The speed/quality tier always comes first, followed by either the VBV
/// triple (bitrate mode) or the quality factor with bitrate disabled
/// (crf mode). The two modes never share flags.
pub fn build_rate_control_args(encode: &EncodeSettings) -> Result<Vec<String>, JobError> {
    let mut args = vec!["-preset".to_string(), encode.encoder_preset.clone()];

    match encode.mode {
        EncodeMode::Bitrate => {
            let target = Bitrate::parse(&encode.video_bitrate)?;
            let bufsize = target.buffer_size()?;
            let target = target.to_string();
            args.push("-b:v".to_string());
            args.push(target.clone());
            args.push("-maxrate".to_string());
            args.push(target);
            args.push("-bufsize".to_string());
            args.push(bufsize.to_string());
        }
        EncodeMode::Crf => {
            args.push("-crf".to_string());
            args.push(encode.crf.to_string());
            args.push("-b:v".to_string());
            args.push("0".to_string());
        }
    }

    Ok(args)
}
