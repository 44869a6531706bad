use regex::Regex;
use std::process::Command;
use std::sync::OnceLock;
use tracing::warn;

use crate::error::SetupError;

/// What `<encoder> -version` reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderInfo {
    pub binary: String,
    /// `None` for builds without a dotted release number (git snapshots).
    pub version: Option<(u32, u32, u32)>,
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"version[^\d]*(\d+)\.(\d+)(?:\.(\d+))?").expect("version pattern is valid")
    })
}

/// Parse output like "ffmpeg version 6.1.1" or "ffmpeg version n7.0".
pub fn parse_version(output: &str) -> Option<(u32, u32, u32)> {
    let caps = version_regex().captures(output)?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    let patch = match caps.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    Some((major, minor, patch))
}

/// Confirm the encoder binary can be executed.
pub fn check_encoder(binary: &str) -> Result<EncoderInfo, SetupError> {
    let not_found = |reason: String| SetupError::EncoderNotFound {
        binary: binary.to_string(),
        reason,
    };

    let output = Command::new(binary)
        .arg("-version")
        .output()
        .map_err(|e| not_found(e.to_string()))?;

    if !output.status.success() {
        return Err(not_found(format!(
            "'{} -version' exited with {:?}",
            binary,
            output.status.code()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = parse_version(&stdout);
    if version.is_none() {
        warn!("Could not parse a release number from '{} -version'", binary);
    }

    Ok(EncoderInfo {
        binary: binary.to_string(),
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_version_parsing(
            major in 0u32..20,
            minor in 0u32..100,
            patch in 0u32..100,
        ) {
            let output = format!("ffmpeg version {}.{}.{} Copyright (c) 2000-2024", major, minor, patch);
            prop_assert_eq!(parse_version(&output), Some((major, minor, patch)));
        }
    }

    #[test]
    fn test_version_variants() {
        assert_eq!(parse_version("ffmpeg version n7.0 Copyright"), Some((7, 0, 0)));
        assert_eq!(
            parse_version("ffmpeg version 6.1.1-3ubuntu5 Copyright"),
            Some((6, 1, 1))
        );
        assert_eq!(parse_version("ffmpeg version N-112345-gabcdef"), None);
        assert_eq!(parse_version(""), None);
    }

    #[test]
    fn test_missing_binary() {
        let err = check_encoder("definitely-not-an-encoder-binary-4821").unwrap_err();
        assert!(matches!(err, SetupError::EncoderNotFound { .. }));
    }
}
