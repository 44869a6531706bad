// Full encoder invocation for one job

use std::path::Path;

use crate::encode::build_rate_control_args;
use crate::error::JobError;
use crate::filter::build_filter;
use crate::preset::Preset;

/// Audio is always re-encoded to AAC.
pub const AUDIO_CODEC: &str = "aac";

/// A program plus its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EncoderCommand {
    /// Shell-quoted single line, identical for dry runs and real runs.
    pub fn render(&self) -> String {
        let parts = std::iter::once(self.program.as_str()).chain(self.args.iter().map(|a| a.as_str()));
        shlex::try_join(parts.clone()).unwrap_or_else(|_| parts.collect::<Vec<_>>().join(" "))
    }

    /// The last argument is always the output path.
    pub fn output(&self) -> Option<&str> {
        self.args.last().map(|s| s.as_str())
    }
}

/// Assemble the encoder invocation.
///
/// Argument order matters to the encoder (later flags win for the same
/// key) and must stay: overwrite, input, filter, frame rate, video codec,
/// profile, pixel format, rate control, faststart, audio codec, audio
/// bitrate, output.
pub fn build_command(
    program: &str,
    input: &Path,
    output: &Path,
    preset: &Preset,
) -> Result<EncoderCommand, JobError> {
    let filter = build_filter(preset.width, preset.height, preset.strategy, &preset.pad_color);
    let rate_control = build_rate_control_args(&preset.encode)?;

    let mut args = vec!["-y".to_string()];

    args.push("-i".to_string());
    args.push(input.to_string_lossy().to_string());

    args.push("-vf".to_string());
    args.push(filter);

    args.push("-r".to_string());
    args.push(preset.fps.to_string());

    args.push("-c:v".to_string());
    args.push(preset.video_codec.clone());
    args.push("-profile:v".to_string());
    args.push(preset.profile.clone());
    args.push("-pix_fmt".to_string());
    args.push(preset.pixel_format.clone());

    args.extend(rate_control);

    args.push("-movflags".to_string());
    args.push("+faststart".to_string());

    args.push("-c:a".to_string());
    args.push(AUDIO_CODEC.to_string());
    args.push("-b:a".to_string());
    args.push(preset.audio_bitrate.clone());

    args.push(output.to_string_lossy().to_string());

    Ok(EncoderCommand {
        program: program.to_string(),
        args,
    })
}
