use reframe_batch::error::SetupError;
use reframe_batch::startup::{check_encoder, parse_version};

#[test]
fn test_missing_encoder_is_setup_error() {
    let err = check_encoder("reframe-test-no-such-encoder").unwrap_err();
    match err {
        SetupError::EncoderNotFound { binary, .. } => {
            assert_eq!(binary, "reframe-test-no-such-encoder");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_version_banner_parsing() {
    let banner = "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023 the FFmpeg developers\n\
                  built with gcc 13 (Ubuntu 13.2.0-23ubuntu3)\n\
                  libavutil      58. 29.100 / 58. 29.100";
    assert_eq!(parse_version(banner), Some((6, 1, 1)));
}

#[cfg(unix)]
#[test]
fn test_encoder_that_exits_nonzero() {
    // `false -version` runs but exits 1
    let err = check_encoder("false").unwrap_err();
    assert!(matches!(err, SetupError::EncoderNotFound { .. }));
}
