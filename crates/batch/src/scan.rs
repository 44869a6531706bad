use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::SetupError;

/// Allowed video file extensions
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".m4v", ".mkv", ".avi", ".webm"];

/// Resolve the input argument to the list of files to render.
///
/// A file is used as-is regardless of extension. A directory is walked
/// recursively and only files with a video extension are kept, sorted by
/// path. An empty directory result is an error.
pub fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>, SetupError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    if !input.is_dir() {
        return Err(SetupError::InputNotFound(input.to_path_buf()));
    }

    debug!("Scanning input directory: {}", input.display());
    let mut files = Vec::new();

    for entry in WalkDir::new(input).follow_links(true) {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                if is_video_file(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            Err(e) => {
                // Log warning but continue scanning
                warn!("Error accessing directory entry: {}", e);
            }
        }
    }

    if files.is_empty() {
        warn!("No videos found in {}", input.display());
        return Err(SetupError::NoInputs(input.to_path_buf()));
    }

    files.sort();
    debug!("Found {} candidate video files", files.len());
    Ok(files)
}

/// Check if a file has a video extension
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = format!(".{}", ext.to_lowercase());
            VIDEO_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}
