use proptest::prelude::*;
use reframe_batch::error::SetupError;
use reframe_batch::scan::{collect_inputs, is_video_file};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// *For any* directory structure, scanning should discover every file with
/// an allowed video extension in every subdirectory, sorted, and nothing else
#[test]
fn property_recursive_file_discovery() {
    proptest!(|(
        video_files in prop::collection::btree_set(video_file_name(), 1..20),
        non_video_files in prop::collection::btree_set(non_video_file_name(), 0..10),
        subdirs in prop::collection::btree_set(subdir_name(), 0..5)
    )| {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let mut expected_paths = BTreeSet::new();

        for (i, name) in video_files.iter().enumerate() {
            let path = root.join(name);
            fs::write(&path, format!("video content {}", i)).unwrap();
            expected_paths.insert(path);
        }

        // Non-video files should be ignored
        for name in &non_video_files {
            fs::write(root.join(name), "non-video content").unwrap();
        }

        for (dir_idx, subdir) in subdirs.iter().enumerate() {
            let subdir_path = root.join(subdir);
            fs::create_dir_all(&subdir_path).unwrap();

            for name in video_files.iter().take(3) {
                let path = subdir_path.join(format!("sub_{}_{}", dir_idx, name));
                fs::write(&path, "subdir video").unwrap();
                expected_paths.insert(path);
            }
        }

        let results = collect_inputs(root).unwrap();

        let expected: Vec<PathBuf> = expected_paths.into_iter().collect();
        prop_assert_eq!(results, expected);
    });
}

/// Generate valid video file names with allowed extensions
fn video_file_name() -> impl Strategy<Value = String> {
    let extensions = vec![".mkv", ".mp4", ".avi", ".mov", ".m4v", ".webm"];
    ("[a-z0-9_-]{3,20}", prop::sample::select(extensions))
        .prop_map(|(name, ext)| format!("{}{}", name, ext))
}

/// Generate non-video file names
fn non_video_file_name() -> impl Strategy<Value = String> {
    let extensions = vec![".txt", ".jpg", ".png", ".nfo", ".srt", ".ts"];
    ("[a-z0-9_-]{3,20}", prop::sample::select(extensions))
        .prop_map(|(name, ext)| format!("{}{}", name, ext))
}

/// Subdirectory names never collide with file names (no dot)
fn subdir_name() -> impl Strategy<Value = String> {
    "dir_[a-z0-9]{3,12}".prop_map(|s| s)
}

#[test]
fn property_video_file_extension_detection() {
    proptest!(|(
        filename in "[a-zA-Z0-9_-]{3,20}",
        ext in prop::sample::select(vec![
            ".mkv", ".mp4", ".avi", ".mov", ".m4v", ".webm",
            ".MKV", ".MP4", ".WebM", // Test case insensitivity
        ])
    )| {
        let path = PathBuf::from(format!("{}{}", filename, ext));
        prop_assert!(is_video_file(&path),
            "File with extension {} should be recognized as video", ext);
    });
}

#[test]
fn property_non_video_file_rejection() {
    proptest!(|(
        filename in "[a-zA-Z0-9_-]{3,20}",
        ext in prop::sample::select(vec![
            ".txt", ".jpg", ".png", ".nfo", ".srt", ".sub", ".json", ".m2ts"
        ])
    )| {
        let path = PathBuf::from(format!("{}{}", filename, ext));
        prop_assert!(!is_video_file(&path),
            "File with extension {} should not be recognized as video", ext);
    });
}

#[test]
fn test_deeply_nested_directories() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    // root/a/b/c/d/video.mkv
    let nested_path = root.join("a").join("b").join("c").join("d");
    fs::create_dir_all(&nested_path).unwrap();

    let video_path = nested_path.join("video.mkv");
    fs::write(&video_path, "nested video").unwrap();

    assert_eq!(collect_inputs(root).unwrap(), vec![video_path]);
}

#[test]
fn test_directory_with_only_other_files_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("nested")).unwrap();
    fs::write(root.join("nested/cover.jpg"), "img").unwrap();

    match collect_inputs(root) {
        Err(SetupError::NoInputs(path)) => assert_eq!(path, root),
        other => panic!("expected NoInputs, got {:?}", other),
    }
}

#[test]
fn test_nonexistent_input_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("does_not_exist.mp4");

    assert!(matches!(
        collect_inputs(&missing),
        Err(SetupError::InputNotFound(_))
    ));
}
