use std::path::{Path, PathBuf};

/// `{stem}_{preset}.{container}`
pub fn output_name(stem: &str, preset_name: &str, container: &str) -> String {
    format!("{}_{}.{}", stem, preset_name, container)
}

/// Output path for one job. Jobs that share a stem and preset name map to
/// the same path; the later one overwrites the earlier output.
pub fn output_path(input: &Path, output_dir: &Path, preset_name: &str, container: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    output_dir.join(output_name(&stem, preset_name, container))
}
