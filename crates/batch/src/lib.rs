// Batch rendition library modules

pub mod batch;
pub mod command;
pub mod config;
pub mod encode;
pub mod error;
pub mod executor;
pub mod filter;
pub mod jobs;
pub mod naming;
pub mod overrides;
pub mod preset;
pub mod scan;
pub mod startup;

// Re-export commonly used types
pub use batch::run_batch;
pub use config::BatchOptions;
pub use error::{JobError, SetupError};
pub use jobs::{BatchResult, Job, JobOutcome};
pub use overrides::OverrideSet;
pub use preset::{Preset, PresetStore};
