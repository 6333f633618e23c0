use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use tracing::info;

use crate::analyzers::default_analyzers;
use crate::assist;
use crate::config::load_config;
use crate::io::output::{create_writer, OutputFormat};
use crate::io::RealFileSystem;
use crate::pipeline::Pipeline;
use crate::run_log::{RunLogger, RunMode};
use crate::usage::{FileUsageStore, UsageTracker};

pub struct RunConfig {
    pub repo: PathBuf,
    pub mode: RunMode,
    pub ai: bool,
    pub rules: Vec<String>,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
    pub state_dir: Option<PathBuf>,
}

/// Load configuration, run the pipeline and print the report.
///
/// Deferred issues and rolled-back files are part of a successful run; only
/// the fatal error kinds come back as `Err`.
pub fn run_repository(run: RunConfig, cancel: &AtomicBool) -> Result<()> {
    let mut config = load_config(&run.repo, run.config.as_deref())?;
    if run.ai {
        config.ai.enabled = true;
    }

    let state_dir = config.state.resolve_dir(run.state_dir.as_deref());
    info!(state_dir = %state_dir.display(), "using state directory");
    let usage = UsageTracker::new(Box::new(FileUsageStore::in_dir(&state_dir)), &config.usage);
    let fs = RealFileSystem::new();

    let pipeline = Pipeline::new(&config, &fs, default_analyzers(&run.repo), usage)
        .with_assistant(assist::from_config(&config.ai))
        .with_run_log(RunLogger::in_dir(&state_dir))
        .with_cancellation(cancel);

    let report = pipeline.run(&run.repo, run.mode, &run.rules)?;
    create_writer(run.format).write_report(&report)?;
    Ok(())
}
