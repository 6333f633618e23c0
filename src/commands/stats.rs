use anyhow::Result;
use std::path::PathBuf;

use crate::config::StateConfig;
use crate::io::output::{create_writer, OutputFormat};
use crate::run_log::{RunLogger, RunStats};

/// Print aggregate statistics over the run log in the state directory.
pub fn show_stats(state_dir: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let dir = StateConfig::default().resolve_dir(state_dir.as_deref());
    let (entries, skipped) = RunLogger::in_dir(&dir).read_entries()?;
    let stats = RunStats::from_entries(&entries);
    create_writer(format).write_stats(&stats, skipped)?;
    Ok(())
}
