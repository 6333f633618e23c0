// Export modules for library usage
pub mod analyzers;
pub mod assist;
pub mod classifier;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod errors;
pub mod fixers;
pub mod io;
pub mod orchestrator;
pub mod pipeline;
pub mod run_log;
pub mod safety;
pub mod usage;

// Re-export commonly used types
pub use crate::core::{Category, Classification, Issue, Language};

pub use crate::classifier::{RuleClassifier, Triage};

pub use crate::config::{load_config, LintpilotConfig};

pub use crate::errors::{Error, Result};

pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};

pub use crate::orchestrator::{FixOrchestrator, FixOutcome, FixPlan, RunSummary};

pub use crate::pipeline::{Pipeline, RunReport};

pub use crate::safety::SafetyChecker;

pub use crate::usage::UsageTracker;
