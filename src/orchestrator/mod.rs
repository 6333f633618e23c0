//! Fix orchestration: plan SAFE issues per file, apply them in memory,
//! check the result and commit each file all-or-nothing.
//!
//! Expected conditions (a rate limit, a missing assistant, a rejected file)
//! are [`FixOutcome`] values, never errors. One file's failure never stops
//! the run for the others.

mod execute;
mod plan;
mod summary;

pub use execute::{ExecutionMode, FixOrchestrator};
pub use plan::{FilePlan, FixPlan, PlanOptions, PlanSummary, PlannedIssue};
pub use summary::{
    DeferReason, DeferredIssue, FileReport, FixOutcome, FixResult, IssueOutcome, RunSummary,
};
