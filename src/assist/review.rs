//! Per-file AI review of findings that are left for a human.
//!
//! Files are taken from the review queue, best candidates first, up to a
//! per-run cap. Every request goes through the [`UsageTracker`]; once the
//! provider's window is full the remaining files are not sent.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, info_span};

use super::{FixAssistant, ReviewRequest};
use crate::classifier::ClassifiedIssue;
use crate::io::FileSystem;
use crate::usage::UsageTracker;

/// Characters of file content sent with a review request.
pub const MAX_REVIEW_CHARS: usize = 2000;
const MAX_FINDINGS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReviewOutcome {
    Suggestions { text: String },
    RateLimited { provider: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReview {
    pub file_path: PathBuf,
    pub findings: usize,
    #[serde(flatten)]
    pub outcome: ReviewOutcome,
}

pub struct SemanticReview<'a> {
    assistant: &'a dyn FixAssistant,
    usage: &'a UsageTracker,
    fs: &'a dyn FileSystem,
    max_files: usize,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> SemanticReview<'a> {
    pub fn new(
        assistant: &'a dyn FixAssistant,
        usage: &'a UsageTracker,
        fs: &'a dyn FileSystem,
        max_files: usize,
    ) -> Self {
        Self {
            assistant,
            usage,
            fs,
            max_files,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn run(&self, queue: &[ClassifiedIssue]) -> Vec<FileReview> {
        let provider = self.assistant.provider().to_string();
        let mut reviews = Vec::new();

        for (file_path, findings) in files_by_priority(queue).into_iter().take(self.max_files) {
            if self.cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                info!("cancelled; review stopped");
                break;
            }
            let _span = info_span!("review_file", path = %file_path.display()).entered();
            let finding_count = findings.len();
            let review = |outcome| FileReview {
                file_path: file_path.clone(),
                findings: finding_count,
                outcome,
            };

            let content = match self.fs.read_to_string(&file_path) {
                Ok(content) => content,
                Err(e) => {
                    reviews.push(review(ReviewOutcome::Failed {
                        error: format!("unreadable: {e}"),
                    }));
                    continue;
                }
            };

            if !self.usage.can_proceed(&provider) || !self.usage.record_call(&provider) {
                debug!(provider, "review budget spent");
                reviews.push(review(ReviewOutcome::RateLimited {
                    provider: provider.clone(),
                }));
                break;
            }

            let request = ReviewRequest {
                file_path: file_path.clone(),
                language: findings[0].issue.language(),
                code: content.chars().take(MAX_REVIEW_CHARS).collect(),
                findings: findings
                    .iter()
                    .take(MAX_FINDINGS)
                    .map(|classified| {
                        let issue = &classified.issue;
                        format!("line {} {}: {}", issue.line_number(), issue.rule_code(), issue.message())
                    })
                    .collect(),
            };
            let outcome = match self.assistant.review(&request) {
                Ok(text) => ReviewOutcome::Suggestions { text },
                Err(e) => {
                    debug!(provider, "review failed: {e}");
                    ReviewOutcome::Failed { error: e.to_string() }
                }
            };
            reviews.push(review(outcome));
        }
        reviews
    }
}

/// Group the queue by file, keeping the order in which files first appear
/// and the queue order within each file.
fn files_by_priority(queue: &[ClassifiedIssue]) -> Vec<(PathBuf, Vec<&ClassifiedIssue>)> {
    let mut files: Vec<(PathBuf, Vec<&ClassifiedIssue>)> = Vec::new();
    for classified in queue {
        let path = classified.issue.file_path();
        match files.iter_mut().find(|(existing, _)| existing.as_path() == path) {
            Some((_, findings)) => findings.push(classified),
            None => files.push((path.to_path_buf(), vec![classified])),
        }
    }
    files
}
