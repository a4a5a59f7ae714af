//! Per-run provisioning reports.

use crate::handle::FailureKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Whether the executor mutates the database or only inspects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyMode {
    #[default]
    Apply,
    /// Classify directives without creating anything.
    Preview,
}

/// Outcome of one directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DirectiveOutcome {
    Created,
    Skipped,
    Failed(String),
}

impl DirectiveOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, DirectiveOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    /// 1-based position in the plan.
    pub ordinal: usize,
    pub kind: String,
    pub directive: String,
    pub outcome: DirectiveOutcome,
}

/// Result of applying (or previewing) a plan.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub run_id: Uuid,
    pub plan: String,
    pub mode: ApplyMode,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new(plan: impl Into<String>, mode: ApplyMode) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            plan: plan.into(),
            mode,
            started_at: Utc::now(),
            finished_at: None,
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn outcomes(&self) -> Vec<&DirectiveOutcome> {
        self.entries.iter().map(|e| &e.outcome).collect()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, DirectiveOutcome::Created))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, DirectiveOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DirectiveOutcome::Failed(_)))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&DirectiveOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

/// A directive failed and the remaining plan was abandoned.
///
/// Directives applied before the failure stay applied.
#[derive(Debug, Error)]
#[error("directive #{ordinal} ({directive}) failed: {kind}: {message}")]
pub struct ProvisioningError {
    /// 1-based position of the failing directive.
    pub ordinal: usize,
    pub directive: String,
    pub kind: FailureKind,
    pub message: String,
    /// Outcomes up to and including the failed directive.
    pub report: Box<Report>,
}
