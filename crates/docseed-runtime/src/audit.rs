use crate::report::DirectiveOutcome;
use tracing::Level;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub run_id: Uuid,
    pub plan: String,
    pub ordinal: usize,
    pub directive: String,
    pub preview: bool,
    pub outcome: DirectiveOutcome,
}

/// Receives one event per directive outcome.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Emits each event as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    /// Level an outcome is logged at: skips warn, failures are errors.
    pub fn level(outcome: &DirectiveOutcome) -> Level {
        match outcome {
            DirectiveOutcome::Created => Level::INFO,
            DirectiveOutcome::Skipped => Level::WARN,
            DirectiveOutcome::Failed(_) => Level::ERROR,
        }
    }
}

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let reason = match &event.outcome {
            DirectiveOutcome::Created => "created",
            DirectiveOutcome::Skipped => "skipped (already present)",
            DirectiveOutcome::Failed(reason) => reason.as_str(),
        };
        match Self::level(&event.outcome) {
            Level::ERROR => tracing::error!(
                run_id = %event.run_id,
                plan = %event.plan,
                ordinal = event.ordinal,
                preview = event.preview,
                reason = %reason,
                "{} -> failed",
                event.directive
            ),
            Level::WARN => tracing::warn!(
                run_id = %event.run_id,
                plan = %event.plan,
                ordinal = event.ordinal,
                preview = event.preview,
                "{} -> {}",
                event.directive,
                reason
            ),
            _ => tracing::info!(
                run_id = %event.run_id,
                plan = %event.plan,
                ordinal = event.ordinal,
                preview = event.preview,
                "{} -> {}",
                event.directive,
                reason
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_warn_and_failures_error() {
        assert_eq!(TracingAuditSink::level(&DirectiveOutcome::Created), Level::INFO);
        assert_eq!(TracingAuditSink::level(&DirectiveOutcome::Skipped), Level::WARN);
        assert_eq!(
            TracingAuditSink::level(&DirectiveOutcome::Failed("denied".to_string())),
            Level::ERROR
        );
    }
}
