use crate::audit::{AuditEvent, AuditSink, TracingAuditSink};
use crate::handle::{DatabaseHandle, HandleError};
use crate::report::{ApplyMode, DirectiveOutcome, ProvisioningError, Report, ReportEntry};
use docseed_core::{IndexMatch, IndexSpec, ProvisioningDirective, ProvisioningPlan};
use std::collections::HashSet;

/// What happened to a directive that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Created,
    Skipped,
}

/// Applies provisioning plans against a [`DatabaseHandle`].
///
/// Directives run one at a time, in plan order, and the first fatal failure
/// stops the run. Nothing is rolled back.
///
/// The executor holds no state between runs, but running two plans at once
/// against overlapping databases is undefined: callers must serialize runs.
pub struct Executor<S: AuditSink = TracingAuditSink> {
    audit: S,
    mode: ApplyMode,
}

impl Executor<TracingAuditSink> {
    pub fn new() -> Self {
        Self::with_audit(TracingAuditSink)
    }
}

impl Default for Executor<TracingAuditSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: AuditSink> Executor<S> {
    pub fn with_audit(audit: S) -> Self {
        Self {
            audit,
            mode: ApplyMode::Apply,
        }
    }

    /// Switch between applying and previewing.
    pub fn with_mode(mut self, mode: ApplyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ApplyMode {
        self.mode
    }

    /// Apply every directive of `plan` in order.
    ///
    /// Returns the full report on success. On the first fatal failure returns
    /// a [`ProvisioningError`] carrying the partial report and the failing
    /// directive's ordinal.
    pub async fn apply<H>(
        &self,
        plan: &ProvisioningPlan,
        handle: &H,
    ) -> Result<Report, ProvisioningError>
    where
        H: DatabaseHandle + ?Sized,
    {
        let mut report = Report::new(plan.name(), self.mode);
        tracing::info!(
            run_id = %report.run_id,
            plan = plan.name(),
            directives = plan.len(),
            mode = ?self.mode,
            "Applying provisioning plan"
        );

        let mut preview = PreviewState::default();

        for (idx, directive) in plan.iter().enumerate() {
            let ordinal = idx + 1;
            let summary = directive.summary();

            let result = match self.mode {
                ApplyMode::Apply => apply_directive(directive, handle).await,
                ApplyMode::Preview => preview_directive(directive, handle, &mut preview).await,
            };

            let outcome = match &result {
                Ok(Applied::Created) => DirectiveOutcome::Created,
                Ok(Applied::Skipped) => DirectiveOutcome::Skipped,
                Err(e) => DirectiveOutcome::Failed(e.to_string()),
            };

            self.audit.record(AuditEvent {
                run_id: report.run_id,
                plan: plan.name().to_string(),
                ordinal,
                directive: summary.clone(),
                preview: self.mode == ApplyMode::Preview,
                outcome: outcome.clone(),
            });

            report.push(ReportEntry {
                ordinal,
                kind: directive.kind().to_string(),
                directive: summary.clone(),
                outcome,
            });

            if let Err(e) = result {
                report.finish();
                // AlreadyExists never reaches here; apply_directive absorbs it.
                let kind = e
                    .failure_kind()
                    .unwrap_or(crate::handle::FailureKind::Other);
                return Err(ProvisioningError {
                    ordinal,
                    directive: summary,
                    kind,
                    message: e.message().to_string(),
                    report: Box::new(report),
                });
            }
        }

        report.finish();
        tracing::info!(
            run_id = %report.run_id,
            created = report.created(),
            skipped = report.skipped(),
            "Provisioning plan complete"
        );
        Ok(report)
    }
}

/// Apply `plan` with the default tracing audit sink.
pub async fn apply<H>(plan: &ProvisioningPlan, handle: &H) -> Result<Report, ProvisioningError>
where
    H: DatabaseHandle + ?Sized,
{
    Executor::new().apply(plan, handle).await
}

async fn apply_directive<H>(
    directive: &ProvisioningDirective,
    handle: &H,
) -> Result<Applied, HandleError>
where
    H: DatabaseHandle + ?Sized,
{
    match directive {
        ProvisioningDirective::CreateUser(user) => {
            tracing::debug!(database = %user.database, user = %user.username, "createUser");
            absorb_existing(handle.create_user(user).await)
        }
        ProvisioningDirective::CreateCollection(collection) => {
            tracing::debug!(database = %collection.database, collection = %collection.name, "createCollection");
            absorb_existing(handle.create_collection(collection).await)
        }
        ProvisioningDirective::CreateIndex(index) => match inspect_index(index, handle).await? {
            Some(applied) => Ok(applied),
            None => {
                tracing::debug!(
                    database = %index.database,
                    collection = %index.collection,
                    index = %index.resolved_name(),
                    "createIndex"
                );
                absorb_existing(handle.create_index(index).await)
            }
        },
    }
}

/// Collections that earlier directives of a preview run would have created.
#[derive(Debug, Default)]
struct PreviewState {
    collections: HashSet<(String, String)>,
}

impl PreviewState {
    fn has_collection(&self, database: &str, name: &str) -> bool {
        self.collections
            .contains(&(database.to_string(), name.to_string()))
    }

    fn add_collection(&mut self, database: &str, name: &str) {
        self.collections
            .insert((database.to_string(), name.to_string()));
    }
}

async fn preview_directive<H>(
    directive: &ProvisioningDirective,
    handle: &H,
    state: &mut PreviewState,
) -> Result<Applied, HandleError>
where
    H: DatabaseHandle + ?Sized,
{
    let exists = match directive {
        ProvisioningDirective::CreateUser(user) => {
            handle.user_exists(&user.database, &user.username).await?
        }
        ProvisioningDirective::CreateCollection(collection) => {
            let exists = state.has_collection(&collection.database, &collection.name)
                || handle
                    .collection_exists(&collection.database, &collection.name)
                    .await?;
            state.add_collection(&collection.database, &collection.name);
            exists
        }
        ProvisioningDirective::CreateIndex(index) => {
            if !state.has_collection(&index.database, &index.collection)
                && !handle
                    .collection_exists(&index.database, &index.collection)
                    .await?
            {
                if !handle.creates_collections_implicitly() {
                    return Err(HandleError::MissingDependency(format!(
                        "collection {}.{} does not exist",
                        index.database, index.collection
                    )));
                }
                state.add_collection(&index.database, &index.collection);
            }
            inspect_index(index, handle).await?.is_some()
        }
    };
    Ok(if exists {
        Applied::Skipped
    } else {
        Applied::Created
    })
}

/// Compare the requested index with what the collection already has.
/// `Some(Skipped)` means nothing to do, `None` means it must be created.
async fn inspect_index<H>(index: &IndexSpec, handle: &H) -> Result<Option<Applied>, HandleError>
where
    H: DatabaseHandle + ?Sized,
{
    let existing = handle
        .list_indexes(&index.database, &index.collection)
        .await?;

    match index.classify(&existing) {
        IndexMatch::Absent => Ok(None),
        IndexMatch::Identical => Ok(Some(Applied::Skipped)),
        IndexMatch::Conflict { reason, .. } => {
            tracing::warn!(
                database = %index.database,
                collection = %index.collection,
                "Index definition conflict: {}",
                reason
            );
            Err(HandleError::DefinitionConflict(reason))
        }
    }
}

fn absorb_existing(result: Result<(), HandleError>) -> Result<Applied, HandleError> {
    match result {
        Ok(()) => Ok(Applied::Created),
        Err(HandleError::AlreadyExists(what)) => {
            tracing::debug!("Already exists, skipping: {}", what);
            Ok(Applied::Skipped)
        }
        Err(e) => Err(e),
    }
}
