//! docseed runtime: the plan executor and the database handle boundary it
//! drives.

pub mod audit;
pub mod executor;
pub mod handle;
pub mod memory;
pub mod report;

pub use audit::{AuditEvent, AuditSink, TracingAuditSink};
pub use executor::{Executor, apply};
pub use handle::{DatabaseHandle, FailureKind, HandleError};
pub use memory::MemoryHandle;
pub use report::{ApplyMode, DirectiveOutcome, ProvisioningError, Report, ReportEntry};
