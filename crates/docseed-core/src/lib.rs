//! Core types for docseed: provisioning directives, validated plans and
//! plan files.

pub mod config;
pub mod directive;
pub mod error;
pub mod plan;

pub use config::PlanFile;
pub use directive::{
    CollectionSpec, IndexDescriptor, IndexDirection, IndexKey, IndexMatch, IndexSpec,
    ProvisioningDirective, RoleGrant, UserSpec, default_index_name,
};
pub use error::{ConfigError, PlanError};
pub use plan::ProvisioningPlan;

/// JSON Schema for plan files (draft 2020-12).
pub const PLAN_SCHEMA: &str = include_str!("../../../schemas/ProvisioningPlan.schema.json");
