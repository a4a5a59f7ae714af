//! Error types for plan construction and plan files.

use thiserror::Error;

/// A plan was rejected before any database call was made.
///
/// Ordinals are 1-based positions in the directive list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("directive #{ordinal}: {field} must not be empty")]
    EmptyName { ordinal: usize, field: &'static str },

    #[error("directive #{ordinal}: index on {database}.{collection} has no keys")]
    EmptyKeys {
        ordinal: usize,
        database: String,
        collection: String,
    },

    #[error("directive #{ordinal}: field '{field}' appears more than once in the index keys")]
    RepeatedField { ordinal: usize, field: String },

    #[error("directive #{second}: user '{username}' is already created by directive #{first}")]
    DuplicateUser {
        username: String,
        first: usize,
        second: usize,
    },

    #[error(
        "directive #{second}: index keys {keys} on {database}.{collection} duplicate directive #{first}"
    )]
    DuplicateIndexKeys {
        database: String,
        collection: String,
        keys: String,
        first: usize,
        second: usize,
    },

    #[error(
        "directive #{second}: index name '{name}' on {database}.{collection} is already used by directive #{first}"
    )]
    DuplicateIndexName {
        database: String,
        collection: String,
        name: String,
        first: usize,
        second: usize,
    },
}

/// Error type for plan file loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("user '{username}' has no password (set `password_env` or `password`)")]
    MissingPassword { username: String },

    #[error("unknown built-in plan '{0}'")]
    UnknownBuiltin(String),

    #[error("invalid plan: {0}")]
    Plan(#[from] PlanError),
}
