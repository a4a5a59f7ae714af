//! Mapping of MongoDB server and driver errors onto handle error kinds.

use docseed_runtime::HandleError;
use mongodb::error::{Error as MongoError, ErrorKind};

/// Server error codes the executor cares about.
pub mod codes {
    pub const BAD_VALUE: i32 = 2;
    pub const FAILED_TO_PARSE: i32 = 9;
    pub const UNAUTHORIZED: i32 = 13;
    pub const AUTHENTICATION_FAILED: i32 = 18;
    pub const NAMESPACE_NOT_FOUND: i32 = 26;
    pub const NAMESPACE_EXISTS: i32 = 48;
    pub const CANNOT_CREATE_INDEX: i32 = 67;
    pub const INDEX_OPTIONS_CONFLICT: i32 = 85;
    pub const INDEX_KEY_SPECS_CONFLICT: i32 = 86;
    pub const USER_ALREADY_EXISTS: i32 = 51003;
}

/// Classify a server command error by its code.
pub fn from_code(code: i32, code_name: &str, message: &str) -> HandleError {
    let detail = if code_name.is_empty() {
        format!("{} (code {})", message, code)
    } else {
        format!("{} ({} {})", message, code_name, code)
    };

    match code {
        codes::NAMESPACE_EXISTS | codes::USER_ALREADY_EXISTS => HandleError::AlreadyExists(detail),
        codes::UNAUTHORIZED => HandleError::PermissionDenied(detail),
        codes::AUTHENTICATION_FAILED => HandleError::Connection(detail),
        codes::INDEX_OPTIONS_CONFLICT | codes::INDEX_KEY_SPECS_CONFLICT => {
            HandleError::DefinitionConflict(detail)
        }
        codes::BAD_VALUE | codes::FAILED_TO_PARSE | codes::CANNOT_CREATE_INDEX => {
            HandleError::Malformed(detail)
        }
        codes::NAMESPACE_NOT_FOUND => HandleError::MissingDependency(detail),
        _ => HandleError::Other(detail),
    }
}

/// Classify a driver error.
pub fn from_driver(err: MongoError) -> HandleError {
    match err.kind.as_ref() {
        ErrorKind::Command(cmd) => from_code(cmd.code, &cmd.code_name, &cmd.message),
        ErrorKind::Authentication { message, .. } => HandleError::Connection(message.clone()),
        ErrorKind::ServerSelection { message, .. } => HandleError::Connection(message.clone()),
        ErrorKind::DnsResolve { message, .. } => HandleError::Connection(message.clone()),
        ErrorKind::Io(io) => HandleError::Connection(io.to_string()),
        ErrorKind::ConnectionPoolCleared { message, .. } => {
            HandleError::Connection(message.clone())
        }
        ErrorKind::InvalidArgument { message, .. } => HandleError::Malformed(message.clone()),
        _ => HandleError::Other(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_artifacts_are_already_exists() {
        assert!(matches!(
            from_code(51003, "Location51003", "User \"svc@admin\" already exists"),
            HandleError::AlreadyExists(_)
        ));
        assert!(matches!(
            from_code(48, "NamespaceExists", "Collection eventstore.events already exists."),
            HandleError::AlreadyExists(_)
        ));
    }

    #[test]
    fn test_fatal_codes() {
        assert!(matches!(
            from_code(13, "Unauthorized", "not authorized on admin"),
            HandleError::PermissionDenied(_)
        ));
        assert!(matches!(
            from_code(85, "IndexOptionsConflict", "An existing index has the same name"),
            HandleError::DefinitionConflict(_)
        ));
        assert!(matches!(
            from_code(86, "IndexKeySpecsConflict", "different key spec"),
            HandleError::DefinitionConflict(_)
        ));
        assert!(matches!(
            from_code(67, "CannotCreateIndex", "bad index"),
            HandleError::Malformed(_)
        ));
        assert!(matches!(from_code(11600, "", "shutdown"), HandleError::Other(_)));
    }

    #[test]
    fn test_detail_keeps_code_name() {
        let err = from_code(13, "Unauthorized", "not authorized");
        assert_eq!(err.message(), "not authorized (Unauthorized 13)");
    }
}
