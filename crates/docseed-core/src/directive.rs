//! Provisioning directive types.
//!
//! A directive is one declarative step against a named logical database.
//! Every directive carries its target database explicitly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Sort direction of one index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum IndexDirection {
    #[default]
    Ascending,
    Descending,
}

impl IndexDirection {
    pub fn as_i32(self) -> i32 {
        match self {
            IndexDirection::Ascending => 1,
            IndexDirection::Descending => -1,
        }
    }
}

impl From<IndexDirection> for i32 {
    fn from(direction: IndexDirection) -> Self {
        direction.as_i32()
    }
}

impl TryFrom<i32> for IndexDirection {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(IndexDirection::Ascending),
            -1 => Ok(IndexDirection::Descending),
            other => Err(format!("index direction must be 1 or -1, got {}", other)),
        }
    }
}

impl fmt::Display for IndexDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

/// One `(field, direction)` pair of an index key pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexKey {
    pub field: String,
    #[serde(default)]
    pub direction: IndexDirection,
}

impl IndexKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: IndexDirection::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: IndexDirection::Descending,
        }
    }
}

/// A role granted to a user on a database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: String,
    pub database: String,
}

impl RoleGrant {
    pub fn new(role: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            database: database.into(),
        }
    }
}

/// Create a user in `database` (usually `admin`) with a set of role grants.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct UserSpec {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub database: String,
    pub roles: BTreeSet<RoleGrant>,
}

impl fmt::Debug for UserSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSpec")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("roles", &self.roles)
            .finish()
    }
}

/// Create a named collection in `database`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSpec {
    pub database: String,
    pub name: String,
}

/// Create a secondary index on `database.collection`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    pub database: String,
    pub collection: String,
    pub keys: Vec<IndexKey>,
    pub unique: bool,
    /// Explicit index name. Derived from the keys when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl IndexSpec {
    /// The index name the database will use: the explicit name, or
    /// `field_dir` pairs joined by `_`.
    pub fn resolved_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => default_index_name(&self.keys),
        }
    }

    /// Compare this index against the indexes already present on the
    /// collection.
    pub fn classify(&self, existing: &[IndexDescriptor]) -> IndexMatch {
        let name = self.resolved_name();

        if let Some(found) = existing.iter().find(|e| e.name == name) {
            if found.keys == self.keys && found.unique == self.unique {
                return IndexMatch::Identical;
            }
            return IndexMatch::Conflict {
                existing: found.clone(),
                reason: format!(
                    "index '{}' exists as {} but {} was requested",
                    name,
                    found.describe(),
                    describe_keys(&self.keys, self.unique)
                ),
            };
        }

        for found in existing {
            if found.keys == self.keys {
                return IndexMatch::Conflict {
                    existing: found.clone(),
                    reason: format!(
                        "key pattern {} is already indexed as '{}'",
                        describe_keys(&self.keys, self.unique),
                        found.name
                    ),
                };
            }
            if same_key_set(&found.keys, &self.keys) {
                return IndexMatch::Conflict {
                    existing: found.clone(),
                    reason: format!(
                        "index '{}' covers the same fields in a different order ({} vs {})",
                        found.name,
                        found.describe(),
                        describe_keys(&self.keys, self.unique)
                    ),
                };
            }
        }

        IndexMatch::Absent
    }
}

/// An index that already exists on a collection, as reported by a handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub keys: Vec<IndexKey>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexDescriptor {
    pub fn describe(&self) -> String {
        describe_keys(&self.keys, self.unique)
    }
}

impl From<&IndexSpec> for IndexDescriptor {
    fn from(spec: &IndexSpec) -> Self {
        Self {
            name: spec.resolved_name(),
            keys: spec.keys.clone(),
            unique: spec.unique,
        }
    }
}

/// Outcome of comparing a requested index with existing ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexMatch {
    /// No index with this name or key pattern exists.
    Absent,
    /// An index with the same name and definition exists.
    Identical,
    /// An existing index clashes with the requested one.
    Conflict {
        existing: IndexDescriptor,
        reason: String,
    },
}

/// One provisioning step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProvisioningDirective {
    CreateUser(UserSpec),
    CreateCollection(CollectionSpec),
    CreateIndex(IndexSpec),
}

impl ProvisioningDirective {
    pub fn create_user(
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
        roles: impl IntoIterator<Item = RoleGrant>,
    ) -> Self {
        ProvisioningDirective::CreateUser(UserSpec {
            username: username.into(),
            password: password.into(),
            database: database.into(),
            roles: roles.into_iter().collect(),
        })
    }

    pub fn create_collection(database: impl Into<String>, name: impl Into<String>) -> Self {
        ProvisioningDirective::CreateCollection(CollectionSpec {
            database: database.into(),
            name: name.into(),
        })
    }

    pub fn create_index(
        database: impl Into<String>,
        collection: impl Into<String>,
        keys: Vec<IndexKey>,
        unique: bool,
    ) -> Self {
        ProvisioningDirective::CreateIndex(IndexSpec {
            database: database.into(),
            collection: collection.into(),
            keys,
            unique,
            name: None,
        })
    }

    /// Short machine-friendly kind label.
    pub fn kind(&self) -> &'static str {
        match self {
            ProvisioningDirective::CreateUser(_) => "create_user",
            ProvisioningDirective::CreateCollection(_) => "create_collection",
            ProvisioningDirective::CreateIndex(_) => "create_index",
        }
    }

    /// The logical database this directive targets.
    pub fn database(&self) -> &str {
        match self {
            ProvisioningDirective::CreateUser(u) => &u.database,
            ProvisioningDirective::CreateCollection(c) => &c.database,
            ProvisioningDirective::CreateIndex(i) => &i.database,
        }
    }

    /// One-line label for logs and reports. Never includes passwords.
    pub fn summary(&self) -> String {
        match self {
            ProvisioningDirective::CreateUser(u) => {
                let roles: Vec<String> = u
                    .roles
                    .iter()
                    .map(|r| format!("{}@{}", r.role, r.database))
                    .collect();
                format!(
                    "create_user {}.{} [{}]",
                    u.database,
                    u.username,
                    roles.join(", ")
                )
            }
            ProvisioningDirective::CreateCollection(c) => {
                format!("create_collection {}.{}", c.database, c.name)
            }
            ProvisioningDirective::CreateIndex(i) => format!(
                "create_index {}.{} {}",
                i.database,
                i.collection,
                describe_keys(&i.keys, i.unique)
            ),
        }
    }
}

impl fmt::Display for ProvisioningDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// MongoDB-style default index name, e.g. `aggregateId_1` or `a_1_b_-1`.
pub fn default_index_name(keys: &[IndexKey]) -> String {
    keys.iter()
        .map(|k| format!("{}_{}", k.field, k.direction))
        .collect::<Vec<_>>()
        .join("_")
}

pub(crate) fn describe_keys(keys: &[IndexKey], unique: bool) -> String {
    let pairs: Vec<String> = keys
        .iter()
        .map(|k| format!("{}: {}", k.field, k.direction))
        .collect();
    if unique {
        format!("{{{}}} unique", pairs.join(", "))
    } else {
        format!("{{{}}}", pairs.join(", "))
    }
}

/// Order-insensitive `(field, direction)` signature of a key list.
pub(crate) fn key_set(keys: &[IndexKey]) -> BTreeSet<(&str, i32)> {
    keys.iter()
        .map(|k| (k.field.as_str(), k.direction.as_i32()))
        .collect()
}

fn same_key_set(a: &[IndexKey], b: &[IndexKey]) -> bool {
    a.len() == b.len() && key_set(a) == key_set(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_index(unique: bool) -> IndexSpec {
        IndexSpec {
            database: "customer".to_string(),
            collection: "customers".to_string(),
            keys: vec![IndexKey::asc("email")],
            unique,
            name: None,
        }
    }

    #[test]
    fn test_default_index_name_matches_mongo_convention() {
        assert_eq!(default_index_name(&[IndexKey::asc("aggregateId")]), "aggregateId_1");
        assert_eq!(
            default_index_name(&[IndexKey::asc("category.id"), IndexKey::desc("createdAt")]),
            "category.id_1_createdAt_-1"
        );
    }

    #[test]
    fn test_explicit_name_wins() {
        let mut spec = email_index(true);
        spec.name = Some("email_unique".to_string());
        assert_eq!(spec.resolved_name(), "email_unique");
    }

    #[test]
    fn test_classify_identical() {
        let spec = email_index(true);
        let existing = vec![IndexDescriptor::from(&spec)];
        assert_eq!(spec.classify(&existing), IndexMatch::Identical);
    }

    #[test]
    fn test_classify_same_name_different_uniqueness_conflicts() {
        let existing = vec![IndexDescriptor::from(&email_index(true))];
        let requested = email_index(false);
        assert!(matches!(
            requested.classify(&existing),
            IndexMatch::Conflict { .. }
        ));
    }

    #[test]
    fn test_classify_same_keys_other_name_conflicts() {
        let existing = vec![IndexDescriptor {
            name: "by_email".to_string(),
            keys: vec![IndexKey::asc("email")],
            unique: true,
        }];
        match email_index(true).classify(&existing) {
            IndexMatch::Conflict { existing, .. } => assert_eq!(existing.name, "by_email"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_reordered_fields_conflicts() {
        let existing = vec![IndexDescriptor {
            name: "status_1_vendorId_1".to_string(),
            keys: vec![IndexKey::asc("status"), IndexKey::asc("vendorId")],
            unique: false,
        }];
        let requested = IndexSpec {
            database: "vendor_dev".to_string(),
            collection: "vendor_categories".to_string(),
            keys: vec![IndexKey::asc("vendorId"), IndexKey::asc("status")],
            unique: false,
            name: None,
        };
        assert!(matches!(
            requested.classify(&existing),
            IndexMatch::Conflict { .. }
        ));
    }

    #[test]
    fn test_classify_opposite_direction_is_distinct() {
        let existing = vec![IndexDescriptor {
            name: "timestamp_1".to_string(),
            keys: vec![IndexKey::asc("timestamp")],
            unique: false,
        }];
        let requested = IndexSpec {
            database: "eventstore".to_string(),
            collection: "events".to_string(),
            keys: vec![IndexKey::desc("timestamp")],
            unique: false,
            name: None,
        };
        assert_eq!(requested.classify(&existing), IndexMatch::Absent);
    }

    #[test]
    fn test_classify_unrelated_index_is_absent() {
        let existing = vec![IndexDescriptor {
            name: "_id_".to_string(),
            keys: vec![IndexKey::asc("_id")],
            unique: false,
        }];
        assert_eq!(email_index(true).classify(&existing), IndexMatch::Absent);
    }

    #[test]
    fn test_direction_serializes_as_integer() {
        let key = IndexKey::desc("timestamp");
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json, serde_json::json!({ "field": "timestamp", "direction": -1 }));

        let parsed: IndexKey = serde_json::from_str(r#"{"field":"timestamp"}"#).unwrap();
        assert_eq!(parsed.direction, IndexDirection::Ascending);

        assert!(serde_json::from_str::<IndexKey>(r#"{"field":"x","direction":2}"#).is_err());
    }

    #[test]
    fn test_user_debug_and_summary_redact_password() {
        let directive = ProvisioningDirective::create_user(
            "svc",
            "hunter2",
            "admin",
            [RoleGrant::new("readWrite", "eventstore")],
        );
        assert!(!format!("{:?}", directive).contains("hunter2"));
        assert!(!directive.summary().contains("hunter2"));
        assert!(!serde_json::to_string(&directive).unwrap().contains("hunter2"));
        assert_eq!(directive.summary(), "create_user admin.svc [readWrite@eventstore]");
    }
}
