//! Validated, ordered provisioning plans.

use crate::directive::{IndexKey, ProvisioningDirective, UserSpec, describe_keys, key_set};
use crate::error::PlanError;
use std::collections::{BTreeSet, HashMap, HashSet};

/// An ordered list of directives that passed validation.
///
/// Plans are immutable once built; the only way to obtain one is through
/// [`ProvisioningPlan::new`], so every plan the executor sees is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningPlan {
    name: String,
    directives: Vec<ProvisioningDirective>,
}

impl ProvisioningPlan {
    pub fn new(
        name: impl Into<String>,
        directives: Vec<ProvisioningDirective>,
    ) -> Result<Self, PlanError> {
        validate(&directives)?;
        Ok(Self {
            name: name.into(),
            directives,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directives(&self) -> &[ProvisioningDirective] {
        &self.directives
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProvisioningDirective> {
        self.directives.iter()
    }

    /// Distinct logical databases touched by the plan, in first-use order.
    pub fn databases(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.directives
            .iter()
            .map(|d| d.database())
            .filter(|db| seen.insert(*db))
            .collect()
    }
}

fn validate(directives: &[ProvisioningDirective]) -> Result<(), PlanError> {
    let mut users: HashMap<&str, usize> = HashMap::new();
    let mut index_keys: HashMap<(&str, &str, BTreeSet<(&str, i32)>), usize> = HashMap::new();
    let mut index_names: HashMap<(&str, &str, String), usize> = HashMap::new();

    for (idx, directive) in directives.iter().enumerate() {
        let ordinal = idx + 1;

        match directive {
            ProvisioningDirective::CreateUser(user) => {
                validate_user(ordinal, user)?;
                if let Some(first) = users.insert(user.username.as_str(), ordinal) {
                    return Err(PlanError::DuplicateUser {
                        username: user.username.clone(),
                        first,
                        second: ordinal,
                    });
                }
            }

            ProvisioningDirective::CreateCollection(collection) => {
                require(ordinal, "database", &collection.database)?;
                require(ordinal, "collection name", &collection.name)?;
            }

            ProvisioningDirective::CreateIndex(index) => {
                require(ordinal, "database", &index.database)?;
                require(ordinal, "collection name", &index.collection)?;
                validate_keys(ordinal, index.database.as_str(), &index.collection, &index.keys)?;

                // Same (field, direction) pairs in any order count as the same key signature.
                let key_id = (
                    index.database.as_str(),
                    index.collection.as_str(),
                    key_set(&index.keys),
                );
                if let Some(first) = index_keys.insert(key_id, ordinal) {
                    return Err(PlanError::DuplicateIndexKeys {
                        database: index.database.clone(),
                        collection: index.collection.clone(),
                        keys: describe_keys(&index.keys, index.unique),
                        first,
                        second: ordinal,
                    });
                }

                let name = index.resolved_name();
                require(ordinal, "index name", &name)?;
                let name_id = (index.database.as_str(), index.collection.as_str(), name.clone());
                if let Some(first) = index_names.insert(name_id, ordinal) {
                    return Err(PlanError::DuplicateIndexName {
                        database: index.database.clone(),
                        collection: index.collection.clone(),
                        name,
                        first,
                        second: ordinal,
                    });
                }
            }
        }
    }

    Ok(())
}

fn validate_user(ordinal: usize, user: &UserSpec) -> Result<(), PlanError> {
    require(ordinal, "username", &user.username)?;
    require(ordinal, "user database", &user.database)?;
    for grant in &user.roles {
        require(ordinal, "role", &grant.role)?;
        require(ordinal, "role database", &grant.database)?;
    }
    Ok(())
}

fn validate_keys(
    ordinal: usize,
    database: &str,
    collection: &str,
    keys: &[IndexKey],
) -> Result<(), PlanError> {
    if keys.is_empty() {
        return Err(PlanError::EmptyKeys {
            ordinal,
            database: database.to_string(),
            collection: collection.to_string(),
        });
    }

    let mut seen = HashSet::new();
    for key in keys {
        require(ordinal, "index field", &key.field)?;
        if !seen.insert(key.field.as_str()) {
            return Err(PlanError::RepeatedField {
                ordinal,
                field: key.field.clone(),
            });
        }
    }
    Ok(())
}

fn require(ordinal: usize, field: &'static str, value: &str) -> Result<(), PlanError> {
    if value.trim().is_empty() {
        return Err(PlanError::EmptyName { ordinal, field });
    }
    Ok(())
}
