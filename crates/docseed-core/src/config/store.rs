//! Store configuration types.
//!
//! A store is one logical database plus the user, collections and indexes
//! provisioned for it.

use serde::{Deserialize, Serialize};

use crate::directive::{IndexKey, IndexSpec, ProvisioningDirective, RoleGrant};
use crate::error::ConfigError;

/// One logical database and everything provisioned in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Logical database name.
    pub database: String,

    /// Service user owning this store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserConfig>,

    /// Collections, each followed by its indexes.
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
}

/// Service user definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    pub username: String,

    /// Environment variable containing the password. Takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Literal password, used when `password_env` is unset or missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Database the user is created in. Defaults to the plan's admin database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Role grants. A grant without a database applies to the store's database.
    #[serde(default)]
    pub roles: Vec<RoleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleConfig {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    pub name: String,
    #[serde(default)]
    pub indexes: Vec<IndexConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    pub keys: Vec<IndexKey>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UserConfig {
    /// Resolve the password: `password_env` first, then `password`.
    pub fn resolve_password<F>(&self, env: &F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(var) = &self.password_env
            && let Some(password) = env(var)
        {
            return Ok(password);
        }
        self.password
            .clone()
            .ok_or_else(|| ConfigError::MissingPassword {
                username: self.username.clone(),
            })
    }
}

impl StoreConfig {
    /// Append this store's directives to `out`; `password` supplies each
    /// user's password.
    pub(crate) fn expand_into<P>(
        &self,
        admin_database: &str,
        password: &P,
        out: &mut Vec<ProvisioningDirective>,
    ) -> Result<(), ConfigError>
    where
        P: Fn(&UserConfig) -> Result<String, ConfigError>,
    {
        if let Some(user) = &self.user {
            let roles = user.roles.iter().map(|r| {
                RoleGrant::new(
                    r.role.clone(),
                    r.database.clone().unwrap_or_else(|| self.database.clone()),
                )
            });
            out.push(ProvisioningDirective::create_user(
                user.username.clone(),
                password(user)?,
                user.database
                    .clone()
                    .unwrap_or_else(|| admin_database.to_string()),
                roles,
            ));
        }

        for collection in &self.collections {
            out.push(ProvisioningDirective::create_collection(
                self.database.clone(),
                collection.name.clone(),
            ));
            for index in &collection.indexes {
                out.push(ProvisioningDirective::CreateIndex(IndexSpec {
                    database: self.database.clone(),
                    collection: collection.name.clone(),
                    keys: index.keys.clone(),
                    unique: index.unique,
                    name: index.name.clone(),
                }));
            }
        }

        Ok(())
    }
}
