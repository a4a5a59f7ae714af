//! Plan file configuration.
//!
//! A plan file groups provisioning by *store*: one logical database, the
//! service user that owns it, and its collections with their indexes.
//!
//! ```yaml
//! name: ecommerce
//! admin_database: admin
//! stores:
//!   - database: eventstore_dev
//!     user:
//!       username: eventstore
//!       password_env: EVENTSTORE_DB_PASSWORD
//!       roles: [{ role: readWrite }]
//!     collections:
//!       - name: events
//!         indexes:
//!           - keys: [{ field: aggregateId, direction: 1 }]
//! ```
//!
//! Expanding a plan file yields directives in store order: the user first,
//! then each collection immediately followed by its indexes.

pub mod builtin;
pub mod store;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::directive::ProvisioningDirective;
use crate::error::ConfigError;
use crate::plan::ProvisioningPlan;

pub use store::{CollectionConfig, IndexConfig, RoleConfig, StoreConfig, UserConfig};

/// A complete plan file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanFile {
    /// Plan name, used in logs and reports.
    #[serde(default = "default_plan_name")]
    pub name: String,

    /// Database in which users are created unless a user overrides it.
    #[serde(default = "default_admin_database")]
    pub admin_database: String,

    /// Stores to provision, in order.
    #[serde(default)]
    pub stores: Vec<StoreConfig>,
}

impl Default for PlanFile {
    fn default() -> Self {
        Self {
            name: default_plan_name(),
            admin_database: default_admin_database(),
            stores: Vec::new(),
        }
    }
}

impl PlanFile {
    /// Load a plan file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse a plan file from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Expand into a validated plan, resolving passwords from the process
    /// environment.
    pub fn to_plan(&self) -> Result<ProvisioningPlan, ConfigError> {
        self.to_plan_with(|name| std::env::var(name).ok())
    }

    /// Expand into a validated plan using `env` to look up `password_env`
    /// variables.
    pub fn to_plan_with<F>(&self, env: F) -> Result<ProvisioningPlan, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut directives = Vec::new();
        for store in &self.stores {
            store.expand_into(
                &self.admin_database,
                &|user: &UserConfig| user.resolve_password(&env),
                &mut directives,
            )?;
        }

        tracing::debug!(
            plan = %self.name,
            stores = self.stores.len(),
            directives = directives.len(),
            "Expanded plan file"
        );

        Ok(ProvisioningPlan::new(self.name.clone(), directives)?)
    }

    /// Expanded directives with empty placeholder passwords; used for
    /// display. Credentials are neither read nor required.
    pub fn preview_directives(&self) -> Result<Vec<ProvisioningDirective>, ConfigError> {
        let mut directives = Vec::new();
        for store in &self.stores {
            store.expand_into(
                &self.admin_database,
                &|_: &UserConfig| Ok(String::new()),
                &mut directives,
            )?;
        }
        Ok(directives)
    }
}

fn default_plan_name() -> String {
    "default".to_string()
}

fn default_admin_database() -> String {
    "admin".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::{IndexKey, RoleGrant};
    use pretty_assertions::assert_eq;

    const PLAN: &str = r#"
name: shop
stores:
  - database: customer
    user:
      username: customer_user
      password: customer_password
      roles:
        - role: readWrite
    collections:
      - name: customers
        indexes:
          - keys: [{ field: id, direction: 1 }]
            unique: true
          - keys: [{ field: email }]
            unique: true
"#;

    #[test]
    fn test_expansion_order_and_defaults() {
        let file = PlanFile::from_yaml(PLAN).unwrap();
        assert_eq!(file.admin_database, "admin");

        let plan = file.to_plan_with(|_| None).unwrap();
        assert_eq!(plan.name(), "shop");

        let kinds: Vec<&str> = plan.iter().map(|d| d.kind()).collect();
        assert_eq!(
            kinds,
            vec!["create_user", "create_collection", "create_index", "create_index"]
        );

        match &plan.directives()[0] {
            ProvisioningDirective::CreateUser(user) => {
                assert_eq!(user.database, "admin");
                assert_eq!(user.password, "customer_password");
                assert!(user.roles.contains(&RoleGrant::new("readWrite", "customer")));
            }
            other => panic!("expected user directive, got {:?}", other),
        }

        match &plan.directives()[3] {
            ProvisioningDirective::CreateIndex(index) => {
                assert_eq!(index.keys, vec![IndexKey::asc("email")]);
                assert!(index.unique);
                assert_eq!(index.resolved_name(), "email_1");
            }
            other => panic!("expected index directive, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = PlanFile::from_yaml("name: x\nstorez: []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_duplicate_users_across_stores_fail_validation() {
        let yaml = r#"
stores:
  - database: a
    user: { username: svc, password: x }
  - database: b
    user: { username: svc, password: y }
"#;
        let err = PlanFile::from_yaml(yaml)
            .unwrap()
            .to_plan_with(|_| None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Plan(_)));
    }

    #[test]
    fn test_preview_directives_skip_password_resolution() {
        let yaml = r#"
stores:
  - database: a
    user: { username: svc, password_env: NOT_SET_ANYWHERE }
    collections: [{ name: things }]
"#;
        let file = PlanFile::from_yaml(yaml).unwrap();
        assert!(file.to_plan_with(|_| None).is_err());
        assert_eq!(file.preview_directives().unwrap().len(), 2);
    }

    #[test]
    fn test_preview_directives_keep_users_without_any_password() {
        let yaml = r#"
stores:
  - database: a
    user: { username: svc }
    collections: [{ name: things }]
  - database: b
    collections: [{ name: others }]
"#;
        let file = PlanFile::from_yaml(yaml).unwrap();
        let directives = file.preview_directives().unwrap();
        let kinds: Vec<_> = directives.iter().map(|d| d.kind()).collect();
        assert_eq!(
            kinds,
            vec!["create_user", "create_collection", "create_collection"]
        );
    }
}
