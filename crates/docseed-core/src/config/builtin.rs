//! Plans compiled into the binary.

use super::PlanFile;
use crate::error::ConfigError;

/// Embedded plan sources, keyed by name.
mod embedded_plans {
    pub const ECOMMERCE: &str = include_str!("../../../../plans/ecommerce.yaml");
}

/// Names of the built-in plans.
pub const BUILTIN_NAMES: &[&str] = &["ecommerce"];

/// Raw YAML of a built-in plan.
pub fn source(name: &str) -> Option<&'static str> {
    match name {
        "ecommerce" => Some(embedded_plans::ECOMMERCE),
        _ => None,
    }
}

/// Parse a built-in plan.
pub fn load(name: &str) -> Result<PlanFile, ConfigError> {
    let content = source(name).ok_or_else(|| ConfigError::UnknownBuiltin(name.to_string()))?;
    PlanFile::from_yaml(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::ProvisioningDirective;

    #[test]
    fn test_every_builtin_parses_and_validates() {
        for name in BUILTIN_NAMES {
            let file = load(name).unwrap();
            file.to_plan_with(|_| None).unwrap();
        }
    }

    #[test]
    fn test_ecommerce_plan_shape() {
        let plan = load("ecommerce").unwrap().to_plan_with(|_| None).unwrap();
        assert_eq!(plan.len(), 14);
        assert_eq!(plan.databases(), vec!["admin", "eventstore_dev", "customer", "vendor_dev"]);

        let unique: Vec<String> = plan
            .iter()
            .filter_map(|d| match d {
                ProvisioningDirective::CreateIndex(i) if i.unique => Some(i.resolved_name()),
                _ => None,
            })
            .collect();
        assert_eq!(unique, vec!["id_1", "email_1"]);
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(matches!(load("nope"), Err(ConfigError::UnknownBuiltin(_))));
    }
}
