//! `docseed check` command implementation.
//!
//! Validates a plan without touching a database:
//! - JSON Schema validation against the embedded plan schema
//! - Plan rules (duplicate users, duplicate index keys, empty key lists, ...)
//! - Warnings for literal passwords

use anyhow::Result;
use docseed_core::{ConfigError, PLAN_SCHEMA, PlanFile};
use serde_json::Value as JsonValue;

use super::{EXIT_OK, EXIT_PLAN_FAILED, PlanSource};

/// Severity level for check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single check finding.
#[derive(Debug, Clone)]
pub struct CheckFinding {
    pub severity: Severity,
    /// Category of the check that produced this finding.
    pub category: String,
    pub message: String,
    /// Optional location within the plan (e.g., "/stores/0/user").
    pub location: Option<String>,
}

impl CheckFinding {
    fn error(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category: category.into(),
            message: message.into(),
            location: None,
        }
    }

    fn warning(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            category: category.into(),
            message: message.into(),
            location: None,
        }
    }

    fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[derive(Debug, Default)]
pub struct CheckResults {
    pub findings: Vec<CheckFinding>,
}

impl CheckResults {
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    pub fn print_summary(&self, label: &str) {
        let mut findings: Vec<_> = self.findings.iter().collect();
        findings.sort_by(|a, b| b.severity.cmp(&a.severity).then(a.category.cmp(&b.category)));

        for finding in &findings {
            let icon = match finding.severity {
                Severity::Error => "✗",
                Severity::Warning => "⚠",
            };
            let location = finding
                .location
                .as_ref()
                .map(|l| format!(" [{}]", l))
                .unwrap_or_default();
            println!(
                "  {} {} [{}]{}: {}",
                icon, finding.severity, finding.category, location, finding.message
            );
        }

        println!();
        if self.findings.is_empty() {
            println!("✅ {}: all checks passed", label);
        } else {
            println!(
                "{}: {} error(s), {} warning(s)",
                label,
                self.error_count(),
                self.warning_count()
            );
        }
    }
}

pub fn run(source: &PlanSource) -> Result<u8> {
    let (label, content) = source.read()?;
    println!("🔍 Checking plan {}...", label);

    let results = check_plan(&content)?;
    results.print_summary(&label);

    Ok(if results.has_errors() {
        EXIT_PLAN_FAILED
    } else {
        EXIT_OK
    })
}

/// Run every check against raw plan YAML.
pub fn check_plan(content: &str) -> Result<CheckResults> {
    let mut results = CheckResults::default();

    let value: JsonValue = match serde_yaml::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            results
                .findings
                .push(CheckFinding::error("yaml", format!("Failed to parse YAML: {}", e)));
            return Ok(results);
        }
    };

    results.findings.extend(validate_schema(&value)?);
    if results.has_errors() {
        return Ok(results);
    }

    let file = match PlanFile::from_yaml(content) {
        Ok(file) => file,
        Err(e) => {
            results.findings.push(CheckFinding::error("plan", e.to_string()));
            return Ok(results);
        }
    };

    results.findings.extend(check_passwords(&file));

    match file.to_plan() {
        Ok(plan) => tracing::debug!(directives = plan.len(), "Plan expanded"),
        Err(ConfigError::MissingPassword { username }) => results.findings.push(
            CheckFinding::error(
                "credentials",
                format!("user '{}' has no password in this environment", username),
            ),
        ),
        Err(e) => results.findings.push(CheckFinding::error("plan", e.to_string())),
    }

    Ok(results)
}

fn validate_schema(value: &JsonValue) -> Result<Vec<CheckFinding>> {
    let schema: JsonValue = serde_json::from_str(PLAN_SCHEMA)?;
    let compiled = jsonschema::validator_for(&schema)
        .map_err(|e| anyhow::anyhow!("Failed to compile plan schema: {}", e))?;

    let mut findings = Vec::new();
    for error in compiled.iter_errors(value) {
        let path = error.instance_path().to_string();
        let location = if path.is_empty() {
            "(root)".to_string()
        } else {
            path
        };
        findings.push(CheckFinding::error("json-schema", error.to_string()).with_location(location));
    }
    Ok(findings)
}

fn check_passwords(file: &PlanFile) -> Vec<CheckFinding> {
    let mut findings = Vec::new();
    for (idx, store) in file.stores.iter().enumerate() {
        let Some(user) = &store.user else { continue };
        if user.password.is_some() && user.password_env.is_none() {
            findings.push(
                CheckFinding::warning(
                    "credentials",
                    format!(
                        "user '{}' only has a literal password; prefer password_env",
                        user.username
                    ),
                )
                .with_location(format!("/stores/{}/user", idx)),
            );
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use docseed_core::config::builtin;

    #[test]
    fn test_builtin_plan_has_no_errors() {
        let results = check_plan(builtin::source("ecommerce").unwrap()).unwrap();
        assert!(!results.has_errors(), "{:?}", results.findings);
    }

    #[test]
    fn test_schema_errors_are_reported_with_location() {
        let results = check_plan("stores:\n  - database: a\n    user: { username: svc }\n").unwrap();
        assert!(results.has_errors());
        let finding = &results.findings[0];
        assert_eq!(finding.category, "json-schema");
        assert_eq!(finding.location.as_deref(), Some("/stores/0/user"));
    }

    #[test]
    fn test_plan_rule_violations_are_errors() {
        let yaml = r#"
stores:
  - database: a
    collections:
      - name: c
        indexes:
          - keys: [{ field: x }]
          - keys: [{ field: x }]
            unique: true
"#;
        let results = check_plan(yaml).unwrap();
        assert_eq!(results.error_count(), 1);
        assert_eq!(results.findings[0].category, "plan");
    }

    #[test]
    fn test_literal_password_warns() {
        let yaml = "stores:\n  - database: a\n    user: { username: svc, password: pw }\n";
        let results = check_plan(yaml).unwrap();
        assert!(!results.has_errors());
        assert_eq!(results.warning_count(), 1);
    }

    #[test]
    fn test_invalid_yaml() {
        let results = check_plan("stores: [").unwrap();
        assert_eq!(results.findings[0].category, "yaml");
    }
}
