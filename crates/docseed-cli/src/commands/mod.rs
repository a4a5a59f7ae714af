//! CLI command implementations for docseed.

pub mod apply;
pub mod check;
pub mod show;

use anyhow::{Context, Result};
use clap::Args;
use docseed_core::PlanFile;
use docseed_core::config::builtin;
use std::fs;
use std::path::PathBuf;

pub use apply::ApplyArgs;

/// Every directive succeeded or was skipped.
pub const EXIT_OK: u8 = 0;
/// A directive failed, the run timed out, or `check` found errors.
pub const EXIT_PLAN_FAILED: u8 = 1;
/// The plan could not be loaded or the database could not be reached.
pub const EXIT_SETUP_FAILED: u8 = 2;

/// Where a plan comes from. Defaults to the built-in `ecommerce` plan.
#[derive(Args, Debug, Clone, Default)]
pub struct PlanSource {
    /// Path to a plan file (YAML)
    #[arg(long, conflicts_with = "builtin")]
    pub plan: Option<PathBuf>,

    /// Name of a built-in plan
    #[arg(long)]
    pub builtin: Option<String>,
}

impl PlanSource {
    /// Human label and raw YAML content.
    pub fn read(&self) -> Result<(String, String)> {
        if let Some(path) = &self.plan {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read plan file {}", path.display()))?;
            return Ok((path.display().to_string(), content));
        }

        let name = self.builtin.as_deref().unwrap_or("ecommerce");
        let content = builtin::source(name).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown built-in plan '{}'. Available: {}",
                name,
                builtin::BUILTIN_NAMES.join(", ")
            )
        })?;
        Ok((format!("builtin:{}", name), content.to_string()))
    }

    pub fn load(&self) -> Result<PlanFile> {
        let (label, content) = self.read()?;
        PlanFile::from_yaml(&content).with_context(|| format!("Failed to parse plan {}", label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_source_is_ecommerce() {
        let (label, _) = PlanSource::default().read().unwrap();
        assert_eq!(label, "builtin:ecommerce");
        assert_eq!(PlanSource::default().load().unwrap().name, "ecommerce");
    }

    #[test]
    fn test_unknown_builtin_lists_available() {
        let source = PlanSource {
            plan: None,
            builtin: Some("nope".to_string()),
        };
        let err = source.read().unwrap_err().to_string();
        assert!(err.contains("ecommerce"));
    }

    #[test]
    fn test_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name: from-file").unwrap();
        let source = PlanSource {
            plan: Some(file.path().to_path_buf()),
            builtin: None,
        };
        assert_eq!(source.load().unwrap().name, "from-file");
    }
}
