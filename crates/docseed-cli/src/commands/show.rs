//! `docseed show` command implementation.

use anyhow::{Context, Result};
use docseed_core::{PlanFile, ProvisioningPlan};

use super::{EXIT_OK, PlanSource};

pub fn run(source: &PlanSource, json: bool) -> Result<u8> {
    let file = source.load()?;
    let plan = expand(&file)?;

    if json {
        // Passwords are never serialized.
        println!("{}", serde_json::to_string_pretty(plan.directives())?);
    } else {
        print!("{}", render(&plan));
    }
    Ok(EXIT_OK)
}

/// Expand without reading credentials from the environment.
fn expand(file: &PlanFile) -> Result<ProvisioningPlan> {
    let directives = file
        .preview_directives()
        .with_context(|| format!("Failed to expand plan '{}'", file.name))?;
    ProvisioningPlan::new(file.name.clone(), directives)
        .with_context(|| format!("Plan '{}' is invalid", file.name))
}

fn render(plan: &ProvisioningPlan) -> String {
    let mut out = format!(
        "Plan '{}': {} directive(s) across {}\n",
        plan.name(),
        plan.len(),
        plan.databases().join(", ")
    );
    for (idx, directive) in plan.iter().enumerate() {
        out.push_str(&format!("  #{:<3} {}\n", idx + 1, directive));
    }
    out
}
