//! List command - show discovered suites and tests without running them

use crate::plan::PlanSet;
use anyhow::Result;
use colored::*;
use std::io::Write;
use std::path::Path;

/// Print every suite and test under `dir`, optionally filtered
pub fn run(dir: &Path, pattern: Option<&str>, out: &mut impl Write) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Check directory not found: {}", dir.display());
    }

    let mut plans = PlanSet::discover(dir);
    let errors = std::mem::take(&mut plans.parse_errors);
    if let Some(pattern) = pattern {
        plans = plans.filter(pattern);
    }

    for plan in &plans.plans {
        writeln!(out, "{}", plan.path.display().to_string().dimmed())?;
        for suite in &plan.suites {
            writeln!(out, "  {} {}", "▸".cyan(), suite.name.bold())?;
            for test in &suite.tests {
                writeln!(out, "    {} [{}]", test.name, test.assert)?;
            }
        }
    }

    for (path, error) in &errors {
        writeln!(out, "{} {}: {}", "●".yellow(), path.display(), error)?;
    }

    writeln!(
        out,
        "{} test{}",
        plans.len(),
        if plans.len() == 1 { "" } else { "s" }
    )?;
    Ok(())
}
