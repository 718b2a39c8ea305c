//! Commands that print planner output to stdout.

use super::{load_plan, PlanArgs};
use anyhow::{Context, Result};
use colored::Colorize;
use layerplan_core::PlanConfig;
use std::path::Path;

/// Prints the merged command sequence.
pub async fn plan(args: &PlanArgs) -> Result<()> {
    let planned = load_plan(args).await?;

    print!("{}", planned.plan.render());

    eprintln!(
        "{} {} commands",
        "planned".bold().green(),
        planned.plan.commands.len().to_string().yellow()
    );
    for file in planned.plan.source_files() {
        eprintln!("  {} {}", "needs".cyan(), file);
    }
    Ok(())
}

/// Prints the Dockerfile for the configured image target.
pub async fn dockerfile(args: &PlanArgs) -> Result<()> {
    let planned = load_plan(args).await?;
    let target = planned.target()?;

    let dockerfile =
        target.render_dockerfile(&planned.plan).context("Failed to render Dockerfile")?;
    print!("{}", dockerfile);
    Ok(())
}

/// Prints the `docker build` arguments, one per line.
pub fn build_args(config: Option<&Path>) -> Result<()> {
    let config = PlanConfig::load(config).context("Failed to load config")?;
    let target = config.image.as_ref().context("No `image` section in config")?;

    for arg in target.docker_build_args()? {
        println!("{}", arg);
    }
    Ok(())
}
