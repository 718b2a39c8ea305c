//! Writes a ready-to-build docker context.
//!
//! Layout:
//!
//! ```text
//! <out>/
//! ├── Dockerfile
//! ├── .dockerignore
//! └── application/   # files referenced by the plan's COPY commands
//! ```

use super::{load_plan, PlanArgs};
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Directory inside the context that COPY commands read from.
const APPLICATION_DIR: &str = "application";

pub async fn context(args: &PlanArgs, out: &Path) -> Result<()> {
    let planned = load_plan(args).await?;
    let target = planned.target()?;

    let dockerfile =
        target.render_dockerfile(&planned.plan).context("Failed to render Dockerfile")?;

    fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory: {}", out.display()))?;
    fs::write(out.join("Dockerfile"), dockerfile).context("Failed to write Dockerfile")?;
    fs::write(out.join(".dockerignore"), target.render_dockerignore())
        .context("Failed to write .dockerignore")?;

    let application = out.join(APPLICATION_DIR);
    for handle in &planned.plan.sources {
        planned
            .store
            .materialize(handle, &application)
            .await
            .with_context(|| format!("Failed to materialize {}", handle.fingerprint))?;
        info!(
            fingerprint = %handle.fingerprint,
            files = handle.files.len(),
            "Materialized sources"
        );
    }

    eprintln!(
        "{} {} ({} source files)",
        "wrote".bold().green(),
        out.display(),
        planned.plan.source_files().len().to_string().yellow()
    );
    Ok(())
}
