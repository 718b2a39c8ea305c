//! CLI command implementations

pub mod context;
pub mod plan;

pub use context::context;
pub use plan::{build_args, dockerfile, plan};

use anyhow::{Context, Result};
use clap::Args;
use layerplan_core::python::{parse_requirements_txt, plan_python_environment};
use layerplan_core::{BuildPlan, ImageTarget, LocalContentStore, PlanConfig};
use std::path::{Path, PathBuf};

/// Inputs shared by every planning command.
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Config file (defaults to $LAYERPLAN_CONFIG or ./layerplan.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// requirements.txt to read specifiers from
    #[arg(short = 'r', long = "requirements")]
    pub requirements_file: Option<PathBuf>,

    /// Requirement specifiers (e.g., "flask==2.0"), after those from -r
    pub requirements: Vec<String>,

    /// Source root that constraint files are resolved against
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Content store directory (defaults to <root>/.layerplan/store)
    #[arg(long)]
    pub store_dir: Option<PathBuf>,

    /// One pip install layer per requirement
    #[arg(long, conflicts_with = "single_line")]
    pub multiline: bool,

    /// A single pip install layer for all requirements
    #[arg(long)]
    pub single_line: bool,
}

impl PlanArgs {
    fn multiline_override(&self) -> Option<bool> {
        match (self.multiline, self.single_line) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    fn requirements(&self) -> Result<Vec<String>> {
        let mut requirements = Vec::new();
        if let Some(path) = &self.requirements_file {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read requirements: {}", path.display()))?;
            requirements.extend(parse_requirements_txt(&content));
        }
        requirements.extend(self.requirements.iter().cloned());
        Ok(requirements)
    }
}

/// A computed plan together with what produced it.
pub struct Planned {
    pub config: PlanConfig,
    pub plan: BuildPlan,
    pub store: LocalContentStore,
}

impl Planned {
    /// The config's image target, required by image-level commands.
    pub fn target(&self) -> Result<&ImageTarget> {
        self.config.image.as_ref().context("No `image` section in config")
    }
}

/// Load config and requirements, then run the planners.
pub async fn load_plan(args: &PlanArgs) -> Result<Planned> {
    let config = PlanConfig::load(args.config.as_deref()).context("Failed to load config")?;
    let requirements = args.requirements()?;

    let store_dir = args.store_dir.clone().unwrap_or_else(|| default_store_dir(&args.root));
    let store = LocalContentStore::new(&args.root, &store_dir)
        .with_context(|| format!("Failed to open content store: {}", store_dir.display()))?;

    let plan = plan_python_environment(&config, &requirements, args.multiline_override(), &store)
        .await
        .context("Failed to plan Python environment")?;

    Ok(Planned { config, plan, store })
}

fn default_store_dir(root: &Path) -> PathBuf {
    root.join(".layerplan").join("store")
}
