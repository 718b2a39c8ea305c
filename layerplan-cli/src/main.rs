use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::PlanArgs;

#[derive(Parser)]
#[command(name = "layerplan")]
#[command(about = "Plan the Python environment layers of a container image", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the planned command sequence
    Plan(PlanArgs),

    /// Print the Dockerfile for the configured image target
    Dockerfile(PlanArgs),

    /// Write a build context (Dockerfile, .dockerignore, input files)
    Context {
        #[command(flatten)]
        args: PlanArgs,

        /// Output directory
        #[arg(short, long)]
        out: std::path::PathBuf,
    },

    /// Print the `docker build` arguments for the configured image target
    BuildArgs {
        /// Config file (defaults to $LAYERPLAN_CONFIG or ./layerplan.json)
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    layerplan_core::observability::init(level)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::Plan(args) => commands::plan(&args).await?,
        Commands::Dockerfile(args) => commands::dockerfile(&args).await?,
        Commands::Context { args, out } => commands::context(&args, &out).await?,
        Commands::BuildArgs { config } => commands::build_args(config.as_deref())?,
    }

    Ok(())
}
