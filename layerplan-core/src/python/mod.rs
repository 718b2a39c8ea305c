//! Planners for the Python runtime environment of an image.
//!
//! [`venv::plan_virtual_env`] creates the interpreter environment and
//! [`requirements::plan_requirement_install`] installs dependencies into it.
//! Callers concatenate the two components, environment first.

pub mod install_args;
pub mod requirements;
pub mod venv;

use crate::component::BuildPlan;
use crate::config::PlanConfig;
use crate::error::Result;
use crate::store::FileContentStore;

pub use install_args::{derive_install_args, InstallArguments};
pub use requirements::{parse_requirements_txt, plan_requirement_install};
pub use venv::{plan_virtual_env, VirtualEnvRequest};

/// Location of the virtual environment inside the image.
pub const VIRTUAL_ENV_DIR: &str = "/.virtual_env";

/// Plan the virtual environment followed by the requirement installs.
///
/// `multiline` overrides `config.docker.multiline_pip_install` when set.
pub async fn plan_python_environment<S: AsRef<str>>(
    config: &PlanConfig,
    requirements: &[S],
    multiline: Option<bool>,
    store: &dyn FileContentStore,
) -> Result<BuildPlan> {
    let venv = plan_virtual_env(&VirtualEnvRequest::from_setup(&config.python), store).await?;
    let install = plan_requirement_install(
        requirements,
        &config.python,
        &config.repos,
        multiline.unwrap_or(config.docker.multiline_pip_install),
    )?;
    Ok(BuildPlan::from_components([venv, install]))
}
