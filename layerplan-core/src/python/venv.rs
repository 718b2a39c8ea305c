//! Planner for the virtual environment every later pip layer installs into.

use super::VIRTUAL_ENV_DIR;
use crate::component::BuildComponent;
use crate::config::PythonSetup;
use crate::error::{PlanError, Result};
use crate::store::{FileContentStore, PathGlobs};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Origin reported when the constraint file cannot be found.
pub const CONSTRAINTS_ORIGIN: &str = "the option `requirement_constraints`";

/// Input for [`plan_virtual_env`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualEnvRequest {
    pub enable_resolves: bool,
    pub requirement_constraints: Option<String>,
}

impl VirtualEnvRequest {
    pub fn from_setup(setup: &PythonSetup) -> Self {
        Self {
            enable_resolves: setup.enable_resolves,
            requirement_constraints: setup.requirement_constraints.clone(),
        }
    }
}

/// Plan creation of the virtual environment.
///
/// When a constraint file is configured it is fetched from `store`, copied
/// into the image ahead of everything else and used to pin the pip upgrade.
/// A constraint file that matches nothing is an error.
pub async fn plan_virtual_env(
    request: &VirtualEnvRequest,
    store: &dyn FileContentStore,
) -> Result<BuildComponent> {
    if request.enable_resolves {
        return Err(PlanError::lockfiles_unsupported());
    }

    let mut commands = Vec::with_capacity(5);
    let mut sources = None;
    let mut pip_constraint = String::new();

    if let Some(constraint_file) = request.requirement_constraints.as_deref() {
        let globs = PathGlobs::new(vec![constraint_file.to_string()])
            .error_on_missing(CONSTRAINTS_ORIGIN);
        let handle = store.fetch(&globs).await?;
        debug!(file = %constraint_file, fingerprint = %handle.fingerprint, "Fetched constraints");

        commands.push(format!("COPY application/{} .\n", constraint_file));
        pip_constraint = format!(" -c {}", constraint_file);
        sources = Some(handle);
    }

    commands.push(format!("python -m venv --upgrade {}\n", VIRTUAL_ENV_DIR));
    commands.push(format!("ENV PATH={}/bin:$PATH\n", VIRTUAL_ENV_DIR));
    commands.push(format!("ENV VIRTUAL_ENV={}\n", VIRTUAL_ENV_DIR));
    commands.push(format!("python -m pip install --upgrade pip{}\n", pip_constraint));

    match sources {
        Some(handle) => BuildComponent::with_sources(commands, handle),
        None => Ok(BuildComponent::new(commands)),
    }
}
