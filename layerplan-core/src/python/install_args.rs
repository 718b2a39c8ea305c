//! Derivation of pip install arguments from repository configuration.

use crate::config::{PythonRepos, PythonSetup};
use crate::error::{PlanError, Result};

/// Argument fragments shared by every pip install command of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallArguments {
    /// Primary and secondary indexes, or `--no-index`
    pub index_args: String,
    /// `--find-links` repositories
    pub links_args: String,
    /// Global `--constraint` file, empty if none
    pub constraint_arg: String,
}

/// Derive install arguments.
///
/// Fails with `UnimplementedFeature` when lockfile resolves are enabled; no
/// other field is read in that case.
pub fn derive_install_args(setup: &PythonSetup, repos: &PythonRepos) -> Result<InstallArguments> {
    if setup.enable_resolves {
        return Err(PlanError::lockfiles_unsupported());
    }

    let links_args = repos
        .repos
        .iter()
        .map(|repo| format!("--find-links {}", repo))
        .collect::<Vec<_>>()
        .join(" ");

    let index_args = match repos.indexes.split_first() {
        None => " --no-index ".to_string(),
        Some((primary, extra)) => {
            let mut args = format!("--index-url {}", primary);
            for url in extra {
                args.push_str(" --extra-index-url ");
                args.push_str(url);
            }
            args
        }
    };

    let constraint_arg = setup
        .requirement_constraints
        .as_deref()
        .filter(|path| !path.is_empty())
        .map(|path| format!("--constraint {}", path))
        .unwrap_or_default();

    Ok(InstallArguments { index_args, links_args, constraint_arg })
}
