//! Planner for the pip install layers of requirement specifiers.

use super::install_args::{derive_install_args, InstallArguments};
use crate::component::BuildComponent;
use crate::config::{PythonRepos, PythonSetup};
use crate::error::Result;
use tracing::debug;

/// Plan the pip install commands for `requirements`.
///
/// With `multiline` set, each requirement gets its own command (and build
/// layer), in input order. Otherwise all requirements share one command. An
/// empty requirement list yields a component with no commands.
pub fn plan_requirement_install<S: AsRef<str>>(
    requirements: &[S],
    setup: &PythonSetup,
    repos: &PythonRepos,
    multiline: bool,
) -> Result<BuildComponent> {
    let args = derive_install_args(setup, repos)?;

    if requirements.is_empty() {
        debug!("No requirements to install");
        return Ok(BuildComponent::new(Vec::new()));
    }

    let commands: Vec<String> = if multiline {
        requirements.iter().map(|req| install_command(&args, req.as_ref())).collect()
    } else {
        let joined = requirements.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
        vec![install_command(&args, &joined)]
    };

    debug!(requirements = requirements.len(), layers = commands.len(), "Planned pip install");
    Ok(BuildComponent::new(commands))
}

fn install_command(args: &InstallArguments, requirements: &str) -> String {
    format!(
        "python -m pip install {} {} {} {}\n",
        args.index_args, args.links_args, args.constraint_arg, requirements
    )
}

/// Extract requirement specifiers from requirements.txt content.
///
/// Blank lines, comments and pip option lines (`-r`, `--hash`, ...) are
/// dropped; order is kept.
pub fn parse_requirements_txt(content: &str) -> Vec<String> {
    content
        .lines()
        .map(strip_comment)
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .map(String::from)
        .collect()
}

/// Drop a `#` comment that starts the line or follows whitespace.
fn strip_comment(line: &str) -> &str {
    let mut prev_is_space = true;
    for (idx, ch) in line.char_indices() {
        if ch == '#' && prev_is_space {
            return &line[..idx];
        }
        prev_is_space = ch.is_whitespace();
    }
    line
}
