//! Image target metadata and the declarative outputs derived from it.
//!
//! An [`ImageTarget`] wraps a [`BuildPlan`] with the surrounding image
//! instructions (base image, setup commands, working directory, command) and
//! the arguments an external `docker build` would be called with. Nothing
//! here runs a build.

use crate::component::BuildPlan;
use crate::error::{PlanError, Result};
use serde::{Deserialize, Serialize};

/// Dockerfile instruction keywords; plan lines starting with any other word
/// are shell commands and get a `RUN` prefix.
const INSTRUCTIONS: &[&str] = &[
    "ADD",
    "ARG",
    "CMD",
    "COPY",
    "ENTRYPOINT",
    "ENV",
    "EXPOSE",
    "FROM",
    "HEALTHCHECK",
    "LABEL",
    "ONBUILD",
    "RUN",
    "SHELL",
    "STOPSIGNAL",
    "USER",
    "VOLUME",
    "WORKDIR",
];

/// Render one plan line as a Dockerfile line.
fn dockerfile_line(line: &str) -> String {
    let keyword = line.split_whitespace().next().unwrap_or_default();
    if line.trim().is_empty() || INSTRUCTIONS.contains(&keyword) {
        format!("{}\n", line)
    } else {
        format!("RUN {}\n", line)
    }
}

fn default_workdir() -> String {
    "container".to_string()
}

/// A docker image containing the planned Python environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTarget {
    /// Image name (e.g., "webapp")
    pub name: String,
    /// Base image for every later step (e.g., "python:3.8.8-slim-buster")
    pub base_image: String,
    /// Commands run during the build, one layer each
    #[serde(default)]
    pub image_setup_commands: Vec<String>,
    /// Lines of the `.dockerignore` file
    #[serde(default)]
    pub docker_ignore: Vec<String>,
    /// Directory inside the container holding the application
    #[serde(default = "default_workdir")]
    pub workdir: String,
    /// Registry the image is tagged for
    #[serde(default)]
    pub registry: Option<String>,
    /// Image used with `--cache-from`
    #[serde(default)]
    pub cache_from: Option<String>,
    /// Write an inline layer cache (BuildKit)
    #[serde(default)]
    pub buildkit_inline_cache: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Command the container runs, exec form
    #[serde(default)]
    pub command: Vec<String>,
}

impl ImageTarget {
    pub fn new(name: impl Into<String>, base_image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_image: base_image.into(),
            image_setup_commands: Vec::new(),
            docker_ignore: Vec::new(),
            workdir: default_workdir(),
            registry: None,
            cache_from: None,
            buildkit_inline_cache: false,
            tags: Vec::new(),
            command: Vec::new(),
        }
    }

    /// Check the fields an image cannot be built without.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PlanError::InvalidTarget { reason: "name must not be empty".to_string() });
        }
        if self.base_image.trim().is_empty() {
            return Err(PlanError::InvalidTarget {
                reason: format!("{}: base_image is required", self.name),
            });
        }
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(PlanError::InvalidTarget {
                reason: format!("{}: tags must not be empty strings", self.name),
            });
        }
        Ok(())
    }

    /// Render the Dockerfile for this target around `plan`.
    ///
    /// The plan's commands go between the setup commands and the working
    /// directory. Lines that are already instructions (`COPY`, `ENV`, ...) are
    /// kept as is; shell commands are wrapped in `RUN`.
    pub fn render_dockerfile(&self, plan: &BuildPlan) -> Result<String> {
        self.validate()?;

        let mut out = format!("FROM {}\n", self.base_image);
        for command in &self.image_setup_commands {
            out.push_str(&format!("RUN {}\n", command));
        }
        for command in &plan.commands {
            for line in command.lines() {
                out.push_str(&dockerfile_line(line));
            }
        }
        out.push_str(&format!("WORKDIR /{}\n", self.workdir.trim_start_matches('/')));
        if !self.command.is_empty() {
            let exec = serde_json::to_string(&self.command).map_err(anyhow::Error::from)?;
            out.push_str(&format!("CMD {}\n", exec));
        }
        Ok(out)
    }

    pub fn render_dockerignore(&self) -> String {
        self.docker_ignore.iter().map(|line| format!("{}\n", line)).collect()
    }

    /// Fully qualified references the image is tagged with.
    pub fn image_refs(&self) -> Vec<String> {
        let repository = match &self.registry {
            Some(registry) => format!("{}/{}", registry.trim_end_matches('/'), self.name),
            None => self.name.clone(),
        };
        if self.tags.is_empty() {
            return vec![format!("{}:latest", repository)];
        }
        self.tags.iter().map(|tag| format!("{}:{}", repository, tag)).collect()
    }

    /// Arguments for `docker build`, run from the build context directory.
    pub fn docker_build_args(&self) -> Result<Vec<String>> {
        self.validate()?;

        let mut args = vec!["build".to_string()];
        for image_ref in self.image_refs() {
            args.push("-t".to_string());
            args.push(image_ref);
        }
        if let Some(cache_from) = &self.cache_from {
            args.push("--cache-from".to_string());
            args.push(cache_from.clone());
        }
        if self.buildkit_inline_cache {
            args.push("--build-arg".to_string());
            args.push("BUILDKIT_INLINE_CACHE=1".to_string());
        }
        args.push(".".to_string());
        Ok(args)
    }
}
