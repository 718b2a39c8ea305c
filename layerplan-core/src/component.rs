//! Build components and their concatenation into a build plan.
//!
//! A component is one planner's contribution to the image: an ordered list of
//! newline-terminated commands plus, optionally, the digest of files those
//! commands need in the build context.

use crate::error::{PlanError, Result};
use crate::store::DigestHandle;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Commands and input files contributed by a single planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildComponent {
    commands: Vec<String>,
    sources: Option<DigestHandle>,
}

impl BuildComponent {
    /// Create a component that needs no files from the build context.
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands, sources: None }
    }

    /// Create a component whose commands consume `sources`.
    ///
    /// At least one command must be a `COPY` instruction, otherwise the files
    /// would never reach the image.
    pub fn with_sources(commands: Vec<String>, sources: DigestHandle) -> Result<Self> {
        if !commands.iter().any(|c| c.starts_with("COPY ")) {
            return Err(PlanError::InvalidComponent {
                reason: format!(
                    "sources {} attached without a COPY command to consume them",
                    sources.fingerprint
                ),
            });
        }
        Ok(Self { commands, sources: Some(sources) })
    }

    /// Commands in execution order.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Files that must be materialized before the commands run.
    pub fn sources(&self) -> Option<&DigestHandle> {
        self.sources.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// The concatenation of several components, in caller-chosen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub commands: Vec<String>,
    /// Referenced digests, first occurrence wins
    pub sources: Vec<DigestHandle>,
}

impl BuildPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a plan by appending each component in iteration order.
    pub fn from_components<I>(components: I) -> Self
    where
        I: IntoIterator<Item = BuildComponent>,
    {
        let mut plan = Self::new();
        for component in components {
            plan.push(component);
        }
        plan
    }

    /// Append a component's commands and record its sources.
    pub fn push(&mut self, component: BuildComponent) {
        let BuildComponent { commands, sources } = component;
        self.commands.extend(commands);
        if let Some(handle) = sources {
            if !self.sources.iter().any(|s| s.fingerprint == handle.fingerprint) {
                self.sources.push(handle);
            }
        }
    }

    /// Every file path referenced by the plan's sources, deduplicated.
    pub fn source_files(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.sources
            .iter()
            .flat_map(|s| s.files.iter())
            .map(String::as_str)
            .filter(|f| seen.insert(*f))
            .collect()
    }

    /// The command sequence as it will be written into the build script.
    pub fn render(&self) -> String {
        self.commands.concat()
    }
}
