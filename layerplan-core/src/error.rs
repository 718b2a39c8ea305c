//! Error types for layerplan.
//!
//! All errors use `thiserror` for ergonomic error handling and proper error chains.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for layerplan operations.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Main error type for layerplan.
#[derive(Error, Debug)]
pub enum PlanError {
    // Planner guards
    #[error("Feature not implemented: {feature}")]
    UnimplementedFeature { feature: String },

    // Content store errors
    #[error("No files matched {pattern:?} (from {origin})")]
    MissingInputFile { pattern: String, origin: String },

    #[error("Invalid glob pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Matched path {path:?} is outside the source root {root:?}")]
    PathOutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Digest not found in store: {fingerprint}")]
    DigestNotFound { fingerprint: String },

    #[error("I/O error at {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Model errors
    #[error("Invalid build component: {reason}")]
    InvalidComponent { reason: String },

    #[error("Invalid image target: {reason}")]
    InvalidTarget { reason: String },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlanError {
    /// Lockfile-based resolution is not supported by any planner.
    pub fn lockfiles_unsupported() -> Self {
        Self::UnimplementedFeature { feature: "lockfile resolves (enable_resolves)".to_string() }
    }

    /// Wrap an I/O error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError { path: path.into(), source }
    }
}
