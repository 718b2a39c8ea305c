//! layerplan core library
//!
//! Plans the image-build instructions that set up a Python runtime
//! environment: a virtual environment, then the pip install layers for its
//! requirements. Output is declarative; nothing is built or executed.

pub mod component;
pub mod config;
pub mod error;
pub mod image;
pub mod observability;
pub mod python;
pub mod store;

// Re-export commonly used items
pub use component::{BuildComponent, BuildPlan};
pub use config::{DockerOptions, PlanConfig, PythonRepos, PythonSetup};
pub use error::{PlanError, Result};
pub use image::ImageTarget;
pub use python::{
    derive_install_args, plan_python_environment, plan_requirement_install, plan_virtual_env,
    InstallArguments, VirtualEnvRequest,
};
pub use store::{
    DigestHandle, FileContentStore, GlobMatchErrorBehavior, LocalContentStore, PathGlobs,
};
