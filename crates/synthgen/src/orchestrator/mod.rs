//! The write path: one request in, one job row out.

pub mod error;
pub mod prompt;
pub mod runner;

pub use error::{ItemError, OrchestratorError};
pub use prompt::{artifact_filename, build_prompt};
pub use runner::Orchestrator;
