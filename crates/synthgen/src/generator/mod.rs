//! Generation backends.
//!
//! The orchestrator only sees the [`Generator`] trait. Which backend runs is
//! decided once at startup from the `generator` config section.

pub mod command;
pub mod placeholder;

use std::sync::Arc;

use thiserror::Error;

use crate::config::schema::{GeneratorConfig, GeneratorKind};
use crate::error::ConfigError;

pub use command::CommandGenerator;
pub use placeholder::PlaceholderGenerator;

/// Parameters passed to every generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceParams {
    pub steps: u32,
    pub guidance_scale: f32,
    pub width: u32,
    pub height: u32,
    /// `None` means every call draws fresh randomness.
    pub seed: Option<u64>,
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            steps: 20,
            guidance_scale: 7.5,
            width: 512,
            height: 512,
            seed: None,
        }
    }
}

/// What a backend reports alongside the artifact bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationMetadata {
    pub device: String,
    pub steps: u32,
    pub guidance_scale: f32,
    pub width: u32,
    pub height: u32,
}

impl GenerationMetadata {
    pub fn new(device: &str, params: &InferenceParams) -> Self {
        Self {
            device: device.to_string(),
            steps: params.steps,
            guidance_scale: params.guidance_scale,
            width: params.width,
            height: params.height,
        }
    }
}

pub struct GeneratedArtifact {
    pub bytes: Vec<u8>,
    /// File extension without the dot, e.g. `png`.
    pub extension: String,
    pub metadata: GenerationMetadata,
}

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Failed to start generator '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Generator '{program}' exited with {status}: {stderr}")]
    Exited {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Generator '{program}' produced no output")]
    EmptyOutput { program: String },

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// A blocking generation routine. One call produces one artifact.
///
/// Implementations must tolerate being called from several worker threads,
/// but callers never issue concurrent calls for the same job.
pub trait Generator: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
        params: &InferenceParams,
    ) -> Result<GeneratedArtifact, GeneratorError>;

    /// Identifier of the compute target, recorded on every job.
    fn device(&self) -> &str;
}

/// Builds the configured backend.
pub fn from_config(config: &GeneratorConfig) -> Result<Arc<dyn Generator>, ConfigError> {
    match config.kind {
        GeneratorKind::Command => {
            let program = config.program.clone().ok_or_else(|| ConfigError::Validation {
                message: "generator.program is required when generator.kind is 'command'"
                    .to_string(),
            })?;
            Ok(Arc::new(CommandGenerator::new(
                program,
                config.args.clone(),
                &config.device,
                &config.extension,
            )))
        }
        GeneratorKind::Placeholder => Ok(Arc::new(PlaceholderGenerator::new(&config.device))),
    }
}
