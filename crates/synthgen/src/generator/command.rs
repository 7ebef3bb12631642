use std::process::{Command, Stdio};

use crate::generator::{
    GeneratedArtifact, GenerationMetadata, Generator, GeneratorError, InferenceParams,
};

/// Runs an external program once per artifact.
///
/// The prompt and parameters are passed as `SYNTHGEN_*` environment
/// variables; whatever the program writes to stdout is the artifact.
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
    device: String,
    extension: String,
}

impl CommandGenerator {
    pub fn new(program: String, args: Vec<String>, device: &str, extension: &str) -> Self {
        Self {
            program,
            args,
            device: device.to_string(),
            extension: extension.to_ascii_lowercase(),
        }
    }

    fn command(&self, prompt: &str, params: &InferenceParams) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env("SYNTHGEN_PROMPT", prompt)
            .env("SYNTHGEN_STEPS", params.steps.to_string())
            .env("SYNTHGEN_GUIDANCE_SCALE", params.guidance_scale.to_string())
            .env("SYNTHGEN_WIDTH", params.width.to_string())
            .env("SYNTHGEN_HEIGHT", params.height.to_string())
            .env("SYNTHGEN_DEVICE", &self.device)
            .env("SYNTHGEN_FORMAT", &self.extension)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(seed) = params.seed {
            command.env("SYNTHGEN_SEED", seed.to_string());
        }

        command
    }
}

impl Generator for CommandGenerator {
    fn generate(
        &self,
        prompt: &str,
        params: &InferenceParams,
    ) -> Result<GeneratedArtifact, GeneratorError> {
        let _span = tracing::debug_span!("generator.command", program = %self.program).entered();

        let output = self
            .command(prompt, params)
            .output()
            .map_err(|e| GeneratorError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(GeneratorError::Exited {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        if output.stdout.is_empty() {
            return Err(GeneratorError::EmptyOutput {
                program: self.program.clone(),
            });
        }

        Ok(GeneratedArtifact {
            bytes: output.stdout,
            extension: self.extension.clone(),
            metadata: GenerationMetadata::new(&self.device, params),
        })
    }

    fn device(&self) -> &str {
        &self.device
    }
}
