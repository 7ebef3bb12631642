use crate::job::JobSummary;
use crate::orchestrator::OrchestratorError;

/// A queued generation job. Ranges are validated before it is queued.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub label: String,
    pub noise_level: f64,
    pub output_size: u32,
}

impl GenerationRequest {
    pub fn new(label: impl Into<String>, noise_level: f64, output_size: u32) -> Self {
        Self {
            label: label.into(),
            noise_level,
            output_size,
        }
    }
}

/// Result of one queued job, tagged with the ticket `submit` handed out.
#[derive(Debug)]
pub struct JobOutcome {
    pub ticket: u64,
    pub request: GenerationRequest,
    pub result: Result<JobSummary, OrchestratorError>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
