//! Framework-agnostic request handlers.
//!
//! Each handler takes typed input, calls into the orchestrator or the query
//! service and returns either a serializable response or an [`ApiError`]
//! carrying the HTTP status a transport should use.

pub mod dto;

use std::sync::Arc;

use crate::orchestrator::{Orchestrator, OrchestratorError};
use crate::query::{QueryError, QueryService};
use crate::suggest;

pub use dto::{
    DatasetEntry, DownloadResponse, ErrorResponse, GenerateRequest, GenerateResponse,
    HealthResponse, PreviewResponse, SampleEntry, SamplesResponse, StatsResponse,
    SuggestionsResponse, ValidationError,
};

const SAMPLE_LIMIT: u32 = 10;

/// A failed request: status code plus a human-readable message.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: 404,
            message: message.into(),
            details: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: 500,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn body(&self) -> ErrorResponse {
        ErrorResponse {
            success: false,
            error: self.message.clone(),
            details: self.details.clone(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::bad_request(err.0)
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::InvalidRequest(message) => ApiError::bad_request(message),
            OrchestratorError::GenerationFailed {
                detail,
                ledger_warning,
                ..
            } => {
                let error = ApiError::internal(format!("Image generation failed: {}", detail));
                match ledger_warning {
                    Some(warning) => error.with_details(format!("job was not recorded: {}", warning)),
                    None => error,
                }
            }
            other => ApiError::internal(format!("Image generation failed: {}", other)),
        }
    }
}

fn query_error(context: &str, err: QueryError) -> ApiError {
    match err {
        QueryError::NotFound(_) | QueryError::NoArtifacts(_) => {
            ApiError::not_found(err.to_string())
        }
        other => ApiError::internal(format!("{}: {}", context, other)),
    }
}

pub struct Api {
    orchestrator: Arc<Orchestrator>,
    queries: QueryService,
    max_output_size: u32,
    preview_count: usize,
}

impl Api {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        queries: QueryService,
        max_output_size: u32,
        preview_count: usize,
    ) -> Self {
        Self {
            orchestrator,
            queries,
            max_output_size,
            preview_count,
        }
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "OK".to_string(),
        }
    }

    pub fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ApiError> {
        request.validate(self.max_output_size)?;
        Ok(self
            .orchestrator
            .submit(&request.label, request.noise_level, request.output_size)?)
    }

    pub fn datasets(&self) -> Result<Vec<DatasetEntry>, ApiError> {
        let jobs = self
            .queries
            .list_jobs()
            .map_err(|e| query_error("Failed to fetch datasets", e))?;
        Ok(jobs.into_iter().map(DatasetEntry::from).collect())
    }

    pub fn preview(&self, id: &str) -> Result<PreviewResponse, ApiError> {
        let job = self
            .queries
            .find_job(id)
            .map_err(|e| query_error("Failed to get preview", e))?;
        let preview = self
            .queries
            .preview(id, self.preview_count)
            .map_err(|e| query_error("Failed to get preview", e))?;
        Ok(PreviewResponse {
            id: job.id,
            label: job.label,
            preview,
        })
    }

    pub fn download(&self, id: &str) -> Result<DownloadResponse, ApiError> {
        let bundle = self
            .queries
            .download(id)
            .map_err(|e| query_error("Failed to create download", e))?;
        Ok(DownloadResponse {
            filename: bundle.filename,
            content_type: bundle.content_type,
            size: bundle.bytes.len(),
            bytes: bundle.bytes,
        })
    }

    pub fn stats(&self) -> Result<StatsResponse, ApiError> {
        let stats = self
            .queries
            .stats()
            .map_err(|e| query_error("Failed to get stats", e))?;
        Ok(StatsResponse {
            total_generations: stats.total,
            successful_generations: stats.succeeded,
            failed_generations: stats.failed,
            total_images: stats.total_artifacts,
            popular_labels: stats.top_labels,
        })
    }

    pub fn samples(&self) -> Result<SamplesResponse, ApiError> {
        let samples = self
            .queries
            .recent_samples(SAMPLE_LIMIT)
            .map_err(|e| query_error("Failed to get samples", e))?;
        Ok(SamplesResponse {
            samples: samples.into_iter().map(SampleEntry::from).collect(),
        })
    }

    pub fn suggest_labels(&self, query: &str) -> SuggestionsResponse {
        SuggestionsResponse {
            suggestions: suggest::suggest_labels(self.queries.ledger().as_ref(), query),
        }
    }

    pub fn suggest_noise(&self, query: &str) -> SuggestionsResponse {
        SuggestionsResponse {
            suggestions: suggest::suggest_noise(query),
        }
    }
}
