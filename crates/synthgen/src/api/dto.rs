//! Request and response shapes of the boundary layer (camelCase JSON).

use serde::{Deserialize, Serialize};

use crate::db::job_repo::{JobRow, LabelCount};
use crate::job::JobSummary;
use crate::query::Sample;

/// Longest accepted label, in bytes. Artifact names are the label plus a
/// short suffix and must fit a single file name component.
pub const MAX_LABEL_BYTES: usize = 200;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub label: String,
    pub noise_level: f64,
    pub output_size: u32,
}

/// Why a request was rejected before reaching the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl GenerateRequest {
    /// Pure check of every field against its allowed range.
    pub fn validate(&self, max_output_size: u32) -> Result<(), ValidationError> {
        let label = self.label.trim();
        if label.is_empty() {
            return Err(ValidationError("label cannot be empty".to_string()));
        }
        if label.len() > MAX_LABEL_BYTES {
            return Err(ValidationError(format!(
                "label must be at most {} bytes, got {}",
                MAX_LABEL_BYTES,
                label.len()
            )));
        }
        if !(0.0..=1.0).contains(&self.noise_level) {
            return Err(ValidationError(format!(
                "noiseLevel must be between 0 and 1, got {}",
                self.noise_level
            )));
        }
        if self.output_size < 1 || self.output_size > max_output_size {
            return Err(ValidationError(format!(
                "outputSize must be between 1 and {}, got {}",
                max_output_size, self.output_size
            )));
        }
        Ok(())
    }
}

pub type GenerateResponse = JobSummary;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetEntry {
    pub id: String,
    pub label: String,
    pub noise_level: f64,
    pub output_size: u32,
    pub created_at: String,
    pub file_count: u32,
}

impl From<JobRow> for DatasetEntry {
    fn from(row: JobRow) -> Self {
        Self {
            id: row.id,
            label: row.label,
            noise_level: row.noise_level,
            output_size: row.requested_count,
            created_at: row.created_at,
            file_count: row.succeeded_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub id: String,
    pub label: String,
    pub preview: Vec<String>,
}

/// Archive payload. The bytes travel out of band, only the headers are
/// serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub filename: String,
    pub content_type: String,
    pub size: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_generations: u64,
    pub successful_generations: u64,
    pub failed_generations: u64,
    pub total_images: u64,
    pub popular_labels: Vec<LabelCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleEntry {
    pub id: String,
    pub label: String,
    pub preview: String,
    pub created_at: String,
    pub file_count: u32,
}

impl From<Sample> for SampleEntry {
    fn from(sample: Sample) -> Self {
        Self {
            id: sample.job.id,
            label: sample.job.label,
            preview: sample.preview,
            created_at: sample.job.created_at,
            file_count: sample.job.succeeded_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplesResponse {
    pub samples: Vec<SampleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
