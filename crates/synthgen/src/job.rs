//! Generation job domain types.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Terminal outcome of a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Value stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "succeeded" => Ok(JobStatus::Succeeded),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status '{}'", other)),
        }
    }
}

/// A generation job as tracked by the orchestrator while it runs.
///
/// The record is built in memory, mutated only while the batch executes
/// and handed to the ledger exactly once when it reaches a terminal status.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub label: String,
    pub noise_level: f64,
    pub requested_count: u32,
    pub artifact_directory: PathBuf,
    pub succeeded_count: u32,
    pub elapsed_seconds: f64,
    pub device_used: String,
    pub status: JobStatus,
    pub error_detail: Option<String>,
}

impl Job {
    /// Creates a job with a fresh id. The artifact directory is filled in
    /// once the store has allocated it.
    pub fn new(label: &str, noise_level: f64, requested_count: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            label: label.to_string(),
            noise_level,
            requested_count,
            artifact_directory: PathBuf::new(),
            succeeded_count: 0,
            elapsed_seconds: 0.0,
            device_used: String::new(),
            status: JobStatus::Failed,
            error_detail: None,
        }
    }

    pub fn with_directory(mut self, directory: &Path) -> Self {
        self.artifact_directory = directory.to_path_buf();
        self
    }

    /// Marks the job succeeded with the number of artifacts found on disk.
    pub fn succeed(&mut self, succeeded_count: u32, elapsed_seconds: f64, device: &str) {
        self.status = JobStatus::Succeeded;
        self.succeeded_count = succeeded_count;
        self.elapsed_seconds = elapsed_seconds;
        self.device_used = device.to_string();
        self.error_detail = None;
    }

    /// Marks the job failed. The recorded count is always zero, even when
    /// earlier items of the batch already wrote files.
    pub fn fail(&mut self, detail: &str, elapsed_seconds: f64, device: &str) {
        self.status = JobStatus::Failed;
        self.succeeded_count = 0;
        self.elapsed_seconds = elapsed_seconds;
        self.device_used = device.to_string();
        self.error_detail = Some(detail.to_string());
    }

    pub fn download_link(&self) -> String {
        download_link(&self.id)
    }
}

/// Relative download reference for a job.
pub fn download_link(job_id: &str) -> String {
    format!("/download/{}", job_id)
}

/// What a successful `submit` hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: String,
    pub label: String,
    pub noise_level: f64,
    pub output_size: u32,
    pub preview: Vec<String>,
    pub download_link: String,
}
