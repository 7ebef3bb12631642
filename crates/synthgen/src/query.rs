//! Read-side composition over the job ledger and the artifact store.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::db::job_repo::{JobRow, LabelCount, Order};
use crate::db::DatabaseError;
use crate::error::StorageError;
use crate::job::JobStatus;
use crate::ledger::JobLedger;
use crate::sanitize::filename_component;
use crate::storage::{ArtifactStore, ARTIFACT_EXTENSIONS};

const TOP_LABEL_LIMIT: u32 = 5;
const ARCHIVE_CONTENT_TYPE_FALLBACK: &str = "application/zip";

#[derive(Error, Debug)]
pub enum QueryError {
    /// Unknown id, or a job that cannot be downloaded.
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("No artifacts available for job {0}")]
    NoArtifacts(String),

    #[error("Ledger error: {0}")]
    Persistence(#[from] DatabaseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A ready-to-send archive of a job's artifacts.
#[derive(Debug, Clone)]
pub struct DownloadBundle {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Sum of `succeeded_count` over succeeded jobs.
    pub total_artifacts: u64,
    pub top_labels: Vec<LabelCount>,
}

/// One recent successful job with its first preview.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub job: JobRow,
    pub preview: String,
}

pub struct QueryService {
    ledger: Arc<dyn JobLedger>,
    store: ArtifactStore,
}

impl QueryService {
    pub fn new(ledger: Arc<dyn JobLedger>, store: ArtifactStore) -> Self {
        Self { ledger, store }
    }

    pub fn ledger(&self) -> &Arc<dyn JobLedger> {
        &self.ledger
    }

    /// All jobs, newest first.
    pub fn list_jobs(&self) -> Result<Vec<JobRow>, QueryError> {
        Ok(self.ledger.list_all(Order::NewestFirst)?)
    }

    pub fn find_job(&self, job_id: &str) -> Result<JobRow, QueryError> {
        self.ledger
            .find_by_id(job_id)?
            .ok_or_else(|| QueryError::NotFound(job_id.to_string()))
    }

    /// Up to `max_count` encoded artifacts. A job without artifacts yields
    /// an empty list, not an error.
    pub fn preview(&self, job_id: &str, max_count: usize) -> Result<Vec<String>, QueryError> {
        let job = self.find_job(job_id)?;
        Ok(self
            .store
            .previews(Path::new(&job.artifact_directory), max_count)?)
    }

    /// Number of artifact files currently on disk for `job`.
    pub fn file_count(&self, job: &JobRow) -> Result<usize, QueryError> {
        Ok(self
            .store
            .list_artifacts(Path::new(&job.artifact_directory), ARTIFACT_EXTENSIONS)?
            .len())
    }

    /// Bundles every artifact of a succeeded job into one ZIP archive.
    pub fn download(&self, job_id: &str) -> Result<DownloadBundle, QueryError> {
        let job = self.find_job(job_id)?;
        if !job.is_succeeded() {
            return Err(QueryError::NotFound(job_id.to_string()));
        }

        let dir = Path::new(&job.artifact_directory);
        if !dir.is_dir() {
            log::warn!("Artifact directory for job {} is missing", job_id);
            return Err(QueryError::NotFound(job_id.to_string()));
        }

        let artifacts = self.store.list_artifacts(dir, ARTIFACT_EXTENSIONS)?;
        if artifacts.is_empty() {
            return Err(QueryError::NoArtifacts(job_id.to_string()));
        }

        let bytes = self.store.bundle(&artifacts)?;
        let filename = format!("{}_{}.zip", filename_component(&job.label), job.id);
        let content_type = mime_guess::from_path(&filename)
            .first_raw()
            .unwrap_or(ARCHIVE_CONTENT_TYPE_FALLBACK)
            .to_string();

        Ok(DownloadBundle {
            filename,
            content_type,
            bytes,
        })
    }

    pub fn stats(&self) -> Result<Stats, QueryError> {
        Ok(Stats {
            total: self.ledger.count_total()?,
            succeeded: self.ledger.count_by_status(JobStatus::Succeeded)?,
            failed: self.ledger.count_by_status(JobStatus::Failed)?,
            total_artifacts: self.ledger.sum_succeeded_count(JobStatus::Succeeded)?,
            top_labels: self
                .ledger
                .top_labels(JobStatus::Succeeded, TOP_LABEL_LIMIT)?,
        })
    }

    /// The most recent succeeded jobs that still have a readable artifact.
    pub fn recent_samples(&self, limit: u32) -> Result<Vec<Sample>, QueryError> {
        let jobs = self.ledger.list_recent(JobStatus::Succeeded, limit)?;
        let mut samples = Vec::with_capacity(jobs.len());
        for job in jobs {
            let preview = self
                .store
                .previews(Path::new(&job.artifact_directory), 1)?
                .into_iter()
                .next();
            if let Some(preview) = preview {
                samples.push(Sample { job, preview });
            }
        }
        Ok(samples)
    }
}
