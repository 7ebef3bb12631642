use thiserror::Error;

use crate::db::DatabaseError;
use crate::error::StorageError;
use crate::generator::GeneratorError;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Rejected before any id, directory or row was created.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The job directory could not be allocated. Nothing was recorded.
    #[error("Storage unavailable: {0}")]
    Storage(#[from] StorageError),

    /// The batch aborted. A failed row was written unless `ledger_warning`
    /// says otherwise.
    #[error("Generation failed for job {job_id}: {detail}")]
    GenerationFailed {
        job_id: String,
        detail: String,
        ledger_warning: Option<String>,
    },

    /// Generation succeeded but the job row could not be written.
    #[error("Failed to record job: {0}")]
    Persistence(#[from] DatabaseError),
}

/// Why a single item of a batch failed. The first one aborts the batch.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("item {index}: {source}")]
    Generate {
        index: u32,
        #[source]
        source: GeneratorError,
    },

    #[error("item {index}: {source}")]
    Write {
        index: u32,
        #[source]
        source: StorageError,
    },

    #[error("artifact scan failed: {0}")]
    Scan(#[source] StorageError),
}
