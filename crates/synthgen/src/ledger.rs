//! The job ledger: one immutable row per finished job.
//!
//! [`JobLedger`] is the seam the orchestrator and query service depend on.
//! The production implementation is [`Database`]; tests swap in failing
//! ledgers to exercise the persistence error paths.

use chrono::{SecondsFormat, Utc};

use crate::db::job_repo::{self, JobRow, LabelCount, Order};
use crate::db::{Database, DatabaseError};
use crate::job::{Job, JobStatus};

/// Append-only persistence and read access for job rows.
///
/// Reads are side-effect free and only observe committed rows.
pub trait JobLedger: Send + Sync {
    /// Persists a finished job. Timestamps are stamped by the ledger.
    fn insert(&self, job: &Job) -> Result<(), DatabaseError>;

    fn list_all(&self, order: Order) -> Result<Vec<JobRow>, DatabaseError>;

    fn find_by_id(&self, id: &str) -> Result<Option<JobRow>, DatabaseError>;

    fn count_total(&self) -> Result<u64, DatabaseError>;

    fn count_by_status(&self, status: JobStatus) -> Result<u64, DatabaseError>;

    /// Distinct labels ranked by how many jobs used them.
    fn top_labels(&self, status: JobStatus, limit: u32) -> Result<Vec<LabelCount>, DatabaseError>;

    /// Distinct labels containing `substring`, ignoring ASCII case.
    fn find_labels_matching(
        &self,
        substring: &str,
        status: JobStatus,
        limit: u32,
    ) -> Result<Vec<String>, DatabaseError>;

    fn sum_succeeded_count(&self, status: JobStatus) -> Result<u64, DatabaseError>;

    /// Newest jobs with the given status.
    fn list_recent(&self, status: JobStatus, limit: u32) -> Result<Vec<JobRow>, DatabaseError>;
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl JobLedger for Database {
    fn insert(&self, job: &Job) -> Result<(), DatabaseError> {
        let row = JobRow::from_job(job, &now_timestamp());
        job_repo::insert(self, &row)?;
        log::debug!("Recorded job {} as {}", job.id, job.status);
        Ok(())
    }

    fn list_all(&self, order: Order) -> Result<Vec<JobRow>, DatabaseError> {
        job_repo::list_all(self, order)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<JobRow>, DatabaseError> {
        job_repo::find_by_id(self, id)
    }

    fn count_total(&self) -> Result<u64, DatabaseError> {
        job_repo::count_total(self)
    }

    fn count_by_status(&self, status: JobStatus) -> Result<u64, DatabaseError> {
        job_repo::count_by_status(self, status)
    }

    fn top_labels(&self, status: JobStatus, limit: u32) -> Result<Vec<LabelCount>, DatabaseError> {
        job_repo::top_labels(self, status, limit)
    }

    fn find_labels_matching(
        &self,
        substring: &str,
        status: JobStatus,
        limit: u32,
    ) -> Result<Vec<String>, DatabaseError> {
        job_repo::find_labels_matching(self, substring, status, limit)
    }

    fn sum_succeeded_count(&self, status: JobStatus) -> Result<u64, DatabaseError> {
        job_repo::sum_succeeded_count(self, status)
    }

    fn list_recent(&self, status: JobStatus, limit: u32) -> Result<Vec<JobRow>, DatabaseError> {
        job_repo::list_by_status(self, status, limit)
    }
}
