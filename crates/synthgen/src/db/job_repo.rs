//! Job repository: append-only writes and reads for the `jobs` table.

use rusqlite::{params, Row};
use serde::Serialize;

use super::{Database, DatabaseError};
use crate::job::{Job, JobStatus};

/// A raw job row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub id: String,
    pub label: String,
    pub noise_level: f64,
    pub requested_count: u32,
    pub artifact_directory: String,
    pub succeeded_count: u32,
    pub elapsed_seconds: f64,
    pub device_used: String,
    pub status: String,
    pub error_detail: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            label: row.get("label")?,
            noise_level: row.get("noise_level")?,
            requested_count: row.get("requested_count")?,
            artifact_directory: row.get("artifact_directory")?,
            succeeded_count: row.get("succeeded_count")?,
            elapsed_seconds: row.get("elapsed_seconds")?,
            device_used: row.get("device_used")?,
            status: row.get("status")?,
            error_detail: row.get("error_detail")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Builds the row for a finished job, stamped with `timestamp`.
    pub fn from_job(job: &Job, timestamp: &str) -> Self {
        Self {
            id: job.id.clone(),
            label: job.label.clone(),
            noise_level: job.noise_level,
            requested_count: job.requested_count,
            artifact_directory: job.artifact_directory.display().to_string(),
            succeeded_count: job.succeeded_count,
            elapsed_seconds: job.elapsed_seconds,
            device_used: job.device_used.clone(),
            status: job.status.as_str().to_string(),
            error_detail: job.error_detail.clone(),
            created_at: timestamp.to_string(),
            updated_at: timestamp.to_string(),
        }
    }

    /// Parses the stored status value.
    pub fn job_status(&self) -> Result<JobStatus, DatabaseError> {
        self.status
            .parse()
            .map_err(|_| DatabaseError::CorruptValue {
                column: "status",
                value: self.status.clone(),
            })
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == JobStatus::Succeeded.as_str()
    }
}

/// Listing order by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl Order {
    fn sql(&self) -> &'static str {
        match self {
            Order::NewestFirst => "ORDER BY created_at DESC, rowid DESC",
            Order::OldestFirst => "ORDER BY created_at ASC, rowid ASC",
        }
    }
}

/// One entry of a label frequency ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}

/// Inserts a new job row. A duplicate id is rejected by the primary key.
pub fn insert(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jobs (id, label, noise_level, requested_count, artifact_directory,
             succeeded_count, elapsed_seconds, device_used, status, error_detail,
             created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                job.id,
                job.label,
                job.noise_level,
                job.requested_count,
                job.artifact_directory,
                job.succeeded_count,
                job.elapsed_seconds,
                job.device_used,
                job.status,
                job.error_detail,
                job.created_at,
                job.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], JobRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Returns every job in the requested order.
pub fn list_all(db: &Database, order: Order) -> Result<Vec<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!("SELECT * FROM jobs {}", order.sql());
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Returns the most recent jobs with the given status.
pub fn list_by_status(
    db: &Database,
    status: JobStatus,
    limit: u32,
) -> Result<Vec<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!(
            "SELECT * FROM jobs WHERE status = ?1 {} LIMIT ?2",
            Order::NewestFirst.sql()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![status.as_str(), limit], JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts all jobs.
pub fn count_total(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM jobs", [], |r| r.get(0))?;
        Ok(count)
    })
}

/// Counts jobs with the given status.
pub fn count_by_status(db: &Database, status: JobStatus) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE status = ?1",
            params![status.as_str()],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Sums `succeeded_count` across jobs with the given status.
pub fn sum_succeeded_count(db: &Database, status: JobStatus) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let total: u64 = conn.query_row(
            "SELECT COALESCE(SUM(succeeded_count), 0) FROM jobs WHERE status = ?1",
            params![status.as_str()],
            |r| r.get(0),
        )?;
        Ok(total)
    })
}

/// Distinct labels of jobs with the given status, most frequent first.
/// Equal counts are ordered by label.
pub fn top_labels(
    db: &Database,
    status: JobStatus,
    limit: u32,
) -> Result<Vec<LabelCount>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT label, COUNT(*) AS n FROM jobs WHERE status = ?1
             GROUP BY label ORDER BY n DESC, label ASC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![status.as_str(), limit], |row| {
                Ok(LabelCount {
                    label: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Distinct labels of jobs with the given status containing `substring`
/// (ASCII case-insensitive).
pub fn find_labels_matching(
    db: &Database,
    substring: &str,
    status: JobStatus,
    limit: u32,
) -> Result<Vec<String>, DatabaseError> {
    let pattern = format!("%{}%", escape_like(substring));
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT label FROM jobs
             WHERE label LIKE ?1 ESCAPE '\\' AND status = ?2
             ORDER BY label ASC LIMIT ?3",
        )?;
        let rows = stmt
            .query_map(params![pattern, status.as_str(), limit], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rows)
    })
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn sample_row(id: &str, label: &str, status: JobStatus) -> JobRow {
        JobRow {
            id: id.to_string(),
            label: label.to_string(),
            noise_level: 0.1,
            requested_count: 2,
            artifact_directory: format!("/tmp/generations/{}", id),
            succeeded_count: if status == JobStatus::Succeeded { 2 } else { 0 },
            elapsed_seconds: 1.25,
            device_used: "cpu".to_string(),
            status: status.as_str().to_string(),
            error_detail: if status == JobStatus::Failed {
                Some("boom".to_string())
            } else {
                None
            },
            created_at: "2026-01-01T00:00:00.000000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000000Z".to_string(),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        insert(&db, &sample_row("job-1", "cat", JobStatus::Succeeded)).unwrap();

        let found = find_by_id(&db, "job-1").unwrap().unwrap();
        assert_eq!(found.label, "cat");
        assert_eq!(found.job_status().unwrap(), JobStatus::Succeeded);
        assert_eq!(found.succeeded_count, 2);
        assert!(found.error_detail.is_none());
    }

    #[test]
    fn test_find_nonexistent() {
        let db = test_db();
        assert!(find_by_id(&db, "nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let db = test_db();
        insert(&db, &sample_row("dup", "cat", JobStatus::Succeeded)).unwrap();
        let second = insert(&db, &sample_row("dup", "cat", JobStatus::Failed));
        assert!(matches!(second, Err(DatabaseError::Sqlite(_))));
        assert_eq!(count_total(&db).unwrap(), 1);
    }

    #[test]
    fn test_list_all_newest_first() {
        let db = test_db();
        for i in 0..3 {
            let mut row = sample_row(&format!("l{}", i), "cat", JobStatus::Succeeded);
            row.created_at = format!("2026-01-0{}T00:00:00.000000Z", i + 1);
            insert(&db, &row).unwrap();
        }

        let rows = list_all(&db, Order::NewestFirst).unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["l2", "l1", "l0"]);

        let rows = list_all(&db, Order::OldestFirst).unwrap();
        assert_eq!(rows[0].id, "l0");
    }

    #[test]
    fn test_list_all_breaks_timestamp_ties_by_insertion() {
        let db = test_db();
        insert(&db, &sample_row("first", "cat", JobStatus::Succeeded)).unwrap();
        insert(&db, &sample_row("second", "cat", JobStatus::Succeeded)).unwrap();

        let rows = list_all(&db, Order::NewestFirst).unwrap();
        assert_eq!(rows[0].id, "second");
    }

    #[test]
    fn test_list_by_status_limits() {
        let db = test_db();
        for i in 0..4 {
            insert(&db, &sample_row(&format!("s{}", i), "cat", JobStatus::Succeeded)).unwrap();
        }
        insert(&db, &sample_row("f0", "cat", JobStatus::Failed)).unwrap();

        let rows = list_by_status(&db, JobStatus::Succeeded, 3).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.is_succeeded()));
    }

    #[test]
    fn test_counts() {
        let db = test_db();
        insert(&db, &sample_row("c1", "cat", JobStatus::Succeeded)).unwrap();
        insert(&db, &sample_row("c2", "dog", JobStatus::Succeeded)).unwrap();
        insert(&db, &sample_row("c3", "cat", JobStatus::Failed)).unwrap();

        assert_eq!(count_total(&db).unwrap(), 3);
        assert_eq!(count_by_status(&db, JobStatus::Succeeded).unwrap(), 2);
        assert_eq!(count_by_status(&db, JobStatus::Failed).unwrap(), 1);
        assert_eq!(sum_succeeded_count(&db, JobStatus::Succeeded).unwrap(), 4);
        assert_eq!(sum_succeeded_count(&db, JobStatus::Failed).unwrap(), 0);
    }

    #[test]
    fn test_sum_on_empty_table_is_zero() {
        let db = test_db();
        assert_eq!(sum_succeeded_count(&db, JobStatus::Succeeded).unwrap(), 0);
    }

    #[test]
    fn test_top_labels_ranked_by_frequency() {
        let db = test_db();
        insert(&db, &sample_row("t1", "dog", JobStatus::Succeeded)).unwrap();
        insert(&db, &sample_row("t2", "cat", JobStatus::Succeeded)).unwrap();
        insert(&db, &sample_row("t3", "cat", JobStatus::Succeeded)).unwrap();
        insert(&db, &sample_row("t4", "bird", JobStatus::Succeeded)).unwrap();
        insert(&db, &sample_row("t5", "bird", JobStatus::Failed)).unwrap();
        insert(&db, &sample_row("t6", "bird", JobStatus::Failed)).unwrap();

        let top = top_labels(&db, JobStatus::Succeeded, 5).unwrap();
        assert_eq!(
            top,
            vec![
                LabelCount {
                    label: "cat".to_string(),
                    count: 2
                },
                LabelCount {
                    label: "bird".to_string(),
                    count: 1
                },
                LabelCount {
                    label: "dog".to_string(),
                    count: 1
                },
            ]
        );

        let top = top_labels(&db, JobStatus::Succeeded, 1).unwrap();
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn test_find_labels_matching_is_distinct_and_case_insensitive() {
        let db = test_db();
        insert(&db, &sample_row("m1", "Red Car", JobStatus::Succeeded)).unwrap();
        insert(&db, &sample_row("m2", "Red Car", JobStatus::Succeeded)).unwrap();
        insert(&db, &sample_row("m3", "racecar", JobStatus::Succeeded)).unwrap();
        insert(&db, &sample_row("m4", "carrot", JobStatus::Failed)).unwrap();

        let labels = find_labels_matching(&db, "CAR", JobStatus::Succeeded, 5).unwrap();
        assert_eq!(labels, vec!["Red Car".to_string(), "racecar".to_string()]);
    }

    #[test]
    fn test_find_labels_matching_treats_wildcards_literally() {
        let db = test_db();
        insert(&db, &sample_row("w1", "cat", JobStatus::Succeeded)).unwrap();
        insert(&db, &sample_row("w2", "100%_real", JobStatus::Succeeded)).unwrap();

        let labels = find_labels_matching(&db, "%", JobStatus::Succeeded, 5).unwrap();
        assert_eq!(labels, vec!["100%_real".to_string()]);
    }

    #[test]
    fn test_from_job_copies_fields() {
        let mut job = Job::new("cat", 0.3, 4);
        job.fail("generator crashed", 0.5, "cpu");
        let row = JobRow::from_job(&job, "2026-03-01T00:00:00Z");
        assert_eq!(row.id, job.id);
        assert_eq!(row.status, "failed");
        assert_eq!(row.succeeded_count, 0);
        assert_eq!(row.error_detail.as_deref(), Some("generator crashed"));
        assert_eq!(row.created_at, row.updated_at);
    }
}
