use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, info_span, warn};

use crate::config::schema::MAX_PREVIEW_COUNT;
use crate::generator::{Generator, InferenceParams};
use crate::job::{Job, JobSummary};
use crate::ledger::JobLedger;
use crate::storage::{ArtifactDir, ArtifactStore, ARTIFACT_EXTENSIONS};

use super::error::{ItemError, OrchestratorError};
use super::prompt::{artifact_filename, build_prompt};

/// Runs generation jobs end to end.
///
/// `submit` blocks for the whole batch. The orchestrator holds no per-job
/// state, so one instance can serve concurrent submissions from several
/// threads.
pub struct Orchestrator {
    generator: Arc<dyn Generator>,
    store: ArtifactStore,
    ledger: Arc<dyn JobLedger>,
    params: InferenceParams,
    preview_count: usize,
}

impl Orchestrator {
    pub fn new(
        generator: Arc<dyn Generator>,
        store: ArtifactStore,
        ledger: Arc<dyn JobLedger>,
        preview_count: usize,
    ) -> Self {
        Self {
            generator,
            store,
            ledger,
            params: InferenceParams::default(),
            preview_count: preview_count.min(MAX_PREVIEW_COUNT),
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Executes one job and records it exactly once.
    ///
    /// Ranges of `noise_level` and `requested_count` are expected to be
    /// validated by the caller.
    pub fn submit(
        &self,
        label: &str,
        noise_level: f64,
        requested_count: u32,
    ) -> Result<JobSummary, OrchestratorError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(OrchestratorError::InvalidRequest(
                "label must not be empty".to_string(),
            ));
        }
        if requested_count == 0 {
            return Err(OrchestratorError::InvalidRequest(
                "requested count must be at least 1".to_string(),
            ));
        }

        let job = Job::new(label, noise_level, requested_count);
        let _job_span = info_span!("generation_job",
            job_id = %job.id,
            label = %job.label,
            requested = requested_count,
        )
        .entered();

        let dir = self.store.allocate(&job.id)?;
        let mut job = job.with_directory(dir.path());

        info!("Starting batch of {}", requested_count);
        let started = Instant::now();
        let outcome = self.run_batch(&job, &dir);
        let elapsed = started.elapsed().as_secs_f64();

        match outcome {
            Ok(produced) => {
                job.succeed(produced, elapsed, self.generator.device());
                self.record_success(&job, &dir)
            }
            Err(e) => {
                job.fail(&e.to_string(), elapsed, self.generator.device());
                Err(self.record_failure(&job))
            }
        }
    }

    /// Generates every item in order, stopping at the first error. Returns
    /// the number of artifacts found on disk afterwards.
    fn run_batch(&self, job: &Job, dir: &ArtifactDir) -> Result<u32, ItemError> {
        for index in 1..=job.requested_count {
            let _item = info_span!("generate_item", index).entered();
            self.generate_item(&job.label, index, dir)?;
        }

        let artifacts = self
            .store
            .list_artifacts(dir.path(), ARTIFACT_EXTENSIONS)
            .map_err(ItemError::Scan)?;
        Ok(artifacts.len() as u32)
    }

    fn generate_item(&self, label: &str, index: u32, dir: &ArtifactDir) -> Result<(), ItemError> {
        let prompt = build_prompt(label, index);
        let artifact = self
            .generator
            .generate(&prompt, &self.params)
            .map_err(|source| ItemError::Generate { index, source })?;

        let filename = artifact_filename(label, index, &artifact.extension);
        self.store
            .write_artifact(dir, &filename, &artifact.bytes)
            .map_err(|source| ItemError::Write { index, source })?;

        debug!(filename = %filename, device = %artifact.metadata.device, "Artifact written");
        Ok(())
    }

    fn record_success(
        &self,
        job: &Job,
        dir: &ArtifactDir,
    ) -> Result<JobSummary, OrchestratorError> {
        // No failure row on this path: the artifacts are real, only the record is missing.
        self.ledger.insert(job)?;

        let preview = self
            .store
            .previews(dir.path(), self.preview_count)
            .unwrap_or_else(|e| {
                warn!("Previews unavailable: {}", e);
                Vec::new()
            });

        info!(
            produced = job.succeeded_count,
            elapsed_seconds = job.elapsed_seconds,
            "Job succeeded"
        );

        Ok(JobSummary {
            id: job.id.clone(),
            label: job.label.clone(),
            noise_level: job.noise_level,
            output_size: job.requested_count,
            preview,
            download_link: job.download_link(),
        })
    }

    fn record_failure(&self, job: &Job) -> OrchestratorError {
        let detail = job.error_detail.clone().unwrap_or_default();
        warn!("Job failed: {}", detail);

        let ledger_warning = match self.ledger.insert(job) {
            Ok(()) => None,
            Err(e) => {
                error!("Failed to record failed job: {}", e);
                Some(e.to_string())
            }
        };

        OrchestratorError::GenerationFailed {
            job_id: job.id.clone(),
            detail,
            ledger_warning,
        }
    }
}
