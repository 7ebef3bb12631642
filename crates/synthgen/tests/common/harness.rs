//! Test harness for isolated end-to-end generation runs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

use synthgen::api::Api;
use synthgen::generator::{GeneratedArtifact, GenerationMetadata, GeneratorError};
use synthgen::{ArtifactStore, Database, Generator, InferenceParams, Orchestrator, QueryService};

/// Generator that succeeds until its `fail_on`-th call (1-based).
pub struct ScriptedGenerator {
    calls: AtomicU32,
    fail_on: Option<u32>,
}

impl ScriptedGenerator {
    pub fn always_ok() -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_on: None,
        }
    }

    pub fn failing_on(call: u32) -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_on: Some(call),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Generator for ScriptedGenerator {
    fn generate(
        &self,
        prompt: &str,
        params: &InferenceParams,
    ) -> Result<GeneratedArtifact, GeneratorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(call) {
            return Err(GeneratorError::Exited {
                program: "scripted".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "out of memory".to_string(),
            });
        }

        let mut bytes = vec![0x89, b'P', b'N', b'G'];
        bytes.extend_from_slice(prompt.as_bytes());
        Ok(GeneratedArtifact {
            bytes,
            extension: "png".to_string(),
            metadata: GenerationMetadata::new("cpu", params),
        })
    }

    fn device(&self) -> &str {
        "cpu"
    }
}

/// Isolated environment: one temp output directory, one in-memory ledger.
pub struct TestHarness {
    temp_dir: TempDir,
    pub output_dir: PathBuf,
    pub db: Database,
    pub generator: Arc<ScriptedGenerator>,
    pub orchestrator: Arc<Orchestrator>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_generator(ScriptedGenerator::always_ok())
    }

    pub fn with_generator(generator: ScriptedGenerator) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let output_dir = temp_dir.path().join("generations");
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let generator = Arc::new(generator);

        let orchestrator = Arc::new(Orchestrator::new(
            generator.clone(),
            ArtifactStore::new(&output_dir),
            Arc::new(db.clone()),
            3,
        ));

        Self {
            temp_dir,
            output_dir,
            db,
            generator,
            orchestrator,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.output_dir)
    }

    pub fn queries(&self) -> QueryService {
        QueryService::new(Arc::new(self.db.clone()), self.store())
    }

    pub fn api(&self) -> Api {
        Api::new(self.orchestrator.clone(), self.queries(), 10, 3)
    }

    /// Number of job directories under the output directory.
    pub fn job_dir_count(&self) -> usize {
        match std::fs::read_dir(&self.output_dir) {
            Ok(entries) => entries.filter_map(|e| e.ok()).count(),
            Err(_) => 0,
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
