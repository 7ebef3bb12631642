pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod job;
pub mod ledger;
pub mod orchestrator;
pub mod query;
pub mod sanitize;
pub mod storage;
pub mod suggest;
pub mod telemetry;
pub mod worker;

pub use api::{Api, ApiError};
pub use app::App;
pub use config::{load_config, Config};
pub use db::Database;
pub use error::{ConfigError, Result, StorageError, SynthgenError, WorkerError};
pub use generator::{Generator, InferenceParams};
pub use job::{Job, JobStatus, JobSummary};
pub use ledger::JobLedger;
pub use orchestrator::{Orchestrator, OrchestratorError};
pub use query::{QueryError, QueryService};
pub use storage::ArtifactStore;
pub use worker::{GenerationRequest, JobOutcome, JobPool};
