//! Wires a loaded [`Config`] into the services the binary serves.

use std::sync::Arc;

use crate::api::Api;
use crate::config::Config;
use crate::db::Database;
use crate::error::{ConfigError, Result, WorkerError};
use crate::generator;
use crate::ledger::JobLedger;
use crate::orchestrator::Orchestrator;
use crate::query::QueryService;
use crate::storage::ArtifactStore;
use crate::worker::JobPool;

pub struct App {
    config: Config,
    orchestrator: Arc<Orchestrator>,
    api: Api,
}

impl App {
    pub fn from_config(config: Config) -> Result<Self> {
        let database_path =
            config
                .resolved_database_path()
                .ok_or_else(|| ConfigError::Validation {
                    message: "database_path is not set and no home directory was found"
                        .to_string(),
                })?;
        let database = Database::open(&database_path)?;
        let ledger: Arc<dyn JobLedger> = Arc::new(database);

        Self::with_ledger(config, ledger)
    }

    /// Builds the services over an existing ledger.
    pub fn with_ledger(config: Config, ledger: Arc<dyn JobLedger>) -> Result<Self> {
        let generator = generator::from_config(&config.generator)?;
        let store = ArtifactStore::new(&config.output_directory);

        let orchestrator = Arc::new(Orchestrator::new(
            generator,
            store.clone(),
            Arc::clone(&ledger),
            config.preview_count,
        ));
        let queries = QueryService::new(ledger, store);
        let api = Api::new(
            Arc::clone(&orchestrator),
            queries,
            config.max_output_size,
            config.preview_count,
        );

        log::info!(
            "Serving artifacts from {} with the {:?} generator",
            config.output_directory.display(),
            config.generator.kind
        );

        Ok(Self {
            config,
            orchestrator,
            api,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    /// Starts a pool sized by `worker_count`.
    pub fn job_pool(&self) -> std::result::Result<JobPool, WorkerError> {
        JobPool::new(Arc::clone(&self.orchestrator), self.config.worker_count)
    }
}
