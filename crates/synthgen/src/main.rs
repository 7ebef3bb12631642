use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use synthgen::api::{ApiError, GenerateRequest};
use synthgen::config::{load_config, load_config_from_str, Config};
use synthgen::worker::{GenerationRequest, JobOutcome};
use synthgen::{telemetry, App, SynthgenError};

/// synthgen - batch synthetic image generation with a durable job ledger
#[derive(Parser)]
#[command(name = "synthgen")]
#[command(version)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a batch of artifacts for one label
    Generate {
        label: String,

        /// Advisory noise level in [0, 1]
        #[arg(long, default_value_t = 0.1)]
        noise: f64,

        /// Number of artifacts to generate
        #[arg(long, default_value_t = 1)]
        count: u32,
    },

    /// Run every request of a JSON file concurrently on the worker pool
    Batch {
        /// JSON array of {"label", "noiseLevel", "outputSize"} objects
        file: PathBuf,
    },

    /// List all recorded jobs, newest first
    Datasets,

    /// Show encoded previews of a job
    Preview { id: String },

    /// Write a job's artifacts as a ZIP archive
    Download {
        id: String,

        /// Target file or directory (defaults to the current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Aggregate counts over the ledger
    Stats,

    /// Recent successful jobs with one preview each
    Samples,

    /// Suggest labels matching a query
    SuggestLabels {
        #[arg(default_value = "")]
        query: String,
    },

    /// Suggest noise descriptions matching a query
    SuggestNoise {
        #[arg(default_value = "")]
        query: String,
    },

    /// Report that the service can be constructed
    Health,
}

enum Failure {
    Setup(SynthgenError),
    Api(ApiError),
    Io(String),
}

impl From<SynthgenError> for Failure {
    fn from(err: SynthgenError) -> Self {
        Failure::Setup(err)
    }
}

impl From<ApiError> for Failure {
    fn from(err: ApiError) -> Self {
        Failure::Api(err)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Api(err)) => {
            print_json(&err.body());
            ExitCode::FAILURE
        }
        Err(Failure::Setup(err)) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
        Err(Failure::Io(message)) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Failure> {
    let config = resolve_config(cli.config.as_deref())?;
    telemetry::init(&config.logging).map_err(SynthgenError::from)?;

    log::debug!("Using output directory {}", config.output_directory.display());

    let app = App::from_config(config)?;
    let api = app.api();

    match cli.command {
        Commands::Generate {
            label,
            noise,
            count,
        } => {
            let request = GenerateRequest {
                label,
                noise_level: noise,
                output_size: count,
            };
            print_json(&api.generate(&request)?);
        }
        Commands::Batch { file } => run_batch(&app, &file)?,
        Commands::Datasets => print_json(&api.datasets()?),
        Commands::Preview { id } => print_json(&api.preview(&id)?),
        Commands::Download { id, out } => {
            let download = api.download(&id)?;
            let target = match out {
                Some(path) if path.is_dir() => path.join(&download.filename),
                Some(path) => path,
                None => PathBuf::from(&download.filename),
            };
            std::fs::write(&target, &download.bytes)
                .map_err(|e| Failure::Io(format!("failed to write {}: {}", target.display(), e)))?;
            print_json(&download);
        }
        Commands::Stats => print_json(&api.stats()?),
        Commands::Samples => print_json(&api.samples()?),
        Commands::SuggestLabels { query } => print_json(&api.suggest_labels(&query)),
        Commands::SuggestNoise { query } => print_json(&api.suggest_noise(&query)),
        Commands::Health => print_json(&api.health()),
    }

    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchEntry {
    label: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn run_batch(app: &App, file: &Path) -> Result<(), Failure> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| Failure::Io(format!("failed to read {}: {}", file.display(), e)))?;
    let requests: Vec<GenerateRequest> = serde_json::from_str(&content)
        .map_err(|e| ApiError::bad_request(format!("invalid batch file: {}", e)))?;

    // Reject the whole file before anything runs.
    for request in &requests {
        request
            .validate(app.config().max_output_size)
            .map_err(ApiError::from)?;
    }

    let pool = app.job_pool().map_err(SynthgenError::from)?;
    let mut labels = Vec::with_capacity(requests.len());
    for request in requests {
        let label = request.label.clone();
        match pool.submit(GenerationRequest::new(
            request.label,
            request.noise_level,
            request.output_size,
        )) {
            Ok(ticket) => labels.push((Some(ticket), label)),
            Err(e) => {
                log::error!("Could not queue '{}': {}", label, e);
                labels.push((None, label));
            }
        }
    }

    // Joining the workers returns even when one of them panicked.
    let mut outcomes: HashMap<u64, JobOutcome> = pool
        .wait()
        .into_iter()
        .map(|outcome| (outcome.ticket, outcome))
        .collect();

    let entries: Vec<BatchEntry> = labels
        .into_iter()
        .map(|(ticket, label)| {
            match ticket.and_then(|ticket| outcomes.remove(&ticket)) {
                Some(outcome) => match outcome.result {
                    Ok(summary) => BatchEntry {
                        label,
                        success: true,
                        id: Some(summary.id),
                        error: None,
                    },
                    Err(e) => BatchEntry {
                        label,
                        success: false,
                        id: None,
                        error: Some(ApiError::from(e).message),
                    },
                },
                None => BatchEntry {
                    label,
                    success: false,
                    id: None,
                    error: Some("job did not report a result".to_string()),
                },
            }
        })
        .collect();

    print_json(&entries);
    Ok(())
}

/// Explicit `--config`, then `~/.synthgen/config.json`, then built-in defaults.
fn resolve_config(explicit: Option<&Path>) -> Result<Config, SynthgenError> {
    if let Some(path) = explicit {
        return Ok(load_config(path)?);
    }

    if let Some(home) = dirs::home_dir() {
        let default_path = home.join(".synthgen").join("config.json");
        if default_path.exists() {
            return Ok(load_config(&default_path)?);
        }

        let defaults = serde_json::json!({
            "version": "1.0",
            "output_directory": home.join(".synthgen").join("generations"),
        });
        return Ok(load_config_from_str(&defaults.to_string())?);
    }

    Err(synthgen::ConfigError::Validation {
        message: "no --config given and no home directory found".to_string(),
    }
    .into())
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to serialize output: {}", e),
    }
}
