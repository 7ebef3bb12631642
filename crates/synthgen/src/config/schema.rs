use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub output_directory: PathBuf,
    /// Ledger location. Falls back to `~/.synthgen/data/synthgen.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Upper bound for the number of artifacts one job may request.
    #[serde(default = "default_max_output_size")]
    pub max_output_size: u32,
    /// Number of encoded artifacts returned with a job summary, at most
    /// [`MAX_PREVIEW_COUNT`].
    #[serde(default = "default_preview_count")]
    pub preview_count: usize,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Configured database path, or the per-user default.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(crate::db::default_database_path)
    }
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_max_output_size() -> u32 {
    10
}

/// Summaries never carry more than this many previews.
pub const MAX_PREVIEW_COUNT: usize = 3;

fn default_preview_count() -> usize {
    MAX_PREVIEW_COUNT
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// Runs an external program once per artifact.
    Command,
    /// Renders tinted noise images in-process.
    #[default]
    Placeholder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub kind: GeneratorKind,
    /// Program to run when `kind` is `command`.
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_device")]
    pub device: String,
    /// Extension of the artifacts the generator produces.
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_extension() -> String {
    "png".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            kind: GeneratorKind::default(),
            program: None,
            args: Vec::new(),
            device: default_device(),
            extension: default_extension(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}
