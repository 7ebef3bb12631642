use std::path::{Path, PathBuf};

use crate::config::schema::{Config, GeneratorKind, MAX_PREVIEW_COUNT};
use crate::error::ConfigError;
use crate::storage::ARTIFACT_EXTENSIONS;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

pub const ENV_OUTPUT_DIR: &str = "SYNTHGEN_OUTPUT_DIR";
pub const ENV_DATABASE_PATH: &str = "SYNTHGEN_DATABASE_PATH";
pub const ENV_LOG_LEVEL: &str = "SYNTHGEN_LOG_LEVEL";
pub const ENV_DEVICE: &str = "SYNTHGEN_DEVICE";
pub const ENV_WORKER_COUNT: &str = "SYNTHGEN_WORKER_COUNT";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let mut config: Config = serde_json::from_value(json_value)?;

    apply_env_overrides(&mut config)?;
    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();

    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

/// Overrides config fields from `SYNTHGEN_*` environment variables.
///
/// Set-but-empty variables are rejected rather than silently ignored.
pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
    if let Some(value) = env_value(ENV_OUTPUT_DIR)? {
        config.output_directory = PathBuf::from(value);
    }
    if let Some(value) = env_value(ENV_DATABASE_PATH)? {
        config.database_path = Some(PathBuf::from(value));
    }
    if let Some(value) = env_value(ENV_LOG_LEVEL)? {
        config.logging.level = value;
    }
    if let Some(value) = env_value(ENV_DEVICE)? {
        config.generator.device = value;
    }
    if let Some(value) = env_value(ENV_WORKER_COUNT)? {
        config.worker_count = value.parse().map_err(|_| ConfigError::InvalidEnv {
            name: ENV_WORKER_COUNT.to_string(),
            reason: format!("expected a positive integer, got '{}'", value),
        })?;
    }
    Ok(())
}

fn env_value(name: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::InvalidEnv {
            name: name.to_string(),
            reason: "value is empty".to_string(),
        }),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnv {
            name: name.to_string(),
            reason: "value is not valid UTF-8".to_string(),
        }),
    }
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.output_directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "output_directory must not be empty".to_string(),
        });
    }

    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "worker_count must be at least 1".to_string(),
        });
    }

    if config.max_output_size == 0 {
        return Err(ConfigError::Validation {
            message: "max_output_size must be at least 1".to_string(),
        });
    }

    if config.preview_count > MAX_PREVIEW_COUNT {
        return Err(ConfigError::Validation {
            message: format!(
                "preview_count must be at most {}, got {}",
                MAX_PREVIEW_COUNT, config.preview_count
            ),
        });
    }

    if config.generator.kind == GeneratorKind::Command && config.generator.program.is_none() {
        return Err(ConfigError::Validation {
            message: "generator.program is required when generator.kind is 'command'".to_string(),
        });
    }

    // Artifacts with other extensions would be invisible to listing and download.
    let extension = config.generator.extension.as_str();
    if !ARTIFACT_EXTENSIONS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    {
        return Err(ConfigError::Validation {
            message: format!(
                "generator.extension '{}' is not one of: {}",
                extension,
                ARTIFACT_EXTENSIONS.join(", ")
            ),
        });
    }

    if config.generator.kind == GeneratorKind::Placeholder
        && !extension.eq_ignore_ascii_case("png")
    {
        return Err(ConfigError::Validation {
            message: format!(
                "the placeholder generator only renders png, not '{}'",
                extension
            ),
        });
    }

    Ok(())
}
