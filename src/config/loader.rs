//! # Configuration Loader
//!
//! Builds a [`BridgeConfig`] from layered sources using the `config` crate:
//!
//! 1. Built-in defaults (`BridgeConfig::default()`)
//! 2. Optional TOML file (explicit path or `TELEMETRY_DISPATCH_CONFIG`)
//! 3. Environment variables such as `TELEMETRY_DISPATCH__QUEUE__QUEUE_NAME`
//!
//! The loaded configuration is validated before it is returned.

use super::error::{ConfigResult, ConfigurationError};
use super::BridgeConfig;
use crate::constants::env::{CONFIG_PATH, CONFIG_PREFIX};
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    /// Replaces the process environment when set
    environment: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Defaults plus process environment, no file
    pub fn new() -> Self {
        Self::default()
    }

    /// Like [`ConfigLoader::new`], reading a file named by `TELEMETRY_DISPATCH_CONFIG`
    pub fn from_env() -> Self {
        let path = std::env::var(CONFIG_PATH)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        Self {
            path,
            environment: None,
        }
    }

    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Read variables from `vars` instead of the process environment
    pub fn with_environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn load(&self) -> ConfigResult<BridgeConfig> {
        let defaults = Config::try_from(&BridgeConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = &self.path {
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path.clone()).format(FileFormat::Toml));
        }

        let mut environment = Environment::with_prefix(CONFIG_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true);
        if let Some(vars) = &self.environment {
            environment = environment.source(Some(
                vars.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ));
        }
        builder = builder.add_source(environment);

        let config: BridgeConfig = builder
            .build()?
            .try_deserialize()
            .map_err(ConfigurationError::from)?;
        config.validate()?;

        info!(
            queue = %config.queue.queue_name,
            workflow_id = %config.workflow.workflow_id,
            mode = ?config.processing.mode,
            "Configuration loaded"
        );
        debug!(config = %config.sanitized_for_logging(), "Effective configuration");

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProcessingMode, RejectionAction};
    use std::io::Write;

    fn required_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("TELEMETRY_DISPATCH__QUEUE__DATABASE_URL", "postgresql://localhost/telemetry"),
            ("TELEMETRY_DISPATCH__QUEUE__QUEUE_NAME", "ecg_traces"),
            ("TELEMETRY_DISPATCH__WORKFLOW__BASE_URL", "http://localhost:8080"),
            ("TELEMETRY_DISPATCH__WORKFLOW__WORKFLOW_ID", "ecg-analysis"),
            ("TELEMETRY_DISPATCH__FILTER__EXPECTED_DEVICE_ID", "IoTSimulator"),
            ("TELEMETRY_DISPATCH__FILTER__SUBJECT_ID", "patient-123"),
        ]
    }

    #[test]
    fn test_load_from_environment_only() {
        let config = ConfigLoader::new()
            .with_environment(required_env())
            .load()
            .unwrap();

        assert_eq!(config.queue.queue_name, "ecg_traces");
        assert_eq!(config.filter.expected_device_id, "IoTSimulator");
        assert_eq!(config.queue.batch_size, 10);
        assert_eq!(config.processing.mode, ProcessingMode::Sequential);
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let mut env = required_env();
        env.push(("TELEMETRY_DISPATCH__QUEUE__BATCH_SIZE", "5"));
        env.push(("TELEMETRY_DISPATCH__PROCESSING__MODE", "concurrent"));
        env.push(("TELEMETRY_DISPATCH__REJECTIONS__MALFORMED", "discard"));

        let config = ConfigLoader::new().with_environment(env).load().unwrap();
        assert_eq!(config.queue.batch_size, 5);
        assert_eq!(config.processing.mode, ProcessingMode::Concurrent);
        assert_eq!(config.rejections.malformed, RejectionAction::Discard);
        assert_eq!(config.rejections.device_mismatch, RejectionAction::Retain);
    }

    #[test]
    fn test_file_then_environment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[queue]
database_url = "postgresql://localhost/telemetry"
queue_name = "from_file"
wait_time_seconds = 5

[workflow]
base_url = "http://localhost:8080"
workflow_id = "ecg-analysis"

[filter]
expected_device_id = "dev1"
subject_id = "patient-1"
"#
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .with_environment([("TELEMETRY_DISPATCH__QUEUE__QUEUE_NAME", "from_env")])
            .load()
            .unwrap();

        assert_eq!(config.queue.queue_name, "from_env");
        assert_eq!(config.queue.wait_time_seconds, 5);
        assert_eq!(config.filter.subject_id, "patient-1");
    }

    #[test]
    fn test_missing_required_value_fails() {
        let env: Vec<_> = required_env()
            .into_iter()
            .filter(|(k, _)| !k.ends_with("WORKFLOW_ID"))
            .collect();

        let err = ConfigLoader::new().with_environment(env).load().unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingRequired { ref field } if field == "workflow.workflow_id"
        ));
    }

    #[test]
    fn test_missing_file_fails() {
        let err = ConfigLoader::new()
            .with_file("/nonexistent/telemetry-dispatch.toml")
            .with_environment(required_env())
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::Load(_)));
    }
}
