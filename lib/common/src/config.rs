//! Configuration for the monitor process.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `SYSMON` (sections separated by `__`,
//! e.g. `SYSMON__MONITORING__INTERVAL_SECONDS=5`), then command line
//! overrides applied by the binary.

use config::{ConfigBuilder, Environment, File, FileFormat};
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Prefix of the environment variables read by [`MonitorConfig::load`].
pub const ENV_PREFIX: &str = "SYSMON";

/// Default file looked up when no `--config` path is given.
pub const DEFAULT_CONFIG_FILE: &str = "sysmon.toml";

/// Default request timeout of the API reporter (seconds).
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 10;

/// Default `tracing` filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("monitoring.interval_seconds is not configured")]
    MissingInterval,
    #[error("Invalid API endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct MonitorConfig {
    #[serde(default)]
    monitoring: MonitoringConfig,
    #[serde(default)]
    api_integration: Option<ApiIntegrationConfig>,
    #[serde(default)]
    logging: LoggingConfig,
}

/// The `[monitoring]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct MonitoringConfig {
    /// Sampling interval in seconds. Kept signed so that a non-positive value
    /// reaches the monitor loop and is rejected there as a configuration error.
    interval_seconds: Option<i64>,
    /// Mount point whose disk is reported. Defaults to the system root.
    disk_mount_point: Option<PathBuf>,
}

/// The `[api_integration]` section. Its presence enables the API reporter plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct ApiIntegrationConfig {
    endpoint: String,
    #[serde(default = "default_api_timeout")]
    timeout_seconds: u64,
}

impl ApiIntegrationConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_seconds: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

/// The `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    filter: String,
    /// Directory receiving a daily rolling log file. Console only when unset.
    #[serde(default)]
    directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            directory: None,
        }
    }
}

fn default_api_timeout() -> u64 {
    DEFAULT_API_TIMEOUT_SECS
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl MonitorConfig {
    /// Load configuration from `file_path` and the `SYSMON__*` environment.
    ///
    /// When `required` is false a missing file is not an error, so the process
    /// can be configured from the environment alone.
    pub fn load(file_path: &Path, required: bool) -> Result<Self, ConfigError> {
        Self::load_with_prefix(file_path, required, ENV_PREFIX)
    }

    fn load_with_prefix(
        file_path: &Path,
        required: bool,
        env_prefix: &str,
    ) -> Result<Self, ConfigError> {
        debug!(path = ?file_path, required, env_prefix, "Loading configuration");

        let settings = ConfigBuilder::<config::builder::DefaultState>::default()
            .set_default("logging.filter", DEFAULT_LOG_FILTER)?
            .add_source(
                File::new(&file_path.to_string_lossy(), FileFormat::Toml).required(required),
            )
            .add_source(Environment::with_prefix(env_prefix).separator("__"))
            .build()?;

        Ok(settings.try_deserialize::<MonitorConfig>()?)
    }

    /// The configured sampling interval. Absence is fatal at startup.
    pub fn sampling_interval(&self) -> Result<i64, ConfigError> {
        self.monitoring
            .interval_seconds
            .ok_or(ConfigError::MissingInterval)
    }

    /// Apply command line overrides on top of file and environment values.
    pub fn apply_overrides(
        &mut self,
        interval_seconds: Option<i64>,
        endpoint: Option<&str>,
        log_filter: Option<&str>,
    ) {
        if let Some(interval) = interval_seconds {
            self.monitoring.interval_seconds = Some(interval);
        }

        if let Some(endpoint) = endpoint {
            match self.api_integration.as_mut() {
                Some(api) => api.endpoint = endpoint.to_string(),
                None => self.api_integration = Some(ApiIntegrationConfig::new(endpoint)),
            }
        }

        if let Some(filter) = log_filter {
            self.logging.filter = filter.to_string();
        }
    }

    /// Check that everything needed to start monitoring is present and well formed.
    ///
    /// The interval's sign is not checked here; the monitor loop owns that rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampling_interval()?;

        if let Some(api) = &self.api_integration {
            validate_endpoint(&api.endpoint)?;
        }

        Ok(())
    }
}

/// Parse an API endpoint, accepting only `http` and `https` URLs.
pub fn validate_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme `{}`", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted::assert_eq;
    use std::env;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", contents).unwrap();
        temp_file
    }

    #[test]
    fn load_valid_config_from_file() {
        let file = write_config(
            r#"
            [monitoring]
            interval_seconds = 5
            disk_mount_point = "/data"

            [api_integration]
            endpoint = "http://localhost:8080/metrics"
            timeout_seconds = 3

            [logging]
            filter = "debug"
            directory = "/var/log/sysmon"
        "#,
        );

        let config = MonitorConfig::load_with_prefix(file.path(), true, "SYSMON_TEST_FILE")
            .expect("config should load");

        assert_eq!(config.sampling_interval().unwrap(), 5);
        assert_eq!(
            config.monitoring().disk_mount_point().as_deref(),
            Some(Path::new("/data"))
        );
        let api = config.api_integration().as_ref().unwrap();
        assert_eq!(api.endpoint(), "http://localhost:8080/metrics");
        assert_eq!(*api.timeout_seconds(), 3);
        assert_eq!(config.logging().filter(), "debug");
        assert_eq!(
            config.logging().directory().as_deref(),
            Some(Path::new("/var/log/sysmon"))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn defaults_apply_to_optional_sections() {
        let file = write_config(
            r#"
            [monitoring]
            interval_seconds = 30

            [api_integration]
            endpoint = "https://example.com/ingest"
        "#,
        );

        let config =
            MonitorConfig::load_with_prefix(file.path(), true, "SYSMON_TEST_DEFAULTS").unwrap();

        assert_eq!(config.logging().filter(), DEFAULT_LOG_FILTER);
        assert_eq!(
            *config.api_integration().as_ref().unwrap().timeout_seconds(),
            DEFAULT_API_TIMEOUT_SECS
        );
        assert_eq!(config.monitoring().disk_mount_point(), &None);
        assert_eq!(config.logging().directory(), &None);
    }

    #[test]
    fn missing_interval_is_fatal() {
        let file = write_config("[logging]\nfilter = \"warn\"");

        let config =
            MonitorConfig::load_with_prefix(file.path(), true, "SYSMON_TEST_MISSING").unwrap();

        assert!(matches!(
            config.sampling_interval(),
            Err(ConfigError::MissingInterval)
        ));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingInterval)
        ));
    }

    #[test]
    fn non_positive_interval_still_loads() {
        let file = write_config("[monitoring]\ninterval_seconds = 0");

        let config =
            MonitorConfig::load_with_prefix(file.path(), true, "SYSMON_TEST_ZERO").unwrap();

        assert_eq!(config.sampling_interval().unwrap(), 0);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = MonitorConfig::load_with_prefix(
            Path::new("/definitely/not/here/sysmon.toml"),
            true,
            "SYSMON_TEST_NOFILE",
        );

        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn optional_file_falls_back_to_defaults() {
        let config = MonitorConfig::load_with_prefix(
            Path::new("/definitely/not/here/sysmon.toml"),
            false,
            "SYSMON_TEST_OPTIONAL",
        )
        .unwrap();

        assert_eq!(config.monitoring().interval_seconds(), &None);
        assert_eq!(config.api_integration(), &None);
        assert_eq!(config.logging().filter(), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn override_config_with_env_vars() {
        env::set_var("SYSMON_TEST_ENV__MONITORING__INTERVAL_SECONDS", "42");

        let file = write_config("[monitoring]\ninterval_seconds = 5");
        let config = MonitorConfig::load_with_prefix(file.path(), true, "SYSMON_TEST_ENV");

        env::remove_var("SYSMON_TEST_ENV__MONITORING__INTERVAL_SECONDS");

        assert_eq!(config.unwrap().sampling_interval().unwrap(), 42);
    }

    #[test]
    fn command_line_overrides_win() {
        let mut config = MonitorConfig::default();
        config.apply_overrides(Some(7), Some("http://127.0.0.1:9000/"), Some("trace"));

        assert_eq!(config.sampling_interval().unwrap(), 7);
        let api = config.api_integration().as_ref().unwrap();
        assert_eq!(api.endpoint(), "http://127.0.0.1:9000/");
        assert_eq!(*api.timeout_seconds(), DEFAULT_API_TIMEOUT_SECS);
        assert_eq!(config.logging().filter(), "trace");
    }

    #[test]
    fn invalid_endpoint_fails_validation() {
        let mut config = MonitorConfig::default();
        config.apply_overrides(Some(5), Some("not a url"), None);

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn endpoint_scheme_must_be_http() {
        assert!(validate_endpoint("https://example.com/metrics").is_ok());
        assert!(matches!(
            validate_endpoint("ftp://example.com/metrics"),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }
}
