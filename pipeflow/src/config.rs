//! Resolver configuration.
//!
//! Every field has a default, so an empty document is a valid configuration.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for pipeline resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Timeout applied to tasks that do not declare one.
    #[serde(default = "default_task_timeout")]
    pub default_task_timeout_seconds: u64,
    /// Largest timeout a task may declare.
    #[serde(default = "default_max_task_timeout")]
    pub max_task_timeout_seconds: u64,
    /// Whether the deprecated `conditions` field is accepted.
    #[serde(default = "default_true")]
    pub allow_deprecated_conditions: bool,
    /// Whether pipeline params propagate into embedded task specs.
    #[serde(default = "default_true")]
    pub implicit_params: bool,
    /// Whether `$(params.x)` must name a declared pipeline param.
    #[serde(default = "default_true")]
    pub validate_param_references: bool,
    /// Resolution cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_task_timeout() -> u64 {
    3_600
}

fn default_max_task_timeout() -> u64 {
    86_400
}

fn default_true() -> bool {
    true
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_task_timeout_seconds: default_task_timeout(),
            max_task_timeout_seconds: default_max_task_timeout(),
            allow_deprecated_conditions: true,
            implicit_params: true,
            validate_param_references: true,
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ResolverConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parses a configuration from YAML.
    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Loads a configuration file, picking the format from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let read = || {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })
        };

        match extension.as_str() {
            "json" => Self::from_json_str(&read()?),
            "yaml" | "yml" => Self::from_yaml_str(&read()?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Sets the default task timeout.
    #[must_use]
    pub fn with_default_task_timeout(mut self, seconds: u64) -> Self {
        self.default_task_timeout_seconds = seconds;
        self
    }

    /// Sets the maximum task timeout.
    #[must_use]
    pub fn with_max_task_timeout(mut self, seconds: u64) -> Self {
        self.max_task_timeout_seconds = seconds;
        self
    }

    /// Enables or disables the deprecated `conditions` field.
    #[must_use]
    pub fn with_deprecated_conditions(mut self, allow: bool) -> Self {
        self.allow_deprecated_conditions = allow;
        self
    }

    /// Enables or disables implicit parameter propagation.
    #[must_use]
    pub fn with_implicit_params(mut self, enabled: bool) -> Self {
        self.implicit_params = enabled;
        self
    }

    /// Enables or disables parameter reference validation.
    #[must_use]
    pub fn with_param_reference_validation(mut self, enabled: bool) -> Self {
        self.validate_param_references = enabled;
        self
    }

    /// Sets the cache configuration.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Default task timeout as a Duration.
    #[must_use]
    pub fn default_task_timeout(&self) -> Duration {
        Duration::from_secs(self.default_task_timeout_seconds)
    }

    /// Maximum task timeout as a Duration.
    #[must_use]
    pub fn max_task_timeout(&self) -> Duration {
        Duration::from_secs(self.max_task_timeout_seconds)
    }
}

/// Configuration for the resolution cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether resolved pipelines are cached.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds an entry stays valid.
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of entries kept.
    #[serde(default = "default_cache_entries")]
    pub max_entries: usize,
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_cache_entries() -> usize {
    256
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: default_cache_ttl(),
            max_entries: default_cache_entries(),
        }
    }
}

impl CacheConfig {
    /// A configuration with caching turned off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Sets the TTL.
    #[must_use]
    pub fn with_ttl(mut self, seconds: u64) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    /// Sets the maximum number of entries.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Configuration for log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_filter() -> String {
    "pipeflow=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.default_task_timeout(), Duration::from_secs(3_600));
        assert_eq!(config.max_task_timeout(), Duration::from_secs(86_400));
        assert!(config.allow_deprecated_conditions);
        assert!(config.implicit_params);
        assert!(config.validate_param_references);
        assert!(config.cache.enabled);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(ResolverConfig::from_json_str("{}").unwrap(), ResolverConfig::default());
        assert_eq!(ResolverConfig::from_yaml_str("{}").unwrap(), ResolverConfig::default());
    }

    #[test]
    fn test_partial_yaml() {
        let config = ResolverConfig::from_yaml_str(
            "max_task_timeout_seconds: 60\ncache:\n  enabled: false\nlogging:\n  format: json\n",
        )
        .unwrap();

        assert_eq!(config.max_task_timeout_seconds, 60);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.max_entries, 256);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter, "pipeflow=info");
    }

    #[test]
    fn test_parse_error() {
        let err = ResolverConfig::from_json_str("{\"cache\": 3}").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "implicit_params: false").unwrap();

        let config = ResolverConfig::from_path(file.path()).unwrap();
        assert!(!config.implicit_params);
    }

    #[test]
    fn test_from_path_errors() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(
            ResolverConfig::from_path(file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ResolverConfig::from_path(dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_builders() {
        let config = ResolverConfig::new()
            .with_max_task_timeout(10)
            .with_deprecated_conditions(false)
            .with_cache(CacheConfig::disabled().with_ttl(5));
        assert_eq!(config.max_task_timeout_seconds, 10);
        assert!(!config.allow_deprecated_conditions);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_seconds, 5);
    }
}
