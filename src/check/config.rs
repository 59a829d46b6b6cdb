//! Typed configuration of the systemd check.
//!
//! A check receives two raw YAML documents: the instance document and the
//! shared `init_config` document. Both are decoded into typed values with
//! defaults for every missing key. Regex patterns are compiled here; a
//! pattern that fails to compile is logged and skipped without failing the
//! whole configuration.

use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

/// Collection interval used when the instance does not set one.
pub const DEFAULT_MIN_COLLECTION_INTERVAL: Duration = Duration::from_secs(15);

/// Error type for check configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The `init_config` document could not be decoded.
    #[error("invalid init_config: {0}")]
    InvalidInitConfig(String),
    /// The instance document could not be decoded or failed validation.
    #[error("invalid instance config: {0}")]
    InvalidInstanceConfig(String),
}

/// Instance document as written by the user.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawInstance {
    unit_names: Option<Vec<String>>,
    unit_regex: Option<Vec<String>>,
    min_collection_interval: Option<u64>,
    tags: Option<Vec<String>>,
}

/// Unit selection for one check instance.
#[derive(Debug, Clone, Default)]
pub struct InstanceConfig {
    /// Literal unit names, in configured order.
    pub unit_names: Vec<String>,
    /// Raw `unit_regex` strings, in configured order.
    pub unit_regex_strings: Vec<String>,
    /// Successfully compiled subset of `unit_regex_strings`, same relative order.
    pub unit_regex_patterns: Vec<Regex>,
}

impl InstanceConfig {
    /// Returns `true` if any unit name or pattern is configured.
    pub fn has_filter(&self) -> bool {
        !self.unit_names.is_empty() || !self.unit_regex_patterns.is_empty()
    }

    /// Returns `true` if `unit` is named explicitly or matches a pattern.
    pub fn selects(&self, unit: &str) -> bool {
        self.unit_names.iter().any(|name| name == unit)
            || self.unit_regex_patterns.iter().any(|re| re.is_match(unit))
    }
}

/// Options shared by the whole check type. No keys are recognized yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InitConfig {}

/// Options every check instance accepts regardless of check type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonInstanceConfig {
    pub min_collection_interval: Duration,
    /// Attached to every sample the instance emits.
    pub tags: Vec<String>,
}

impl Default for CommonInstanceConfig {
    fn default() -> Self {
        Self {
            min_collection_interval: DEFAULT_MIN_COLLECTION_INTERVAL,
            tags: Vec::new(),
        }
    }
}

/// Complete configuration of a systemd check instance.
#[derive(Debug, Clone, Default)]
pub struct CheckConfig {
    pub instance: InstanceConfig,
    pub init: InitConfig,
    pub common: CommonInstanceConfig,
}

impl CheckConfig {
    /// Decodes the raw instance and init documents.
    ///
    /// Empty and `null` documents decode to defaults.
    pub fn parse(raw_instance: &str, raw_init_config: &str) -> Result<Self, ConfigError> {
        let init: InitConfig = decode(raw_init_config)
            .map_err(|e| ConfigError::InvalidInitConfig(e.to_string()))?;

        let raw: RawInstance = decode(raw_instance)
            .map_err(|e| ConfigError::InvalidInstanceConfig(e.to_string()))?;

        let min_collection_interval = match raw.min_collection_interval {
            Some(0) => {
                return Err(ConfigError::InvalidInstanceConfig(
                    "min_collection_interval must be at least 1 second".to_string(),
                ));
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_MIN_COLLECTION_INTERVAL,
        };

        let unit_names = raw.unit_names.unwrap_or_default();
        let unit_regex_strings = raw.unit_regex.unwrap_or_default();
        debug!(?unit_names, ?unit_regex_strings, "decoded systemd instance");

        let unit_regex_patterns = compile_patterns(&unit_regex_strings);

        Ok(Self {
            instance: InstanceConfig {
                unit_names,
                unit_regex_strings,
                unit_regex_patterns,
            },
            init,
            common: CommonInstanceConfig {
                min_collection_interval,
                tags: raw.tags.unwrap_or_default(),
            },
        })
    }
}

/// Compiles every pattern that parses, logging the ones that do not.
fn compile_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                error!(
                    pattern = %pattern,
                    error = %e,
                    "failed to parse systemd check option unit_regex"
                );
                None
            }
        })
        .collect()
}

fn decode<T: DeserializeOwned + Default>(raw: &str) -> Result<T, serde_yaml::Error> {
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_yaml::from_str::<Option<T>>(raw)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::testing::capture_logs;

    fn pattern_strings(config: &CheckConfig) -> Vec<&str> {
        config
            .instance
            .unit_regex_patterns
            .iter()
            .map(|re| re.as_str())
            .collect()
    }

    #[test]
    fn test_decode_full_instance() {
        let raw = "\
unit_names:
  - ssh.service
  - cron.service
  - ssh.service
unit_regex:
  - 'docker-.*\\.scope'
  - '^nginx'
min_collection_interval: 30
tags:
  - env:prod
";
        let config = CheckConfig::parse(raw, "").unwrap();
        assert_eq!(
            config.instance.unit_names,
            vec!["ssh.service", "cron.service", "ssh.service"]
        );
        assert_eq!(
            config.instance.unit_regex_strings,
            vec!["docker-.*\\.scope", "^nginx"]
        );
        assert_eq!(pattern_strings(&config), vec!["docker-.*\\.scope", "^nginx"]);
        assert_eq!(
            config.common.min_collection_interval,
            Duration::from_secs(30)
        );
        assert_eq!(config.common.tags, vec!["env:prod"]);
    }

    #[test]
    fn test_empty_documents_use_defaults() {
        for raw in ["", "   \n", "~", "null", "{}"] {
            let config = CheckConfig::parse(raw, raw).unwrap();
            assert!(config.instance.unit_names.is_empty());
            assert!(config.instance.unit_regex_strings.is_empty());
            assert!(config.instance.unit_regex_patterns.is_empty());
            assert_eq!(config.common, CommonInstanceConfig::default());
        }
    }

    #[test]
    fn test_null_lists_are_empty() {
        let config = CheckConfig::parse("unit_names:\nunit_regex: ~\n", "").unwrap();
        assert!(config.instance.unit_names.is_empty());
        assert!(config.instance.unit_regex_strings.is_empty());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = CheckConfig::parse("unit_names: [a]\nservice: foo\n", "foo: bar\n").unwrap();
        assert_eq!(config.instance.unit_names, vec!["a"]);
    }

    #[test]
    fn test_invalid_regex_is_skipped_and_logged() {
        let (result, logs) =
            capture_logs(|| CheckConfig::parse("unit_regex: ['[', 'ok.*']\n", ""));
        let config = result.unwrap();

        assert_eq!(config.instance.unit_regex_strings, vec!["[", "ok.*"]);
        assert_eq!(pattern_strings(&config), vec!["ok.*"]);
        assert!(logs.contains("ERROR"));
        assert!(logs.contains("failed to parse systemd check option unit_regex"));
        assert!(logs.contains("pattern=["));
    }

    #[test]
    fn test_valid_patterns_keep_relative_order() {
        let raw = "unit_regex: ['z.*', '(', 'a.*', '*bad', 'm+']\n";
        let config = CheckConfig::parse(raw, "").unwrap();
        assert_eq!(pattern_strings(&config), vec!["z.*", "a.*", "m+"]);
    }

    #[test]
    fn test_invalid_init_config() {
        let err = CheckConfig::parse("", "42\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInitConfig(_)));
    }

    #[test]
    fn test_invalid_instance_config() {
        let err = CheckConfig::parse("unit_names: sshd.service\n", "").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInstanceConfig(_)));

        let err = CheckConfig::parse("unit_regex: [[nested]]\n", "").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInstanceConfig(_)));

        let err = CheckConfig::parse("unit_names: [unclosed\n", "").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInstanceConfig(_)));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = CheckConfig::parse("min_collection_interval: 0\n", "").unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidInstanceConfig(
                "min_collection_interval must be at least 1 second".to_string()
            )
        );
    }

    #[test]
    fn test_selects() {
        let config =
            CheckConfig::parse("unit_names: [cron.service]\nunit_regex: ['^ssh']\n", "").unwrap();
        assert!(config.instance.has_filter());
        assert!(config.instance.selects("cron.service"));
        assert!(config.instance.selects("sshd.service"));
        assert!(!config.instance.selects("nginx.service"));
        assert!(!CheckConfig::default().instance.has_filter());
    }
}
