//! # Convergence Timeout Configuration
//!
//! The convergence timeout is configured per cluster template through the
//! policy-template defaults ConfigMap under the key
//! `clusterConfigurationTimeout`, using Go duration syntax (`"40m"`,
//! `"1h30m"`, `"1.5h"`). A missing key or a zero duration selects the
//! default of 30 minutes.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use o2ims_core::O2imsError;

/// ConfigMap key holding the convergence timeout.
pub const CLUSTER_CONFIGURATION_TIMEOUT_KEY: &str = "clusterConfigurationTimeout";

/// Timeout used when none is configured.
pub const DEFAULT_CLUSTER_CONFIGURATION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is not a valid duration string.
    #[error("the value of key {key} ({value:?}) is not a valid duration string: {reason}")]
    InvalidDuration {
        /// ConfigMap key that held the value.
        key: String,
        /// The rejected value.
        value: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The document is not a ConfigMap-shaped YAML mapping.
    #[error("invalid configmap document: {0}")]
    Document(#[from] serde_yaml::Error),
}

impl From<ConfigError> for O2imsError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidDuration { .. } => O2imsError::Validation(err.to_string()),
            ConfigError::Document(e) => O2imsError::Serialization(e.to_string()),
        }
    }
}

/// Timeouts that drive the configuration-applied engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// How long enforcement may run before the engine reports `TimedOut`.
    pub cluster_configuration: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            cluster_configuration: DEFAULT_CLUSTER_CONFIGURATION_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigMapDocument {
    #[serde(default)]
    data: BTreeMap<String, String>,
}

impl TimeoutConfig {
    /// Load from the `data` section of a ConfigMap.
    pub fn from_config_map(data: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = data.get(CLUSTER_CONFIGURATION_TIMEOUT_KEY) {
            let timeout = parse_duration(raw).map_err(|reason| ConfigError::InvalidDuration {
                key: CLUSTER_CONFIGURATION_TIMEOUT_KEY.to_string(),
                value: raw.clone(),
                reason,
            })?;
            if !timeout.is_zero() {
                config.cluster_configuration = timeout;
            }
        }
        tracing::debug!(
            timeout = ?config.cluster_configuration,
            "cluster configuration timeout loaded"
        );
        Ok(config)
    }

    /// Load from a ConfigMap manifest in YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let document: ConfigMapDocument = serde_yaml::from_str(yaml)?;
        Self::from_config_map(&document.data)
    }
}

const NANOS_PER_UNIT: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60 * 1_000_000_000),
    ("h", 3_600 * 1_000_000_000),
];

// Digits beyond this are below nanosecond resolution for every unit.
const MAX_FRACTION_DIGITS: usize = 18;

/// Parse a Go duration string such as `"1h30m"`, `"1.5s"` or `"250ms"`.
///
/// Negative durations are rejected.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    let (negative, mut rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        Some(_) => (false, s),
        None => return Err("empty duration".to_string()),
    };
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(format!("invalid duration {input:?}"));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (int_part, after) = rest.split_at(int_end);
        let (frac_part, after) = match after.strip_prefix('.') {
            Some(stripped) => {
                let frac_end = stripped
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(stripped.len());
                stripped.split_at(frac_end)
            }
            None => ("", after),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(format!("invalid duration {input:?}"));
        }

        let unit_end = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, after) = after.split_at(unit_end);
        if unit.is_empty() {
            return Err(format!("missing unit in duration {input:?}"));
        }
        let per_unit = NANOS_PER_UNIT
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, nanos)| *nanos)
            .ok_or_else(|| format!("unknown unit {unit:?} in duration {input:?}"))?;

        let overflow = || format!("duration {input:?} is out of range");
        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(per_unit).ok_or_else(overflow)?;
        if !frac_part.is_empty() {
            let digits = &frac_part[..frac_part.len().min(MAX_FRACTION_DIGITS)];
            let numerator: u128 = digits.parse().map_err(|_| overflow())?;
            let denominator = 10u128.pow(digits.len() as u32);
            nanos = nanos
                .checked_add(numerator * per_unit / denominator)
                .ok_or_else(overflow)?;
        }
        total = total.checked_add(nanos).ok_or_else(overflow)?;
        rest = after;
    }

    if negative && total > 0 {
        return Err(format!("negative duration {input:?} is not allowed"));
    }
    let nanos = u64::try_from(total).map_err(|_| format!("duration {input:?} is out of range"))?;
    Ok(Duration::from_nanos(nanos))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(value: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(CLUSTER_CONFIGURATION_TIMEOUT_KEY.to_string(), value.to_string())])
    }

    #[test]
    fn test_parse_simple_units() {
        assert_eq!(parse_duration("5s"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_duration("40m"), Ok(Duration::from_secs(2400)));
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("10us"), Ok(Duration::from_micros(10)));
        assert_eq!(parse_duration("10µs"), Ok(Duration::from_micros(10)));
        assert_eq!(parse_duration("7ns"), Ok(Duration::from_nanos(7)));
    }

    #[test]
    fn test_parse_compound_and_fractional() {
        assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse_duration("1.5h"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse_duration(".5s"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration("2m0.25s"), Ok(Duration::from_millis(120_250)));
    }

    #[test]
    fn test_parse_zero_and_sign() {
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
        assert_eq!(parse_duration("+5s"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_duration("-0s"), Ok(Duration::ZERO));
        assert!(parse_duration("-5s").is_err());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("5 minutes").is_err());
        assert!(parse_duration("m").is_err());
        assert!(parse_duration("1d").is_err());
        assert!(parse_duration(".s").is_err());
    }

    #[test]
    fn test_missing_key_uses_default() {
        let config = TimeoutConfig::from_config_map(&BTreeMap::new()).unwrap();
        assert_eq!(config.cluster_configuration, DEFAULT_CLUSTER_CONFIGURATION_TIMEOUT);
    }

    #[test]
    fn test_zero_uses_default() {
        let config = TimeoutConfig::from_config_map(&data("0s")).unwrap();
        assert_eq!(config, TimeoutConfig::default());
    }

    #[test]
    fn test_configured_timeout() {
        let config = TimeoutConfig::from_config_map(&data("40m")).unwrap();
        assert_eq!(config.cluster_configuration, Duration::from_secs(2400));
    }

    #[test]
    fn test_invalid_timeout_names_key() {
        let err = TimeoutConfig::from_config_map(&data("forty minutes")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(CLUSTER_CONFIGURATION_TIMEOUT_KEY));
        assert!(message.contains("forty minutes"));
    }

    #[test]
    fn test_from_yaml_configmap() {
        let yaml = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: policytemplate-defaults
  namespace: sno-ran-du
data:
  clusterConfigurationTimeout: "1h"
  clusterConfigurationLabels: "foo"
"#;
        let config = TimeoutConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.cluster_configuration, Duration::from_secs(3600));
    }

    #[test]
    fn test_from_yaml_without_data() {
        let config = TimeoutConfig::from_yaml_str("kind: ConfigMap\n").unwrap();
        assert_eq!(config, TimeoutConfig::default());
    }

    #[test]
    fn test_converts_to_core_error() {
        let err = TimeoutConfig::from_config_map(&data("1d")).unwrap_err();
        assert!(matches!(O2imsError::from(err), O2imsError::Validation(_)));
        let err = TimeoutConfig::from_yaml_str("[").unwrap_err();
        assert!(matches!(O2imsError::from(err), O2imsError::Serialization(_)));
    }

    #[test]
    fn test_from_yaml_rejects_non_mapping() {
        assert!(matches!(
            TimeoutConfig::from_yaml_str("- 1\n- 2\n"),
            Err(ConfigError::Document(_))
        ));
    }
}
