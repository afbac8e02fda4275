//! Environment variable parsing.
//!
//! This module keeps env parsing:
//! - strict (invalid values fail fast)
//! - deterministic (point tags land in an ordered map)
//! - safe (secret values are redacted in error metadata)

use std::collections::BTreeMap;
use std::fmt;
use wflambda_domain::PointTags;
use wflambda_shared::{ErrorCode, ErrorEnvelope, redact_if_secret};

/// Env var: enable the telemetry decorator.
pub const ENV_REPORT_STANDARD_METRICS: &str = "REPORT_STANDARD_METRICS";
/// Env var: base point tags as CSV of `key=value`.
pub const ENV_POINT_TAGS: &str = "WFLAMBDA_POINT_TAGS";
/// Env var: deployed function name (set by the Lambda host).
pub const ENV_FUNCTION_NAME: &str = "AWS_LAMBDA_FUNCTION_NAME";
/// Env var: deployed function version (set by the Lambda host).
pub const ENV_FUNCTION_VERSION: &str = "AWS_LAMBDA_FUNCTION_VERSION";
/// Env var: configured memory in MB (set by the Lambda host).
pub const ENV_FUNCTION_MEMORY_SIZE: &str = "AWS_LAMBDA_FUNCTION_MEMORY_SIZE";

/// Every variable read by [`WrapperEnv::from_std_env`].
pub const ENV_VARS: [&str; 5] = [
    ENV_REPORT_STANDARD_METRICS,
    ENV_POINT_TAGS,
    ENV_FUNCTION_NAME,
    ENV_FUNCTION_VERSION,
    ENV_FUNCTION_MEMORY_SIZE,
];

/// Upper bound on configured base tags.
pub const MAX_POINT_TAGS: usize = 64;

/// Raw env overrides (all optional).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapperEnv {
    /// `REPORT_STANDARD_METRICS`.
    pub report_standard_metrics: Option<bool>,
    /// `WFLAMBDA_POINT_TAGS`.
    pub point_tags: Option<PointTags>,
    /// `AWS_LAMBDA_FUNCTION_NAME`.
    pub function_name: Option<Box<str>>,
    /// `AWS_LAMBDA_FUNCTION_VERSION`.
    pub function_version: Option<Box<str>>,
    /// `AWS_LAMBDA_FUNCTION_MEMORY_SIZE`.
    pub memory_size_mb: Option<u32>,
}

impl WrapperEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            report_standard_metrics: parse_optional_bool(map, ENV_REPORT_STANDARD_METRICS)?,
            point_tags: parse_optional_point_tags(map, ENV_POINT_TAGS)?,
            function_name: parse_optional_trimmed_string(map, ENV_FUNCTION_NAME)?,
            function_version: parse_optional_trimmed_string(map, ENV_FUNCTION_VERSION)?,
            memory_size_mb: parse_optional_u32(map, ENV_FUNCTION_MEMORY_SIZE)?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        Self::from_map(&std_env_map())
    }
}

/// Snapshot of the variables in [`ENV_VARS`] from the process environment.
pub fn std_env_map() -> BTreeMap<String, String> {
    ENV_VARS
        .iter()
        .filter_map(|name| {
            std::env::var(name)
                .ok()
                .map(|value| ((*name).to_owned(), value))
        })
        .collect()
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Boolean env var had an invalid value.
    InvalidBool {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// CSV list exceeds a safety limit.
    CsvTooLarge {
        /// Env var name.
        var: &'static str,
        /// Number of parsed items.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// A tag entry was not of the form `key=value`.
    InvalidTagEntry {
        /// Env var name.
        var: &'static str,
        /// Invalid entry.
        entry: String,
    },
    /// A tag key contained characters outside `[A-Za-z0-9._-]`.
    InvalidTagKey {
        /// Env var name.
        var: &'static str,
        /// Invalid key.
        key: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_env_var"),
            Self::InvalidBool { .. } => ErrorCode::new("config", "invalid_env_bool"),
            Self::InvalidInt { .. } => ErrorCode::new("config", "invalid_env_int"),
            Self::CsvTooLarge { .. } | Self::InvalidTagEntry { .. } | Self::InvalidTagKey { .. } => {
                ErrorCode::new("config", "invalid_env_tags")
            },
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidBool { var, .. } => write!(formatter, "{var} must be a boolean"),
            Self::InvalidInt { var, .. } => write!(formatter, "{var} must be an integer"),
            Self::CsvTooLarge { var, len, max } => {
                write!(formatter, "{var} is too large ({len} items, max {max})")
            },
            Self::InvalidTagEntry { var, entry } => {
                write!(formatter, "{var} contains invalid tag entry: {entry}")
            },
            Self::InvalidTagKey { var, key } => {
                write!(formatter, "{var} contains invalid tag key: {key}")
            },
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let mut envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } => {
                envelope = envelope.with_metadata("env_var", var);
            },
            EnvParseError::InvalidBool { var, value } | EnvParseError::InvalidInt { var, value } => {
                envelope = envelope
                    .with_metadata("env_var", var)
                    .with_metadata("value", redact_if_secret(var, &value));
            },
            EnvParseError::CsvTooLarge { var, len, max } => {
                envelope = envelope
                    .with_metadata("env_var", var)
                    .with_metadata("len", len.to_string())
                    .with_metadata("max", max.to_string());
            },
            EnvParseError::InvalidTagEntry { var, entry } => {
                envelope = envelope
                    .with_metadata("env_var", var)
                    .with_metadata("entry", entry);
            },
            EnvParseError::InvalidTagKey { var, key } => {
                envelope = envelope
                    .with_metadata("env_var", var)
                    .with_metadata("key", key);
            },
        }

        envelope
    }
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    Ok(Some(trimmed.to_owned().into_boxed_str()))
}

fn parse_optional_u32(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u32>, EnvParseError> {
    let Some(trimmed) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };

    trimmed
        .parse::<u32>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: trimmed.into_string(),
        })
}

fn parse_optional_bool(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<bool>, EnvParseError> {
    let Some(trimmed) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };

    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(EnvParseError::InvalidBool {
            var,
            value: trimmed.into_string(),
        }),
    }
}

fn parse_optional_point_tags(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<PointTags>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let mut tags = PointTags::new();
    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(EnvParseError::InvalidTagEntry {
                var,
                entry: entry.to_owned(),
            });
        };
        let (key, value) = (key.trim(), value.trim());
        if value.is_empty() {
            return Err(EnvParseError::InvalidTagEntry {
                var,
                entry: entry.to_owned(),
            });
        }
        if !is_valid_tag_key(key) {
            return Err(EnvParseError::InvalidTagKey {
                var,
                key: key.to_owned(),
            });
        }
        tags.insert(key.into(), value.into());
    }

    if tags.len() > MAX_POINT_TAGS {
        return Err(EnvParseError::CsvTooLarge {
            var,
            len: tags.len(),
            max: MAX_POINT_TAGS,
        });
    }

    Ok(Some(tags))
}

/// Returns true for non-empty keys restricted to `[A-Za-z0-9._-]`.
pub fn is_valid_tag_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn empty_map_yields_no_overrides() -> Result<(), EnvParseError> {
        assert_eq!(WrapperEnv::from_map(&BTreeMap::new())?, WrapperEnv::default());
        Ok(())
    }

    #[test]
    fn bools_accept_common_spellings() -> Result<(), EnvParseError> {
        for (raw, expected) in [("TRUE", true), ("1", true), ("no", false), (" off ", false)] {
            let env = WrapperEnv::from_map(&map(&[(ENV_REPORT_STANDARD_METRICS, raw)]))?;
            assert_eq!(env.report_standard_metrics, Some(expected), "{raw}");
        }
        Ok(())
    }

    #[test]
    fn invalid_bool_fails_fast() {
        let error = WrapperEnv::from_map(&map(&[(ENV_REPORT_STANDARD_METRICS, "maybe")]));
        assert!(matches!(error, Err(EnvParseError::InvalidBool { .. })));
    }

    #[test]
    fn point_tags_parse_into_ordered_map() -> Result<(), EnvParseError> {
        let env = WrapperEnv::from_map(&map(&[(
            ENV_POINT_TAGS,
            "team=payments, env=prod,,tier = gold",
        )]))?;
        let tags = env.point_tags.unwrap_or_default();
        let keys: Vec<&str> = tags.keys().map(AsRef::as_ref).collect();
        assert_eq!(keys, vec!["env", "team", "tier"]);
        assert_eq!(tags.get("tier").map(AsRef::as_ref), Some("gold"));
        Ok(())
    }

    #[test]
    fn point_tags_reject_bad_entries() {
        let missing_value = WrapperEnv::from_map(&map(&[(ENV_POINT_TAGS, "team")]));
        assert!(matches!(
            missing_value,
            Err(EnvParseError::InvalidTagEntry { .. })
        ));

        let bad_key = WrapperEnv::from_map(&map(&[(ENV_POINT_TAGS, "te am=x")]));
        assert!(matches!(bad_key, Err(EnvParseError::InvalidTagKey { .. })));
    }

    #[test]
    fn secret_values_are_redacted_in_envelopes() {
        let envelope: ErrorEnvelope = EnvParseError::InvalidInt {
            var: "WAVEFRONT_API_TOKEN",
            value: "abc".to_owned(),
        }
        .into();
        assert_eq!(
            envelope.metadata.get("value").map(String::as_str),
            Some(wflambda_shared::REDACTED)
        );
    }

    #[test]
    fn tag_key_charset() {
        assert!(is_valid_tag_key("deploy.stage_1-a"));
        assert!(!is_valid_tag_key(""));
        assert!(!is_valid_tag_key("a/b"));
    }
}
