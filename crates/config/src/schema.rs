//! Effective wrapper configuration.

use crate::env::{EnvParseError, WrapperEnv, std_env_map};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wflambda_domain::{InvocationContext, PointTags, TAG_MEMORY_SIZE};

/// Function name used when the host does not provide one.
pub const DEFAULT_FUNCTION_NAME: &str = "unknown";
/// Function version used when the host does not provide one.
pub const DEFAULT_FUNCTION_VERSION: &str = "$LATEST";

/// Function identity read from the host environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEnv {
    /// Deployed function name.
    pub name: Box<str>,
    /// Deployed function version.
    pub version: Box<str>,
    /// Configured memory in MB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_size_mb: Option<u32>,
}

impl Default for FunctionEnv {
    fn default() -> Self {
        Self {
            name: DEFAULT_FUNCTION_NAME.into(),
            version: DEFAULT_FUNCTION_VERSION.into(),
            memory_size_mb: None,
        }
    }
}

impl FunctionEnv {
    /// Build an invocation context for this function.
    pub fn context(
        &self,
        request_id: impl Into<Box<str>>,
        invoked_function_arn: impl Into<Box<str>>,
    ) -> InvocationContext {
        InvocationContext::new(
            request_id,
            self.name.clone(),
            self.version.clone(),
            invoked_function_arn,
        )
    }
}

/// Effective configuration for the handler wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapperConfig {
    /// Whether the telemetry decorator wraps handlers.
    pub report_standard_metrics: bool,
    /// Base point tags merged into every invocation's tag set.
    #[serde(default)]
    pub point_tags: PointTags,
    /// Function identity.
    #[serde(default)]
    pub function: FunctionEnv,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            report_standard_metrics: true,
            point_tags: PointTags::new(),
            function: FunctionEnv::default(),
        }
    }
}

impl WrapperConfig {
    /// Apply parsed env overrides on top of the defaults.
    #[must_use]
    pub fn from_env(env: WrapperEnv) -> Self {
        let defaults = Self::default();
        Self {
            report_standard_metrics: env
                .report_standard_metrics
                .unwrap_or(defaults.report_standard_metrics),
            point_tags: env.point_tags.unwrap_or(defaults.point_tags),
            function: FunctionEnv {
                name: env.function_name.unwrap_or(defaults.function.name),
                version: env.function_version.unwrap_or(defaults.function.version),
                memory_size_mb: env.memory_size_mb,
            },
        }
    }

    /// Base point tags for every invocation.
    ///
    /// Adds the configured memory size when the host reports one; an explicit
    /// tag with the same key is kept.
    #[must_use]
    pub fn base_point_tags(&self) -> PointTags {
        let mut tags = self.point_tags.clone();
        if let Some(memory_size_mb) = self.function.memory_size_mb {
            tags.entry(TAG_MEMORY_SIZE.into())
                .or_insert_with(|| memory_size_mb.to_string().into());
        }
        tags
    }

    /// Parse configuration from a key/value environment snapshot.
    pub fn from_env_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        WrapperEnv::from_map(map).map(Self::from_env)
    }

    /// Parse configuration from the process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        Self::from_env_map(&std_env_map())
    }
}
