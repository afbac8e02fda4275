//! Parsing of the invoked function ARN.
//!
//! Lambda ARNs are colon-delimited:
//! `arn:<partition>:lambda:<region>:<account-id>:<resource-kind>:<name>[:<qualifier>]`.
//! Only the positional fields are interpreted; the service segment is kept
//! verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;
use wflambda_shared::{ErrorCode, ErrorEnvelope};

const MIN_SEGMENTS: usize = 7;
const QUALIFIED_SEGMENTS: usize = 8;

/// Resource kind for function ARNs.
pub const RESOURCE_KIND_FUNCTION: &str = "function";
/// Resource kind for event source mapping ARNs.
pub const RESOURCE_KIND_EVENT_SOURCE_MAPPINGS: &str = "event-source-mappings";

/// Failures while parsing an invoked ARN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArnError {
    /// The ARN string is empty after trimming.
    Empty,
    /// The ARN has fewer colon-separated segments than required.
    TooFewSegments {
        /// Number of segments found.
        segments: usize,
        /// The offending ARN.
        arn: String,
    },
}

impl fmt::Display for ArnError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => formatter.write_str("invoked function ARN is empty"),
            Self::TooFewSegments { segments, .. } => write!(
                formatter,
                "invoked function ARN has {segments} segments, expected at least {MIN_SEGMENTS}"
            ),
        }
    }
}

impl std::error::Error for ArnError {}

impl From<ArnError> for ErrorEnvelope {
    fn from(error: ArnError) -> Self {
        let envelope =
            Self::expected(ErrorCode::new("domain", "invalid_arn"), error.to_string());
        match error {
            ArnError::Empty => envelope,
            ArnError::TooFewSegments { segments, arn } => envelope
                .with_metadata("segments", segments.to_string())
                .with_metadata("arn", arn),
        }
    }
}

/// Resource addressed by the ARN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resourceKind", rename_all = "camelCase")]
pub enum ArnResource {
    /// A function, optionally qualified by version or alias.
    Function {
        /// Function name.
        name: Box<str>,
        /// Version or alias qualifier.
        qualifier: Option<Box<str>>,
    },
    /// An event source mapping.
    EventSourceMapping {
        /// Mapping identifier.
        id: Box<str>,
    },
    /// Any other resource kind.
    Other {
        /// Resource kind segment.
        kind: Box<str>,
        /// Resource name segment.
        name: Box<str>,
    },
}

/// A parsed invoked ARN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokedArn {
    partition: Box<str>,
    service: Box<str>,
    region: Box<str>,
    account_id: Box<str>,
    resource: ArnResource,
}

impl InvokedArn {
    /// Parse an invoked ARN by splitting on `:`.
    pub fn parse(input: &str) -> Result<Self, ArnError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ArnError::Empty);
        }

        let segments: Vec<&str> = trimmed.split(':').collect();
        let [_, partition, service, region, account_id, kind, name, rest @ ..] =
            segments.as_slice()
        else {
            return Err(ArnError::TooFewSegments {
                segments: segments.len(),
                arn: trimmed.to_owned(),
            });
        };

        let resource = match *kind {
            RESOURCE_KIND_FUNCTION => {
                let qualifier = match rest {
                    [qualifier] if segments.len() == QUALIFIED_SEGMENTS => {
                        Some((*qualifier).into())
                    },
                    _ => None,
                };
                ArnResource::Function {
                    name: (*name).into(),
                    qualifier,
                }
            },
            RESOURCE_KIND_EVENT_SOURCE_MAPPINGS => ArnResource::EventSourceMapping {
                id: (*name).into(),
            },
            other => ArnResource::Other {
                kind: other.into(),
                name: (*name).into(),
            },
        };

        Ok(Self {
            partition: (*partition).into(),
            service: (*service).into(),
            region: (*region).into(),
            account_id: (*account_id).into(),
            resource,
        })
    }

    /// Partition segment (`aws`, `aws-cn`, ...).
    #[must_use]
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Service segment (`lambda`).
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Region segment.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Account id segment.
    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Parsed resource.
    #[must_use]
    pub const fn resource(&self) -> &ArnResource {
        &self.resource
    }
}
