//! Point tags attached to every reported metric.

use crate::arn::{ArnError, ArnResource, InvokedArn};
use crate::context::InvocationContext;
use std::collections::BTreeMap;

/// Ordered tag map sent alongside each metric.
pub type PointTags = BTreeMap<Box<str>, Box<str>>;

/// Full invoked ARN.
pub const TAG_LAMBDA_ARN: &str = "LambdaArn";
/// Metric source (function name).
pub const TAG_SOURCE: &str = "source";
/// Function name.
pub const TAG_FUNCTION_NAME: &str = "FunctionName";
/// Executed function version.
pub const TAG_EXECUTED_VERSION: &str = "ExecutedVersion";
/// Region segment of the ARN.
pub const TAG_REGION: &str = "Region";
/// Account id segment of the ARN.
pub const TAG_ACCOUNT_ID: &str = "accountId";
/// Function resource (`name` or `name:qualifier`).
pub const TAG_RESOURCE: &str = "Resource";
/// Event source mapping id.
pub const TAG_EVENT_SOURCE_MAPPINGS: &str = "EventSourceMappings";
/// Configured function memory in MB.
pub const TAG_MEMORY_SIZE: &str = "FunctionMemorySize";

/// Outcome of tag resolution for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTags {
    /// Base tags merged with identity tags.
    pub tags: PointTags,
    /// Set when the ARN could not be parsed; ARN-derived tags are then absent.
    pub arn_error: Option<ArnError>,
}

/// Build the tag set for a single invocation.
///
/// Identity tags overwrite base tags with the same key. The result is a fresh
/// map; `base` is never mutated.
pub fn resolve_point_tags(base: &PointTags, context: &InvocationContext) -> ResolvedTags {
    let mut tags = base.clone();
    insert(&mut tags, TAG_LAMBDA_ARN, context.invoked_function_arn());
    insert(&mut tags, TAG_SOURCE, context.function_name());
    insert(&mut tags, TAG_FUNCTION_NAME, context.function_name());
    insert(&mut tags, TAG_EXECUTED_VERSION, context.function_version());

    let arn_error = match InvokedArn::parse(context.invoked_function_arn()) {
        Ok(arn) => {
            insert_arn_tags(&mut tags, &arn);
            None
        },
        Err(error) => Some(error),
    };

    ResolvedTags { tags, arn_error }
}

fn insert_arn_tags(tags: &mut PointTags, arn: &InvokedArn) {
    insert(tags, TAG_REGION, arn.region());
    insert(tags, TAG_ACCOUNT_ID, arn.account_id());
    match arn.resource() {
        ArnResource::Function {
            name,
            qualifier: Some(qualifier),
        } => insert(tags, TAG_RESOURCE, &format!("{name}:{qualifier}")),
        ArnResource::Function {
            name,
            qualifier: None,
        } => insert(tags, TAG_RESOURCE, name),
        ArnResource::EventSourceMapping { id } => insert(tags, TAG_EVENT_SOURCE_MAPPINGS, id),
        ArnResource::Other { .. } => {},
    }
}

fn insert(tags: &mut PointTags, key: &str, value: &str) {
    tags.insert(key.into(), value.into());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(arn: &str) -> InvocationContext {
        InvocationContext::new("req-1", "my-func", "3", arn)
    }

    fn tag<'a>(tags: &'a PointTags, key: &str) -> Option<&'a str> {
        tags.get(key).map(AsRef::as_ref)
    }

    #[test]
    fn qualified_function_arn_sets_resource_with_qualifier() {
        let resolved = resolve_point_tags(
            &PointTags::new(),
            &context("arn:aws:lambda:us-west-2:123456789012:function:my-func:3"),
        );
        assert!(resolved.arn_error.is_none());
        assert_eq!(tag(&resolved.tags, TAG_REGION), Some("us-west-2"));
        assert_eq!(tag(&resolved.tags, TAG_ACCOUNT_ID), Some("123456789012"));
        assert_eq!(tag(&resolved.tags, TAG_RESOURCE), Some("my-func:3"));
        assert_eq!(tag(&resolved.tags, TAG_SOURCE), Some("my-func"));
        assert_eq!(tag(&resolved.tags, TAG_FUNCTION_NAME), Some("my-func"));
        assert_eq!(tag(&resolved.tags, TAG_EXECUTED_VERSION), Some("3"));
        assert_eq!(tag(&resolved.tags, TAG_EVENT_SOURCE_MAPPINGS), None);
    }

    #[test]
    fn event_source_mapping_arn_skips_resource() {
        let resolved = resolve_point_tags(
            &PointTags::new(),
            &context("arn:aws:lambda:us-west-2:123456789012:event-source-mappings:abc123"),
        );
        assert_eq!(tag(&resolved.tags, TAG_EVENT_SOURCE_MAPPINGS), Some("abc123"));
        assert_eq!(tag(&resolved.tags, TAG_RESOURCE), None);
    }

    #[test]
    fn malformed_arn_keeps_identity_tags_only() {
        let resolved = resolve_point_tags(&PointTags::new(), &context("not-an-arn"));
        assert!(resolved.arn_error.is_some());
        assert_eq!(tag(&resolved.tags, TAG_LAMBDA_ARN), Some("not-an-arn"));
        assert_eq!(tag(&resolved.tags, TAG_FUNCTION_NAME), Some("my-func"));
        assert_eq!(tag(&resolved.tags, TAG_REGION), None);
        assert_eq!(tag(&resolved.tags, TAG_ACCOUNT_ID), None);
    }

    #[test]
    fn base_tags_are_merged_and_left_untouched() {
        let mut base = PointTags::new();
        base.insert("team".into(), "payments".into());
        base.insert(TAG_SOURCE.into(), "stale".into());

        let resolved = resolve_point_tags(
            &base,
            &context("arn:aws:lambda:us-west-2:123456789012:function:my-func"),
        );
        assert_eq!(tag(&resolved.tags, "team"), Some("payments"));
        assert_eq!(tag(&resolved.tags, TAG_SOURCE), Some("my-func"));
        assert_eq!(tag(&resolved.tags, TAG_RESOURCE), Some("my-func"));
        assert_eq!(tag(&base, TAG_SOURCE), Some("stale"));
    }
}
