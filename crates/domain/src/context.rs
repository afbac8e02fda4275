//! Per-invocation execution context.

use serde::{Deserialize, Serialize};

/// Identity of the current invocation, supplied by the host environment.
///
/// Read-only for the duration of an invocation. Handlers that declare a
/// context parameter receive their own clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationContext {
    request_id: Box<str>,
    function_name: Box<str>,
    function_version: Box<str>,
    invoked_function_arn: Box<str>,
}

impl InvocationContext {
    /// Build a context from raw identity values.
    pub fn new(
        request_id: impl Into<Box<str>>,
        function_name: impl Into<Box<str>>,
        function_version: impl Into<Box<str>>,
        invoked_function_arn: impl Into<Box<str>>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            function_name: function_name.into(),
            function_version: function_version.into(),
            invoked_function_arn: invoked_function_arn.into(),
        }
    }

    /// Host-assigned request id.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Deployed function name (also used as the metric source).
    #[must_use]
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Executed function version (`$LATEST` or a published number).
    #[must_use]
    pub fn function_version(&self) -> &str {
        &self.function_version
    }

    /// Full ARN the caller used to invoke the function.
    #[must_use]
    pub fn invoked_function_arn(&self) -> &str {
        &self.invoked_function_arn
    }
}
