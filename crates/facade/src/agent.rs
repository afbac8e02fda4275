//! Agent wiring: configuration, default adapters, and wrapped handlers.

use serde_json::Value;
use std::sync::Arc;
use wflambda_adapters::{JsonLineSender, ProcMemoryStats, StdoutLineSink, TracingLogger};
use wflambda_app::{
    Handler, HandlerWrapper, InvocationCounters, InvocationResult, LambdaHandler, WrapperDeps,
    WrapperSettings, build,
};
use wflambda_config::{FunctionEnv, WrapperConfig};
use wflambda_domain::InvocationContext;
use wflambda_shared::Result;

/// Owns the configuration, the port implementations, and the process-wide
/// counters shared by every handler it wraps.
#[derive(Clone)]
pub struct Agent {
    config: Arc<WrapperConfig>,
    deps: WrapperDeps,
    counters: Arc<InvocationCounters>,
}

impl Agent {
    /// Create an agent from explicit configuration and ports.
    pub fn new(config: WrapperConfig, deps: WrapperDeps) -> Self {
        Self {
            config: Arc::new(config),
            deps,
            counters: Arc::new(InvocationCounters::new()),
        }
    }

    /// Read configuration from the process environment and wire the default
    /// adapters (stdout JSON-line sender, `/proc/meminfo`, `tracing` logger).
    pub fn from_env() -> Result<Self> {
        let config = WrapperConfig::from_std_env()?;
        Ok(Self::with_default_adapters(config))
    }

    /// Wire the default adapters around `config`.
    pub fn with_default_adapters(config: WrapperConfig) -> Self {
        Self::new(config, default_deps())
    }

    /// Effective configuration.
    pub fn config(&self) -> &WrapperConfig {
        &self.config
    }

    /// Counters shared by all handlers wrapped by this agent.
    pub const fn counters(&self) -> &Arc<InvocationCounters> {
        &self.counters
    }

    /// Wrap a handler.
    pub fn wrap(&self, handler: Handler) -> WrappedHandler {
        self.wrap_optional(Some(handler))
    }

    /// Wrap a possibly absent handler. An absent handler fails every
    /// invocation with "handler is nil".
    pub fn wrap_optional(&self, handler: Option<Handler>) -> WrappedHandler {
        let adapted = build(handler);
        let inner = if self.config.report_standard_metrics {
            Inner::Instrumented(HandlerWrapper::new(
                adapted,
                self.deps.clone(),
                WrapperSettings {
                    point_tags: self.config.base_point_tags(),
                },
                Arc::clone(&self.counters),
            ))
        } else {
            Inner::Plain(adapted)
        };
        WrappedHandler {
            inner,
            function: self.config.function.clone(),
        }
    }
}

fn default_deps() -> WrapperDeps {
    WrapperDeps {
        sender: Arc::new(JsonLineSender::new(Arc::new(StdoutLineSink))),
        memory: Arc::new(ProcMemoryStats::default()),
        logger: Some(Arc::new(TracingLogger::new())),
    }
}

#[derive(Clone)]
enum Inner {
    Plain(LambdaHandler),
    Instrumented(HandlerWrapper),
}

/// Handler produced by [`Agent::wrap`].
#[derive(Clone)]
pub struct WrappedHandler {
    inner: Inner,
    function: FunctionEnv,
}

impl WrappedHandler {
    /// Whether invocations are measured and reported.
    pub const fn is_instrumented(&self) -> bool {
        matches!(self.inner, Inner::Instrumented(_))
    }

    /// Function identity used when building contexts from the environment.
    pub const fn function(&self) -> &FunctionEnv {
        &self.function
    }

    /// Build a context for this function from a request id and invoked ARN.
    pub fn context(
        &self,
        request_id: impl Into<Box<str>>,
        invoked_function_arn: impl Into<Box<str>>,
    ) -> InvocationContext {
        self.function.context(request_id, invoked_function_arn)
    }

    /// Run one invocation.
    pub async fn invoke(&self, context: InvocationContext, payload: Value) -> InvocationResult {
        match &self.inner {
            Inner::Plain(adapted) => adapted.as_ref()(context, payload).await,
            Inner::Instrumented(wrapper) => wrapper.invoke(context, payload).await,
        }
    }
}
