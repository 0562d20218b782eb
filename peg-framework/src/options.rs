use crate::instrument::ParseMetrics;
use std::sync::Arc;

/// Default limit on nested rule invocations. Sized so that the limit is hit
/// before a 2 MiB thread stack (the default for spawned threads) overflows,
/// in debug builds too. Parses running on larger stacks may raise it.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Configuration for a single parse invocation.
///
/// # Example
///
/// ```rust,ignore
/// let options = ParseOptions::default()
///     .with_call_stack(true)
///     .with_metrics(Arc::new(ParseMetrics::new()));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParseOptions {
    /// Record the rule invocation stack and keep the one observed at the
    /// furthest failure.
    pub record_call_stack: bool,

    /// Collect per-rule timings.
    pub trace: bool,

    /// Reusable sink that aggregates metrics across parses. Only fed when
    /// `trace` is set.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub metrics: Option<Arc<ParseMetrics>>,

    /// Run the well-formedness check before parsing.
    pub well_formed_check: bool,

    /// Maximum nesting of rule invocations before the parse is aborted.
    pub max_depth: usize,
}

impl ParseOptions {
    /// Sets whether the call stack is recorded.
    pub fn with_call_stack(mut self, record: bool) -> Self {
        self.record_call_stack = record;
        self
    }

    /// Sets whether per-rule timings are collected.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Feeds metrics into `sink`. Enables tracing.
    pub fn with_metrics(mut self, sink: Arc<ParseMetrics>) -> Self {
        self.metrics = Some(sink);
        self.trace = true;
        self
    }

    /// Sets whether the grammar is checked before parsing.
    pub fn with_well_formed_check(mut self, check: bool) -> Self {
        self.well_formed_check = check;
        self
    }

    /// Sets the recursion limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            record_call_stack: false,
            trace: false,
            metrics: None,
            well_formed_check: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
