use crate::context::ParseContext;
use crate::error::{GrammarError, RuntimeError};
use crate::grammar::Grammar;
use crate::instrument::{CallStack, RuleMetrics};
use crate::options::ParseOptions;
use crate::state::StateSnapshot;
use crate::traits::Rule;
use common_framework::{Input, Position};
use log::debug;

/// How a parse ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The root matched the whole input.
    FullMatch,
    /// The root matched a prefix of the input.
    PartialMatch,
    /// The root did not match.
    Failure,
    /// A runtime error aborted the parse.
    Error,
}

/// The result of one parse.
#[derive(Debug)]
pub struct ParseResult<V> {
    success: bool,
    full_match: bool,
    match_size: Option<usize>,
    error_position: Option<usize>,
    thrown: Option<RuntimeError>,
    error_call_stack: Option<CallStack>,
    values: Vec<V>,
    state: StateSnapshot,
    metrics: Option<Vec<RuleMetrics>>,
}

impl<V> ParseResult<V> {
    /// Returns `true` if the root matched.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Returns `true` if the root matched the whole input.
    pub fn full_match(&self) -> bool {
        self.full_match
    }

    /// Returns the length of the matched prefix.
    pub fn match_size(&self) -> Option<usize> {
        self.match_size
    }

    /// Returns the position to report an error at: where the runtime error
    /// was raised, or else the furthest failure. `None` on a full match.
    pub fn error_position(&self) -> Option<usize> {
        self.error_position
    }

    /// Returns the runtime error that aborted the parse.
    pub fn thrown(&self) -> Option<&RuntimeError> {
        self.thrown.as_ref()
    }

    /// Takes the runtime error out of the result.
    pub fn take_thrown(&mut self) -> Option<RuntimeError> {
        self.thrown.take()
    }

    /// Returns the call stack at the error position, if call stacks were
    /// recorded.
    pub fn error_call_stack(&self) -> Option<&CallStack> {
        self.error_call_stack.as_ref()
    }

    /// Returns the final value stack, bottom-most first.
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Consumes the result, returning the final value stack.
    pub fn into_values(self) -> Vec<V> {
        self.values
    }

    /// Returns the extension state as it was when the parse ended.
    pub fn state(&self) -> &StateSnapshot {
        &self.state
    }

    /// Returns the metrics of this parse, if tracing was enabled.
    pub fn metrics(&self) -> Option<&[RuleMetrics]> {
        self.metrics.as_deref()
    }

    /// Classifies the result.
    pub fn outcome(&self) -> Outcome {
        if self.thrown.is_some() {
            Outcome::Error
        } else if self.full_match {
            Outcome::FullMatch
        } else if self.success {
            Outcome::PartialMatch
        } else {
            Outcome::Failure
        }
    }

    /// Returns the line and column of the error position within `text`.
    pub fn error_location(&self, text: &str) -> Option<Position> {
        self.error_position
            .map(|offset| Position::locate(text, offset))
    }

    /// Renders the error call stack with the grammar's rule names.
    pub fn call_stack_report<T>(&self, grammar: &Grammar<T, V>) -> Option<String> {
        self.error_call_stack
            .as_ref()
            .map(|stack| stack.render(grammar))
    }
}

/// Runs `root` over `input`.
///
/// Unless disabled in `options`, the grammar is checked first and a
/// malformed grammar is refused without parsing anything. Extension state
/// is torn down whatever the outcome; runtime errors are reported in the
/// result rather than returned.
pub fn run<T, V>(
    grammar: &Grammar<T, V>,
    root: Rule,
    input: Input<'_, T>,
    options: &ParseOptions,
) -> Result<ParseResult<V>, GrammarError> {
    if options.well_formed_check {
        grammar.check(root)?;
    }
    debug!(
        "parsing {} input units with `{}`",
        input.len(),
        grammar.describe(root)
    );

    let mut ctx = ParseContext::new(grammar, input, options);
    let outcome = ctx.invoke(root);
    let live_stack = match outcome {
        Err(_) => ctx.call_stack().cloned(),
        Ok(_) => None,
    };
    let finished = ctx.finish();

    if let (Some(sink), Some(metrics)) = (&options.metrics, &finished.metrics) {
        sink.merge(grammar.id(), metrics);
    }

    let len = input.len();
    let result = match outcome {
        Err(error) => ParseResult {
            success: false,
            full_match: false,
            match_size: None,
            error_position: Some(error.position()),
            thrown: Some(error),
            error_call_stack: live_stack,
            values: finished.stack,
            state: finished.state,
            metrics: finished.metrics,
        },
        Ok(success) => {
            let full_match = success && finished.pos == len;
            ParseResult {
                success,
                full_match,
                match_size: success.then_some(finished.pos),
                error_position: if full_match { None } else { finished.error },
                thrown: None,
                error_call_stack: if full_match {
                    None
                } else {
                    finished.error_call_stack
                },
                values: finished.stack,
                state: finished.state,
                metrics: finished.metrics,
            }
        }
    };

    debug!(
        "parse ended: {:?}, matched {:?}, error at {:?}",
        result.outcome(),
        result.match_size,
        result.error_position
    );
    Ok(result)
}

/// Runs `root` over `text`.
pub fn parse_str<T, V>(
    grammar: &Grammar<T, V>,
    root: Rule,
    text: &str,
    options: &ParseOptions,
) -> Result<ParseResult<V>, GrammarError> {
    run(grammar, root, Input::Text(text), options)
}

/// Runs `root` over `tokens`.
pub fn parse_tokens<T, V>(
    grammar: &Grammar<T, V>,
    root: Rule,
    tokens: &[T],
    options: &ParseOptions,
) -> Result<ParseResult<V>, GrammarError> {
    run(grammar, root, Input::Tokens(tokens), options)
}
