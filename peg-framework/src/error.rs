use crate::traits::Rule;
use thiserror::Error;

/// A boxed error raised by user-supplied logic (actions, builders).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The result of attempting a match: `Ok(true)` on success, `Ok(false)` on
/// an ordinary backtracking failure, `Err` on an unrecoverable error.
pub type MatchResult = Result<bool, RuntimeError>;

/// A structural problem found by the well-formedness check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Defect {
    /// A cycle of rules that can re-enter each other without consuming input.
    #[error("Left-recursive parser cycle detected, passing through parser: {name}")]
    LeftRecursion {
        /// The rule the cycle is reported against.
        rule: Rule,
        /// Display name of `rule`.
        name: String,
        /// Display names of every rule in the cycle.
        cycle: Vec<String>,
    },
    /// A repetition whose body can succeed without consuming input.
    #[error("Nullable repetition detected: {name}")]
    NullableRepetition {
        /// The repeating rule.
        rule: Rule,
        /// Display name of `rule`.
        name: String,
    },
}

impl Defect {
    /// Returns the rule this defect is reported against.
    pub fn rule(&self) -> Rule {
        match self {
            Defect::LeftRecursion { rule, .. } | Defect::NullableRepetition { rule, .. } => *rule,
        }
    }
}

/// An error raised while preparing a grammar; the grammar is never run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// The well-formedness check found one or more defects.
    #[error("malformed grammar:{}", render_defects(.defects))]
    Malformed { defects: Vec<Defect> },

    /// A forward reference reachable from the root was never defined.
    #[error("forward reference `{name}` was never defined")]
    Unresolved { rule: Rule, name: String },

    /// `define` was called on a rule that is not a pending forward reference.
    #[error("`{name}` is not an undefined forward reference")]
    NotForward { rule: Rule, name: String },
}

impl GrammarError {
    /// Returns the defects of a malformed grammar (empty for other errors).
    pub fn defects(&self) -> &[Defect] {
        match self {
            GrammarError::Malformed { defects } => defects,
            _ => &[],
        }
    }
}

fn render_defects(defects: &[Defect]) -> String {
    defects.iter().map(|defect| format!("\n- {defect}")).collect()
}

/// An unrecoverable error raised during a parse.
///
/// Unlike a match failure this is never undone by backtracking: it aborts the
/// whole invocation.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A user action or builder callback failed.
    #[error("action in `{name}` failed at position {position}: {source}")]
    Action {
        rule: Rule,
        name: String,
        position: usize,
        #[source]
        source: BoxError,
    },

    /// The nesting of rule invocations exceeded the configured limit.
    #[error("recursion limit of {limit} exceeded in `{name}` at position {position}")]
    RecursionLimit {
        rule: Rule,
        name: String,
        position: usize,
        limit: usize,
    },

    /// A forward reference was invoked before being defined.
    #[error("forward reference `{name}` invoked at position {position} was never defined")]
    Unresolved {
        rule: Rule,
        name: String,
        position: usize,
    },
}

impl RuntimeError {
    /// Returns the input position at which the error was raised.
    pub fn position(&self) -> usize {
        match self {
            RuntimeError::Action { position, .. }
            | RuntimeError::RecursionLimit { position, .. }
            | RuntimeError::Unresolved { position, .. } => *position,
        }
    }

    /// Returns the rule that raised the error.
    pub fn rule(&self) -> Rule {
        match self {
            RuntimeError::Action { rule, .. }
            | RuntimeError::RecursionLimit { rule, .. }
            | RuntimeError::Unresolved { rule, .. } => *rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_lists_every_defect() {
        let error = GrammarError::Malformed {
            defects: vec![
                Defect::LeftRecursion {
                    rule: Rule(0),
                    name: "expr".into(),
                    cycle: vec!["expr".into()],
                },
                Defect::NullableRepetition {
                    rule: Rule(3),
                    name: "items".into(),
                },
            ],
        };
        assert_eq!(
            error.to_string(),
            "malformed grammar:\n\
             - Left-recursive parser cycle detected, passing through parser: expr\n\
             - Nullable repetition detected: items"
        );
        assert_eq!(error.defects().len(), 2);
    }

    #[test]
    fn test_runtime_error_keeps_cause() {
        let error = RuntimeError::Action {
            rule: Rule(1),
            name: "number".into(),
            position: 4,
            source: "overflow".into(),
        };
        assert_eq!(error.position(), 4);
        assert_eq!(
            std::error::Error::source(&error).map(ToString::to_string),
            Some("overflow".to_string())
        );
    }
}
