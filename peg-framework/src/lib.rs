//! A backtracking PEG parser-combinator engine.
//!
//! Grammars are built in a [`Grammar`] arena from combinators and run with
//! [`run`]. Every mutation a rule makes while matching (the value stack,
//! extension state, custom effects) goes through a side-effect log, so an
//! abandoned match is always undone exactly.

pub mod combinators;
pub mod context;
pub mod driver;
pub mod effect;
pub mod error;
pub mod grammar;
pub mod instrument;
pub mod options;
pub mod pratt;
pub mod stack;
pub mod state;
pub mod traits;
pub mod wellformed;

pub use combinators::{BuildFn, Collected};
pub use common_framework::{Checkpoint, Input, Position, SideEffect};
pub use context::ParseContext;
pub use driver::{parse_str, parse_tokens, run, Outcome, ParseResult};
pub use effect::{FnEffect, TrackedState};
pub use error::{BoxError, Defect, GrammarError, MatchResult, RuntimeError};
pub use grammar::Grammar;
pub use instrument::{CallStack, Frame, ParseMetrics, RuleMetrics};
pub use options::{ParseOptions, DEFAULT_MAX_DEPTH};
pub use pratt::{LeftExpressionBuilder, RightExpressionBuilder};
pub use stack::ValueStack;
pub use state::{ExtensionState, StateKey, StateSnapshot};
pub use traits::{Parser, Rule};
