//! Arithmetic calculators built on peg-framework.
//!
//! The same expression grammar is wired twice: once over characters
//! ([`TextCalculator`]) and once over tokens produced by a lexing grammar
//! ([`TokenCalculator`]).

pub mod ast;
pub mod expression;
pub mod lexer;
pub mod text;
pub mod tokens;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use lexer::{CalcToken, Lexer, TokenKind};
pub use text::TextCalculator;
pub use tokens::TokenCalculator;

/// A parsed expression along with facts gathered while parsing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub expr: Expr,
    /// Deepest parenthesis nesting.
    pub max_nesting: usize,
}
