//! The expression grammar shared by both calculators.
//!
//! ```text
//! expr    = sum
//! sum     = product (("+" | "-") product)*
//! product = power (("*" | "/") power)*
//! power   = "-"* atom ("^" "-"* atom)*
//! atom    = number | "(" expr ")"
//! ```
//!
//! `^` is right-associative and unary minus binds tighter than it, so
//! `-2^2` is `(-2)^2`.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::Parsed;
use anyhow::{bail, Context};
use peg_framework::{Collected, Grammar, GrammarError, ParseResult, Rule, StateKey};
use std::ops::Range;

/// Extracts the source span of a match.
pub type SpanOf<T> = fn(&Collected<'_, T, Expr>) -> Range<usize>;

/// The terminal rules an expression grammar is built over.
pub struct Terminals {
    /// Pushes one [`Expr::Number`].
    pub number: Rule,
    pub plus: Rule,
    pub minus: Rule,
    pub star: Rule,
    pub slash: Rule,
    pub caret: Rule,
    pub lparen: Rule,
    pub rparen: Rule,
}

/// State slots tracking parenthesis nesting.
#[derive(Debug, Clone, Copy)]
pub struct Nesting {
    depth: StateKey<usize>,
    deepest: StateKey<usize>,
}

impl Nesting {
    pub fn new() -> Self {
        Self {
            depth: StateKey::new("nesting.depth", || 0),
            deepest: StateKey::new("nesting.deepest", || 0),
        }
    }

    /// Returns the key holding the deepest nesting seen.
    pub fn deepest(&self) -> &StateKey<usize> {
        &self.deepest
    }
}

impl Default for Nesting {
    fn default() -> Self {
        Self::new()
    }
}

/// Adds the expression rules to `g` and returns the `expr` rule.
pub fn build<T: 'static>(
    g: &mut Grammar<T, Expr>,
    terminals: Terminals,
    nesting: Nesting,
    span_of: SpanOf<T>,
) -> Result<Rule, GrammarError> {
    let expr = g.forward("expr");

    let open = g.action(terminals.lparen, move |ctx, _| {
        let depth = *ctx.state(&nesting.depth) + 1;
        ctx.set_state(&nesting.depth, depth);
        if depth > *ctx.state(&nesting.deepest) {
            ctx.set_state(&nesting.deepest, depth);
        }
        Ok(true)
    });
    let close = g.action(terminals.rparen, move |ctx, _| {
        ctx.update_state(&nesting.depth, |depth| depth.saturating_sub(1));
        Ok(true)
    });
    let group = g.seq([open, expr, close]);
    let group = g.push(group, move |c| Expr::Group {
        expr: Box::new(c.values()[0].clone()),
        span: span_of(c),
    });
    let group = g.named(group, "group");
    let atom = g.choice([terminals.number, group]);
    let atom = g.named(atom, "atom");

    let power = g
        .right_expression(atom)
        .infix(terminals.caret, binary(BinaryOp::Power, span_of))
        .prefix(terminals.minus, move |c| Expr::Unary {
            op: UnaryOp::Negate,
            operand: Box::new(c.values()[0].clone()),
            span: span_of(c),
        })
        .named("power")
        .build();
    let product = g
        .left_expression(power)
        .infix(terminals.star, binary(BinaryOp::Multiply, span_of))
        .infix(terminals.slash, binary(BinaryOp::Divide, span_of))
        .named("product")
        .build();
    let sum = g
        .left_expression(product)
        .infix(terminals.plus, binary(BinaryOp::Add, span_of))
        .infix(terminals.minus, binary(BinaryOp::Subtract, span_of))
        .named("sum")
        .build();

    g.define(expr, sum)?;
    Ok(expr)
}

fn binary<T: 'static>(
    op: BinaryOp,
    span_of: SpanOf<T>,
) -> impl Fn(&Collected<'_, T, Expr>) -> Expr + Send + Sync + 'static {
    move |c| Expr::Binary {
        op,
        left: Box::new(c.values()[0].clone()),
        right: Box::new(c.values()[1].clone()),
        span: span_of(c),
    }
}

/// Turns a finished parse into a [`Parsed`] expression, or an error whose
/// message locates the problem with `locate`.
pub(crate) fn into_parsed(
    mut result: ParseResult<Expr>,
    nesting: &Nesting,
    locate: impl Fn(usize) -> String,
) -> anyhow::Result<Parsed> {
    if let Some(error) = result.take_thrown() {
        let at = locate(error.position());
        return Err(anyhow::Error::new(error).context(format!("evaluation aborted at {at}")));
    }
    if !result.full_match() {
        let at = locate(result.error_position().unwrap_or_default());
        bail!("syntax error at {at}");
    }
    let max_nesting = result
        .state()
        .get(nesting.deepest())
        .copied()
        .unwrap_or_default();
    let expr = result
        .into_values()
        .pop()
        .context("the parse produced no expression")?;
    Ok(Parsed { expr, max_nesting })
}
