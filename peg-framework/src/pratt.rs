//! Operator-precedence expression builders.
//!
//! Each builder parses one precedence level. Levels are stacked by using a
//! tighter level as the operand of a looser one:
//!
//! ```
//! use peg_framework::{Grammar, ParseOptions};
//!
//! let mut g: Grammar<(), i64> = Grammar::new();
//! let digit = g.char_range('0', '9');
//! let num = g.push(digit, |c| c.text().and_then(|t| t.parse().ok()).unwrap_or(0));
//! let star = g.literal("*");
//! let plus = g.literal("+");
//! let product = g
//!     .left_expression(num)
//!     .infix(star, |c| c.values()[0] * c.values()[1])
//!     .build();
//! let sum = g
//!     .left_expression(product)
//!     .infix(plus, |c| c.values()[0] + c.values()[1])
//!     .build();
//!
//! let result = peg_framework::parse_str(&g, sum, "1+2*3", &ParseOptions::default()).unwrap();
//! assert_eq!(result.values(), &[7]);
//! ```

use crate::combinators::{collect_into, BuildFn, Collected};
use crate::context::ParseContext;
use crate::error::{BoxError, MatchResult};
use crate::grammar::Grammar;
use crate::traits::{Parser, Rule};

enum Step<T, V> {
    /// An operator followed by a right operand.
    Infix { op: Rule, build: BuildFn<T, V> },
    /// A postfix form applied to everything parsed so far.
    Suffix { rule: Rule, build: BuildFn<T, V> },
}

/// Left-associative level: `left (op right | suffix)*`, folded as the chain
/// is parsed, so `a - b - c` builds `(a - b) - c`.
struct LeftExpression<T, V> {
    left: Rule,
    right: Rule,
    steps: Vec<Step<T, V>>,
}

impl<T, V> Parser<T, V> for LeftExpression<T, V> {
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        let base = ctx.stack().len();
        let start = ctx.pos();
        if !ctx.invoke(self.left)? {
            return Ok(false);
        }
        'chain: loop {
            for step in &self.steps {
                let before = ctx.checkpoint();
                let (matched, build) = match step {
                    Step::Infix { op, build } => {
                        (ctx.invoke(*op)? && ctx.invoke(self.right)?, build)
                    }
                    Step::Suffix { rule, build } => (ctx.invoke(*rule)?, build),
                };
                if matched {
                    if !collect_into(ctx, base, start, build.as_ref())? {
                        return Ok(false);
                    }
                    continue 'chain;
                }
                ctx.restore(before);
            }
            return Ok(true);
        }
    }

    fn label(&self) -> String {
        "left_expression".to_string()
    }

    fn children(&self) -> Vec<Rule> {
        let mut children = vec![self.left, self.right];
        children.extend(self.steps.iter().map(|step| match step {
            Step::Infix { op, .. } => *op,
            Step::Suffix { rule, .. } => *rule,
        }));
        children
    }

    fn first_children(&self, nullable: &dyn Fn(Rule) -> bool) -> Vec<Rule> {
        let mut first = vec![self.left];
        if nullable(self.left) {
            for step in &self.steps {
                match step {
                    Step::Infix { op, .. } => {
                        first.push(*op);
                        if nullable(*op) {
                            first.push(self.right);
                        }
                    }
                    Step::Suffix { rule, .. } => first.push(*rule),
                }
            }
        }
        first
    }

    fn nullable(&self, nullable: &dyn Fn(Rule) -> bool) -> bool {
        nullable(self.left)
    }

    fn repeats_nullable(&self, nullable: &dyn Fn(Rule) -> bool) -> bool {
        self.steps.iter().any(|step| match step {
            Step::Infix { op, .. } => nullable(*op) && nullable(self.right),
            Step::Suffix { rule, .. } => nullable(*rule),
        })
    }
}

struct Operator<T, V> {
    rule: Rule,
    build: BuildFn<T, V>,
}

/// Right-associative level: `prefix* left (op prefix* right)*`, folded from
/// the last operator back, so `a ^ b ^ c` builds `a ^ (b ^ c)`. Prefix
/// operators bind tighter than the infix ones.
struct RightExpression<T, V> {
    left: Rule,
    right: Rule,
    infixes: Vec<Operator<T, V>>,
    prefixes: Vec<Operator<T, V>>,
}

impl<T, V> RightExpression<T, V> {
    fn operand(&self, ctx: &mut ParseContext<'_, T, V>, operand: Rule) -> MatchResult {
        let mut pending = Vec::new();
        'prefixes: loop {
            for prefix in &self.prefixes {
                let base = ctx.stack().len();
                let start = ctx.pos();
                if ctx.invoke(prefix.rule)? {
                    pending.push((base, start, prefix));
                    continue 'prefixes;
                }
            }
            break;
        }
        if !ctx.invoke(operand)? {
            return Ok(false);
        }
        for (base, start, prefix) in pending.into_iter().rev() {
            if !collect_into(ctx, base, start, prefix.build.as_ref())? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<T, V> Parser<T, V> for RightExpression<T, V> {
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        let mut left = (ctx.stack().len(), ctx.pos());
        if !self.operand(ctx, self.left)? {
            return Ok(false);
        }
        let mut chain = Vec::new();
        'chain: loop {
            for infix in &self.infixes {
                let before = ctx.checkpoint();
                if ctx.invoke(infix.rule)? {
                    let next = (ctx.stack().len(), ctx.pos());
                    if self.operand(ctx, self.right)? {
                        chain.push((left, infix));
                        left = next;
                        continue 'chain;
                    }
                }
                ctx.restore(before);
            }
            break;
        }
        for ((base, start), infix) in chain.into_iter().rev() {
            if !collect_into(ctx, base, start, infix.build.as_ref())? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn label(&self) -> String {
        "right_expression".to_string()
    }

    fn children(&self) -> Vec<Rule> {
        let mut children = vec![self.left, self.right];
        children.extend(self.infixes.iter().map(|infix| infix.rule));
        children.extend(self.prefixes.iter().map(|prefix| prefix.rule));
        children
    }

    fn first_children(&self, nullable: &dyn Fn(Rule) -> bool) -> Vec<Rule> {
        let mut first: Vec<Rule> = self.prefixes.iter().map(|prefix| prefix.rule).collect();
        first.push(self.left);
        if nullable(self.left) {
            for infix in &self.infixes {
                first.push(infix.rule);
                if nullable(infix.rule) {
                    first.push(self.right);
                }
            }
        }
        first
    }

    fn nullable(&self, nullable: &dyn Fn(Rule) -> bool) -> bool {
        nullable(self.left)
    }

    fn repeats_nullable(&self, nullable: &dyn Fn(Rule) -> bool) -> bool {
        self.prefixes.iter().any(|prefix| nullable(prefix.rule))
            || self
                .infixes
                .iter()
                .any(|infix| nullable(infix.rule) && nullable(self.right))
    }
}

fn infallible<T, V, F>(build: F) -> BuildFn<T, V>
where
    F: Fn(&Collected<'_, T, V>) -> V + Send + Sync + 'static,
{
    Box::new(move |collected| Ok(build(collected)))
}

/// Builds a left-associative precedence level.
///
/// Created by [`Grammar::left_expression`]. Steps are tried in the order
/// they are declared.
pub struct LeftExpressionBuilder<'g, T, V> {
    grammar: &'g mut Grammar<T, V>,
    left: Rule,
    right: Rule,
    steps: Vec<Step<T, V>>,
    name: Option<String>,
}

impl<T: 'static, V: 'static> LeftExpressionBuilder<'_, T, V> {
    /// Uses a different rule for the operands right of an operator.
    pub fn right(mut self, right: Rule) -> Self {
        self.right = right;
        self
    }

    /// Adds a binary operator. `build` receives the left value, the values
    /// pushed by `op` and the right value.
    pub fn infix<F>(self, op: Rule, build: F) -> Self
    where
        F: Fn(&Collected<'_, T, V>) -> V + Send + Sync + 'static,
    {
        self.step(Step::Infix {
            op,
            build: infallible(build),
        })
    }

    /// Like [`LeftExpressionBuilder::infix`] with a fallible builder.
    pub fn try_infix<F>(self, op: Rule, build: F) -> Self
    where
        F: Fn(&Collected<'_, T, V>) -> Result<V, BoxError> + Send + Sync + 'static,
    {
        self.step(Step::Infix {
            op,
            build: Box::new(build),
        })
    }

    /// Adds a postfix form. `build` receives the value parsed so far
    /// followed by the values pushed by `suffix`.
    pub fn suffix<F>(self, suffix: Rule, build: F) -> Self
    where
        F: Fn(&Collected<'_, T, V>) -> V + Send + Sync + 'static,
    {
        self.step(Step::Suffix {
            rule: suffix,
            build: infallible(build),
        })
    }

    /// Names the resulting rule.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds the level to the grammar.
    pub fn build(self) -> Rule {
        let rule = self.grammar.add(LeftExpression {
            left: self.left,
            right: self.right,
            steps: self.steps,
        });
        match self.name {
            Some(name) => self.grammar.named(rule, name),
            None => rule,
        }
    }

    fn step(mut self, step: Step<T, V>) -> Self {
        self.steps.push(step);
        self
    }
}

/// Builds a right-associative precedence level.
///
/// Created by [`Grammar::right_expression`].
pub struct RightExpressionBuilder<'g, T, V> {
    grammar: &'g mut Grammar<T, V>,
    left: Rule,
    right: Rule,
    infixes: Vec<Operator<T, V>>,
    prefixes: Vec<Operator<T, V>>,
    name: Option<String>,
}

impl<T: 'static, V: 'static> RightExpressionBuilder<'_, T, V> {
    /// Uses a different rule for the operands right of an operator.
    pub fn right(mut self, right: Rule) -> Self {
        self.right = right;
        self
    }

    /// Adds a binary operator. `build` receives the left value, the values
    /// pushed by `op` and the already folded right value.
    pub fn infix<F>(mut self, op: Rule, build: F) -> Self
    where
        F: Fn(&Collected<'_, T, V>) -> V + Send + Sync + 'static,
    {
        self.infixes.push(Operator {
            rule: op,
            build: infallible(build),
        });
        self
    }

    /// Like [`RightExpressionBuilder::infix`] with a fallible builder.
    pub fn try_infix<F>(mut self, op: Rule, build: F) -> Self
    where
        F: Fn(&Collected<'_, T, V>) -> Result<V, BoxError> + Send + Sync + 'static,
    {
        self.infixes.push(Operator {
            rule: op,
            build: Box::new(build),
        });
        self
    }

    /// Adds a prefix operator. `build` receives the values pushed by
    /// `prefix` followed by the operand value.
    pub fn prefix<F>(mut self, prefix: Rule, build: F) -> Self
    where
        F: Fn(&Collected<'_, T, V>) -> V + Send + Sync + 'static,
    {
        self.prefixes.push(Operator {
            rule: prefix,
            build: infallible(build),
        });
        self
    }

    /// Names the resulting rule.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds the level to the grammar.
    pub fn build(self) -> Rule {
        let rule = self.grammar.add(RightExpression {
            left: self.left,
            right: self.right,
            infixes: self.infixes,
            prefixes: self.prefixes,
        });
        match self.name {
            Some(name) => self.grammar.named(rule, name),
            None => rule,
        }
    }
}

impl<T: 'static, V: 'static> Grammar<T, V> {
    /// Starts a left-associative level over `operand`.
    pub fn left_expression(&mut self, operand: Rule) -> LeftExpressionBuilder<'_, T, V> {
        LeftExpressionBuilder {
            grammar: self,
            left: operand,
            right: operand,
            steps: Vec::new(),
            name: None,
        }
    }

    /// Starts a right-associative level over `operand`.
    pub fn right_expression(&mut self, operand: Rule) -> RightExpressionBuilder<'_, T, V> {
        RightExpressionBuilder {
            grammar: self,
            left: operand,
            right: operand,
            infixes: Vec::new(),
            prefixes: Vec::new(),
            name: None,
        }
    }
}
