use crate::context::ParseContext;
use crate::error::MatchResult;
use crate::grammar::Grammar;
use crate::traits::{Parser, Rule};

/// Matches every child in order.
///
/// There is no backtracking inside a sequence: a failing child fails the
/// whole sequence, which its caller rolls back.
struct Sequence {
    children: Vec<Rule>,
}

impl<T, V> Parser<T, V> for Sequence {
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        for &child in &self.children {
            if !ctx.invoke(child)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn label(&self) -> String {
        "seq".to_string()
    }

    fn children(&self) -> Vec<Rule> {
        self.children.clone()
    }

    fn first_children(&self, nullable: &dyn Fn(Rule) -> bool) -> Vec<Rule> {
        let mut first = Vec::new();
        for &child in &self.children {
            first.push(child);
            if !nullable(child) {
                break;
            }
        }
        first
    }

    fn nullable(&self, nullable: &dyn Fn(Rule) -> bool) -> bool {
        self.children.iter().all(|&child| nullable(child))
    }
}

/// Ordered choice: the first child to match wins.
struct Choice {
    children: Vec<Rule>,
}

impl<T, V> Parser<T, V> for Choice {
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        for &child in &self.children {
            if ctx.invoke(child)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn label(&self) -> String {
        "choice".to_string()
    }

    fn children(&self) -> Vec<Rule> {
        self.children.clone()
    }

    fn nullable(&self, nullable: &dyn Fn(Rule) -> bool) -> bool {
        self.children.iter().any(|&child| nullable(child))
    }
}

impl<T, V> Grammar<T, V> {
    /// Matches `children` one after the other.
    pub fn seq(&mut self, children: impl IntoIterator<Item = Rule>) -> Rule {
        self.add(Sequence {
            children: children.into_iter().collect(),
        })
    }

    /// Matches the first of `children` that matches.
    pub fn choice(&mut self, children: impl IntoIterator<Item = Rule>) -> Rule {
        self.add(Choice {
            children: children.into_iter().collect(),
        })
    }
}
