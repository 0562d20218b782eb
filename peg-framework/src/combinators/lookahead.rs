use crate::context::ParseContext;
use crate::error::MatchResult;
use crate::grammar::Grammar;
use crate::traits::{Parser, Rule};

/// Negative lookahead: succeeds where `body` fails, consuming nothing.
struct Not {
    body: Rule,
}

impl<T, V> Parser<T, V> for Not {
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        let entry = ctx.checkpoint();
        if !ctx.invoke(self.body)? {
            return Ok(true);
        }
        ctx.restore(entry);
        // Captured while this frame is still on the call stack.
        ctx.record_failure(entry.position());
        Ok(false)
    }

    fn label(&self) -> String {
        "not".to_string()
    }

    fn children(&self) -> Vec<Rule> {
        vec![self.body]
    }

    fn nullable(&self, _: &dyn Fn(Rule) -> bool) -> bool {
        true
    }
}

/// Positive lookahead: succeeds where `body` succeeds, consuming nothing.
struct Ahead {
    body: Rule,
}

impl<T, V> Parser<T, V> for Ahead {
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        let entry = ctx.checkpoint();
        let matched = ctx.invoke(self.body)?;
        ctx.restore(entry);
        Ok(matched)
    }

    fn label(&self) -> String {
        "ahead".to_string()
    }

    fn children(&self) -> Vec<Rule> {
        vec![self.body]
    }

    fn nullable(&self, _: &dyn Fn(Rule) -> bool) -> bool {
        true
    }
}

impl<T, V> Grammar<T, V> {
    /// Succeeds without consuming input if `body` does not match here.
    ///
    /// Runtime errors raised by `body` are not turned into a match: they
    /// abort the parse like anywhere else.
    pub fn not(&mut self, body: Rule) -> Rule {
        self.add(Not { body })
    }

    /// Succeeds without consuming input if `body` matches here.
    pub fn ahead(&mut self, body: Rule) -> Rule {
        self.add(Ahead { body })
    }
}
