use crate::context::ParseContext;
use crate::error::{GrammarError, MatchResult};
use crate::grammar::Grammar;
use crate::traits::{Parser, Rule};

/// A forward reference that has not been defined yet.
struct Pending {
    rule: Rule,
}

impl<T, V> Parser<T, V> for Pending {
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        Err(ctx.unresolved(self.rule))
    }

    fn label(&self) -> String {
        "forward".to_string()
    }
}

/// A defined reference, delegating to its target.
struct Reference {
    target: Rule,
}

impl<T, V> Parser<T, V> for Reference {
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        ctx.invoke(self.target)
    }

    fn label(&self) -> String {
        "ref".to_string()
    }

    fn children(&self) -> Vec<Rule> {
        vec![self.target]
    }

    fn nullable(&self, nullable: &dyn Fn(Rule) -> bool) -> bool {
        nullable(self.target)
    }
}

impl<T, V> Grammar<T, V> {
    /// Declares a named rule whose definition is supplied later with
    /// [`Grammar::define`]. The handle can be used right away, which is how
    /// mutually recursive rules are written.
    pub fn forward(&mut self, name: impl Into<String>) -> Rule {
        let rule = Rule(self.len());
        let pushed = self.push_node(Box::new(Pending { rule }), true);
        self.named(pushed, name)
    }

    /// Resolves the forward reference `forward` to `target`.
    ///
    /// A forward reference is resolved exactly once; defining it again, or
    /// defining a rule that is not a forward reference, is an error.
    pub fn define(&mut self, forward: Rule, target: Rule) -> Result<(), GrammarError> {
        if !self.is_pending(forward) {
            return Err(GrammarError::NotForward {
                rule: forward,
                name: self.describe(forward),
            });
        }
        self.resolve(forward, target);
        Ok(())
    }

    /// Builds a rule that may refer to itself.
    ///
    /// `build` receives a handle to the rule being built and returns its
    /// body; the body is built once and shared by every recursive use.
    pub fn recursive<F>(&mut self, name: impl Into<String>, build: F) -> Rule
    where
        F: FnOnce(&mut Self, Rule) -> Rule,
    {
        let this = self.forward(name);
        let body = build(self, this);
        self.resolve(this, body);
        this
    }

    fn resolve(&mut self, forward: Rule, target: Rule) {
        self.replace_node(forward, Box::new(Reference { target }));
    }
}
