use crate::context::ParseContext;
use crate::error::MatchResult;

/// A handle to a node in a [`Grammar`](crate::Grammar).
///
/// Rules are cheap indices into the grammar's arena, so recursive rules can
/// reference each other without ownership cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rule(pub(crate) usize);

impl Rule {
    /// Returns the arena index of this rule.
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The contract every grammar node implements.
///
/// A node is an immutable description of a rule; all mutation goes through
/// the [`ParseContext`]. Nodes are always invoked through
/// [`ParseContext::invoke`], which restores the position and rolls back the
/// side-effect log when `parse` returns `Ok(false)`, so implementations only
/// need to undo work they want to discard while still succeeding.
///
/// The remaining methods describe the node's shape to the well-formedness
/// check. `nullable` is an oracle telling whether another rule can succeed
/// without consuming input.
pub trait Parser<T, V> {
    /// Attempts to match at the current position.
    ///
    /// On success the position must sit right after the matched span. On
    /// failure the position and log may be left anywhere; the caller restores
    /// them.
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult;

    /// A short structural label, used when the rule has no name.
    fn label(&self) -> String;

    /// Every rule this node may invoke.
    fn children(&self) -> Vec<Rule> {
        Vec::new()
    }

    /// The children that may be invoked before this node consumes any input.
    fn first_children(&self, nullable: &dyn Fn(Rule) -> bool) -> Vec<Rule> {
        let _ = nullable;
        self.children()
    }

    /// Whether this node can succeed without consuming input.
    fn nullable(&self, nullable: &dyn Fn(Rule) -> bool) -> bool {
        let _ = nullable;
        false
    }

    /// Whether this node loops over a body that can succeed without
    /// consuming input (and would therefore never terminate).
    fn repeats_nullable(&self, nullable: &dyn Fn(Rule) -> bool) -> bool {
        let _ = nullable;
        false
    }
}
