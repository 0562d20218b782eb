use crate::error::GrammarError;
use crate::traits::{Parser, Rule};
use hashbrown::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

static NEXT_GRAMMAR: AtomicUsize = AtomicUsize::new(0);

pub(crate) type BoxedParser<T, V> = Box<dyn Parser<T, V> + Send + Sync>;

struct Node<T, V> {
    parser: BoxedParser<T, V>,
    name: Option<String>,
    /// Set while the node is a forward reference awaiting its definition.
    pending: bool,
}

/// An arena of grammar rules.
///
/// Rules are added once and never removed; a [`Rule`] handle stays valid for
/// the lifetime of the grammar that issued it. Recursive and mutually
/// recursive rules refer to each other through handles, so the graph may
/// contain cycles without any ownership cycle.
///
/// A grammar is immutable once built and can be shared between threads,
/// each running its own parses.
///
/// The well-formedness verdict for each checked root is kept until the
/// grammar is next modified, so repeated parses pay for the check once.
///
/// Methods taking a [`Rule`] panic if the rule was issued by another grammar.
pub struct Grammar<T, V> {
    id: usize,
    nodes: Vec<Node<T, V>>,
    verdicts: Mutex<HashMap<Rule, Result<(), GrammarError>>>,
}

impl<T, V> Grammar<T, V> {
    /// Creates an empty grammar.
    pub fn new() -> Self {
        Self {
            id: NEXT_GRAMMAR.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
            verdicts: Mutex::default(),
        }
    }

    /// Identifies this grammar among all grammars of the process.
    pub(crate) fn id(&self) -> usize {
        self.id
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the grammar has no rule.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a custom parser and returns its handle.
    pub fn add<P>(&mut self, parser: P) -> Rule
    where
        P: Parser<T, V> + Send + Sync + 'static,
    {
        self.push_node(Box::new(parser), false)
    }

    pub(crate) fn push_node(&mut self, parser: BoxedParser<T, V>, pending: bool) -> Rule {
        self.invalidate();
        let rule = Rule(self.nodes.len());
        self.nodes.push(Node {
            parser,
            name: None,
            pending,
        });
        rule
    }

    pub(crate) fn replace_node(&mut self, rule: Rule, parser: BoxedParser<T, V>) {
        self.invalidate();
        let node = &mut self.nodes[rule.0];
        node.parser = parser;
        node.pending = false;
    }

    /// Names a rule. Names show up in defects, call stacks and metrics.
    pub fn named(&mut self, rule: Rule, name: impl Into<String>) -> Rule {
        self.invalidate();
        self.nodes[rule.0].name = Some(name.into());
        rule
    }

    /// Returns the name of a rule, if it has one.
    pub fn name(&self, rule: Rule) -> Option<&str> {
        self.nodes[rule.0].name.as_deref()
    }

    /// Returns the structural label of a rule.
    pub fn label(&self, rule: Rule) -> String {
        self.nodes[rule.0].parser.label()
    }

    /// Returns a display name for a rule: its name, or its label followed by
    /// its index.
    pub fn describe(&self, rule: Rule) -> String {
        match self.nodes.get(rule.0) {
            Some(Node {
                name: Some(name), ..
            }) => name.clone(),
            Some(node) => format!("{}{}", node.parser.label(), rule),
            None => format!("<unknown>{rule}"),
        }
    }

    /// Looks a rule up by name.
    pub fn rule(&self, name: &str) -> Option<Rule> {
        self.nodes
            .iter()
            .position(|node| node.name.as_deref() == Some(name))
            .map(Rule)
    }

    /// Returns `true` if `rule` is a forward reference that has not been
    /// defined yet.
    pub fn is_pending(&self, rule: Rule) -> bool {
        self.nodes[rule.0].pending
    }

    /// Iterates over every rule handle, in creation order.
    pub fn rules(&self) -> impl Iterator<Item = Rule> + '_ {
        (0..self.nodes.len()).map(Rule)
    }

    pub(crate) fn verdict(&self, root: Rule) -> Option<Result<(), GrammarError>> {
        self.verdicts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&root)
            .cloned()
    }

    pub(crate) fn remember_verdict(&self, root: Rule, verdict: Result<(), GrammarError>) {
        self.verdicts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(root, verdict);
    }

    fn invalidate(&mut self) {
        self.verdicts
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn parser(&self, rule: Rule) -> &(dyn Parser<T, V> + Send + Sync) {
        self.nodes[rule.0].parser.as_ref()
    }
}

impl<T, V> Default for Grammar<T, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, V> std::fmt::Debug for Grammar<T, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules().map(|rule| self.describe(rule)))
            .finish()
    }
}
