//! Static well-formedness analysis of a grammar.
//!
//! The check rejects the two shapes of grammar that would loop forever at
//! run time: rules that can re-enter themselves without consuming input
//! (left recursion) and repetitions whose body can match the empty string.
//! It runs over the rules reachable from a root, never over input.

use crate::error::{Defect, GrammarError};
use crate::grammar::Grammar;
use crate::traits::Rule;
use log::{debug, trace, warn};

const UNVISITED: usize = usize::MAX;

impl<T, V> Grammar<T, V> {
    /// Checks the rules reachable from `root`.
    ///
    /// Every defect found is reported, not only the first one. A forward
    /// reference that was never defined is reported on its own, since the
    /// shape of the grammar is unknown until it is.
    ///
    /// The verdict is remembered until the grammar is modified; checking the
    /// same root again does not walk the grammar.
    pub fn check(&self, root: Rule) -> Result<(), GrammarError> {
        if let Some(verdict) = self.verdict(root) {
            trace!("reusing well-formedness verdict for `{}`", self.describe(root));
            return verdict;
        }
        let verdict = self.analyze(root);
        self.remember_verdict(root, verdict.clone());
        verdict
    }

    fn analyze(&self, root: Rule) -> Result<(), GrammarError> {
        let reachable = self.reachable(root);
        debug!(
            "checking {} rules reachable from `{}`",
            reachable.len(),
            self.describe(root)
        );

        if let Some(&rule) = reachable.iter().find(|&&rule| self.is_pending(rule)) {
            return Err(GrammarError::Unresolved {
                rule,
                name: self.describe(rule),
            });
        }

        let nullable = self.nullable_rules(&reachable);
        let is_nullable = |rule: Rule| nullable[rule.0];

        let mut edges = vec![Vec::new(); self.len()];
        for &rule in &reachable {
            edges[rule.0] = self
                .parser(rule)
                .first_children(&is_nullable)
                .into_iter()
                .map(|child| child.0)
                .collect();
        }

        let mut defects = Vec::new();
        let mut cycles: Vec<Vec<usize>> = strongly_connected(&reachable, &edges)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => edges[*single].contains(single),
                _ => true,
            })
            .collect();
        for cycle in &mut cycles {
            cycle.sort_unstable();
        }
        cycles.sort();
        for cycle in cycles {
            defects.push(self.left_recursion(&cycle));
        }

        for &rule in &reachable {
            if self.parser(rule).repeats_nullable(&is_nullable) {
                defects.push(Defect::NullableRepetition {
                    rule,
                    name: self.describe(rule),
                });
            }
        }

        if defects.is_empty() {
            return Ok(());
        }
        for defect in &defects {
            warn!("{defect}");
        }
        Err(GrammarError::Malformed { defects })
    }

    /// Returns the rules reachable from `root`, in discovery order.
    fn reachable(&self, root: Rule) -> Vec<Rule> {
        let mut seen = vec![false; self.len()];
        let mut order = Vec::new();
        let mut pending = vec![root];
        while let Some(rule) = pending.pop() {
            if std::mem::replace(&mut seen[rule.0], true) {
                continue;
            }
            order.push(rule);
            let children = self.parser(rule).children();
            pending.extend(children.into_iter().rev());
        }
        order
    }

    /// Computes which rules can succeed without consuming input, as a least
    /// fixed point: recursive rules start out non-nullable.
    fn nullable_rules(&self, reachable: &[Rule]) -> Vec<bool> {
        let mut nullable = vec![false; self.len()];
        let mut changed = true;
        while changed {
            changed = false;
            for &rule in reachable {
                if nullable[rule.0] {
                    continue;
                }
                if self.parser(rule).nullable(&|child: Rule| nullable[child.0]) {
                    nullable[rule.0] = true;
                    changed = true;
                }
            }
        }
        nullable
    }

    /// Reports a cycle against its first named member, or its first member
    /// if none is named.
    fn left_recursion(&self, cycle: &[usize]) -> Defect {
        let members: Vec<Rule> = cycle.iter().map(|&index| Rule(index)).collect();
        let rule = members
            .iter()
            .copied()
            .find(|&rule| self.name(rule).is_some())
            .unwrap_or(members[0]);
        Defect::LeftRecursion {
            rule,
            name: self.describe(rule),
            cycle: members.iter().map(|&member| self.describe(member)).collect(),
        }
    }
}

/// Tarjan's algorithm, without recursion so deep grammars cannot exhaust
/// the stack.
fn strongly_connected(nodes: &[Rule], edges: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let count = edges.len();
    let mut index = vec![UNVISITED; count];
    let mut low = vec![0; count];
    let mut on_stack = vec![false; count];
    let mut stack = Vec::new();
    let mut next = 0;
    let mut components = Vec::new();

    for root in nodes.iter().map(|rule| rule.0) {
        if index[root] != UNVISITED {
            continue;
        }
        index[root] = next;
        low[root] = next;
        next += 1;
        stack.push(root);
        on_stack[root] = true;
        let mut work = vec![(root, 0)];

        while let Some(frame) = work.last_mut() {
            let node = frame.0;
            if let Some(&child) = edges[node].get(frame.1) {
                frame.1 += 1;
                if index[child] == UNVISITED {
                    index[child] = next;
                    low[child] = next;
                    next += 1;
                    stack.push(child);
                    on_stack[child] = true;
                    work.push((child, 0));
                } else if on_stack[child] {
                    low[node] = low[node].min(index[child]);
                }
                continue;
            }

            work.pop();
            if let Some(&(parent, _)) = work.last() {
                low[parent] = low[parent].min(low[node]);
            }
            if low[node] == index[node] {
                let mut component = Vec::new();
                while let Some(member) = stack.pop() {
                    on_stack[member] = false;
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                components.push(component);
            }
        }
    }
    components
}
