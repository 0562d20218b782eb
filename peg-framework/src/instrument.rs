//! Call-stack recording and per-rule metrics.
//!
//! Both are purely observational: enabling them never changes what a parse
//! matches.

use crate::grammar::Grammar;
use crate::traits::Rule;
use hashbrown::HashMap;
use std::fmt::Write;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// One rule invocation on the call stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// The invoked rule.
    pub rule: Rule,
    /// The input position the rule was invoked at.
    pub position: usize,
}

/// The stack of rule invocations active at some point of a parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    /// Returns the frames, outermost first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Returns the number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if there is no frame.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns `true` if some frame invokes `rule`.
    pub fn contains(&self, rule: Rule) -> bool {
        self.frames.iter().any(|frame| frame.rule == rule)
    }

    /// Renders the stack innermost first, one frame per line.
    pub fn render<T, V>(&self, grammar: &Grammar<T, V>) -> String {
        let mut out = String::new();
        for frame in self.frames.iter().rev() {
            let _ = writeln!(
                out,
                "  at {} (position {})",
                grammar.describe(frame.rule),
                frame.position
            );
        }
        out
    }
}

/// Aggregated measurements for one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMetrics {
    pub rule: Rule,
    pub name: String,
    /// Number of invocations.
    pub invocations: u64,
    /// Number of successful invocations.
    pub successes: u64,
    /// Time spent in outermost invocations; recursive re-entries are not
    /// counted twice.
    pub total_time: Duration,
    /// Time spent in the rule itself, excluding the rules it invoked.
    pub self_time: Duration,
}

impl RuleMetrics {
    fn new(rule: Rule, name: String) -> Self {
        Self {
            rule,
            name,
            invocations: 0,
            successes: 0,
            total_time: Duration::ZERO,
            self_time: Duration::ZERO,
        }
    }

    fn absorb(&mut self, other: &RuleMetrics) {
        self.invocations += other.invocations;
        self.successes += other.successes;
        self.total_time += other.total_time;
        self.self_time += other.self_time;
    }
}

/// A reusable sink aggregating rule metrics across parses.
///
/// Each parse measures locally and merges its figures once it ends, so a
/// sink can be shared between threads running independent parses. Figures
/// are kept per grammar: a sink fed by several grammars never mixes their
/// rules.
#[derive(Debug, Default)]
pub struct ParseMetrics {
    table: Mutex<MetricsTable>,
}

#[derive(Debug, Default)]
struct MetricsTable {
    parses: u64,
    rules: HashMap<(usize, Rule), RuleMetrics>,
}

impl ParseMetrics {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of parses merged into this sink.
    pub fn parses(&self) -> u64 {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .parses
    }

    /// Returns the metrics of a single rule of `grammar`.
    pub fn get<T, V>(&self, grammar: &Grammar<T, V>, rule: Rule) -> Option<RuleMetrics> {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rules
            .get(&(grammar.id(), rule))
            .cloned()
    }

    /// Returns the metrics of every rule of every grammar, by descending self
    /// time.
    pub fn snapshot(&self) -> Vec<RuleMetrics> {
        let table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        sorted(table.rules.values().cloned().collect())
    }

    /// Clears all figures.
    pub fn reset(&self) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table.parses = 0;
        table.rules.clear();
    }

    pub(crate) fn merge(&self, grammar: usize, metrics: &[RuleMetrics]) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table.parses += 1;
        for entry in metrics {
            table
                .rules
                .entry((grammar, entry.rule))
                .or_insert_with(|| RuleMetrics::new(entry.rule, entry.name.clone()))
                .absorb(entry);
        }
    }
}

fn sorted(mut metrics: Vec<RuleMetrics>) -> Vec<RuleMetrics> {
    metrics.sort_by(|a, b| b.self_time.cmp(&a.self_time).then(a.rule.cmp(&b.rule)));
    metrics
}

struct TraceFrame {
    started: Instant,
    children: Duration,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    invocations: u64,
    successes: u64,
    total_time: Duration,
    self_time: Duration,
    active: usize,
}

/// Per-parse timing collector.
#[derive(Default)]
pub(crate) struct Tracer {
    frames: Vec<TraceFrame>,
    counters: HashMap<Rule, Counters>,
}

impl Tracer {
    pub(crate) fn enter(&mut self, rule: Rule) {
        self.counters.entry(rule).or_default().active += 1;
        self.frames.push(TraceFrame {
            started: Instant::now(),
            children: Duration::ZERO,
        });
    }

    pub(crate) fn exit(&mut self, rule: Rule, matched: bool) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        let elapsed = frame.started.elapsed();
        if let Some(parent) = self.frames.last_mut() {
            parent.children += elapsed;
        }

        let counters = self.counters.entry(rule).or_default();
        counters.invocations += 1;
        counters.successes += u64::from(matched);
        counters.self_time += elapsed.saturating_sub(frame.children);
        counters.active = counters.active.saturating_sub(1);
        if counters.active == 0 {
            counters.total_time += elapsed;
        }
    }

    pub(crate) fn finish<T, V>(self, grammar: &Grammar<T, V>) -> Vec<RuleMetrics> {
        let metrics = self
            .counters
            .into_iter()
            .filter(|(_, counters)| counters.invocations > 0)
            .map(|(rule, counters)| RuleMetrics {
                rule,
                name: grammar.describe(rule),
                invocations: counters.invocations,
                successes: counters.successes,
                total_time: counters.total_time,
                self_time: counters.self_time,
            })
            .collect();
        sorted(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recursive_time_counted_once() {
        let mut tracer = Tracer::default();
        tracer.enter(Rule(0));
        tracer.enter(Rule(0));
        std::thread::sleep(Duration::from_millis(2));
        tracer.exit(Rule(0), true);
        tracer.exit(Rule(0), false);

        let counters = tracer.counters[&Rule(0)];
        assert_eq!(counters.invocations, 2);
        assert_eq!(counters.successes, 1);
        assert_eq!(counters.active, 0);
        // Only the outer invocation contributes total time, and self times
        // partition it.
        assert!(counters.total_time >= Duration::from_millis(2));
        assert_eq!(counters.self_time, counters.total_time);
    }

    #[test]
    fn test_merge_accumulates_parses() {
        let grammar: Grammar<(), ()> = Grammar::new();
        let sink = ParseMetrics::new();
        let entry = RuleMetrics {
            invocations: 3,
            successes: 1,
            ..RuleMetrics::new(Rule(2), "digit".into())
        };
        sink.merge(grammar.id(), std::slice::from_ref(&entry));
        sink.merge(grammar.id(), std::slice::from_ref(&entry));

        assert_eq!(sink.parses(), 2);
        let merged = sink.get(&grammar, Rule(2)).expect("rule was merged");
        assert_eq!(merged.invocations, 6);
        assert_eq!(merged.successes, 2);

        sink.reset();
        assert_eq!(sink.parses(), 0);
        assert!(sink.snapshot().is_empty());
    }
}
