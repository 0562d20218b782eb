use crate::effect::{Effect, FnEffect, TrackedState};
use crate::error::{BoxError, MatchResult, RuntimeError};
use crate::grammar::Grammar;
use crate::instrument::{CallStack, Frame, RuleMetrics, Tracer};
use crate::options::ParseOptions;
use crate::stack::ValueStack;
use crate::state::{StateKey, StateSnapshot};
use crate::traits::Rule;
use common_framework::{Checkpoint, Input, SideEffect, SideEffectLog};

/// The mutable state of one parse invocation.
///
/// A context is created for a single run of a root rule and discarded once
/// the result is assembled. Everything a rule may change while matching
/// (position, value stack, extension state) lives here; rules themselves
/// stay immutable and can be shared between parses.
pub struct ParseContext<'a, T, V> {
    pos: usize,
    /// Furthest failure position, only ever enlarged.
    error: Option<usize>,
    input: Input<'a, T>,
    grammar: &'a Grammar<T, V>,
    options: &'a ParseOptions,
    log: SideEffectLog<Effect<V>>,
    tracked: TrackedState<V>,
    call_stack: Option<CallStack>,
    error_call_stack: Option<CallStack>,
    tracer: Option<Tracer>,
    current: Option<Rule>,
    depth: usize,
}

/// What is left of a context once its parse is over.
pub(crate) struct Finished<V> {
    pub(crate) pos: usize,
    pub(crate) error: Option<usize>,
    pub(crate) stack: Vec<V>,
    pub(crate) state: StateSnapshot,
    pub(crate) error_call_stack: Option<CallStack>,
    pub(crate) metrics: Option<Vec<RuleMetrics>>,
}

impl<'a, T, V> ParseContext<'a, T, V> {
    /// Creates a fresh context at the start of `input`.
    pub fn new(grammar: &'a Grammar<T, V>, input: Input<'a, T>, options: &'a ParseOptions) -> Self {
        Self {
            pos: 0,
            error: None,
            input,
            grammar,
            options,
            log: SideEffectLog::new(),
            tracked: TrackedState::new(),
            call_stack: options.record_call_stack.then(CallStack::default),
            error_call_stack: None,
            tracer: options.trace.then(Tracer::default),
            current: None,
            depth: 0,
        }
    }

    /// Returns the current input position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Moves to `pos`. Custom parsers use this to consume input.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Consumes `len` units of input.
    pub fn advance(&mut self, len: usize) {
        self.pos += len;
    }

    /// Returns the furthest position at which a failure was observed.
    pub fn error(&self) -> Option<usize> {
        self.error
    }

    /// Returns the input view.
    pub fn input(&self) -> Input<'a, T> {
        self.input
    }

    /// Returns the grammar being run.
    pub fn grammar(&self) -> &'a Grammar<T, V> {
        self.grammar
    }

    /// Returns the options of this parse.
    pub fn options(&self) -> &'a ParseOptions {
        self.options
    }

    /// Returns `true` if the whole input has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the character at the current position.
    pub fn peek_char(&self) -> Option<char> {
        self.input.char_at(self.pos)
    }

    /// Returns the token at the current position.
    pub fn peek_token(&self) -> Option<&'a T> {
        self.input.token_at(self.pos)
    }

    /// Returns the current nesting of rule invocations.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Creates a checkpoint of the position and the side-effect log.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(self.pos, self.log.mark())
    }

    /// Restores the position and undoes every side effect recorded since
    /// `checkpoint`.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.position();
        self.log.rollback(&mut self.tracked, checkpoint.mark());
    }

    /// Invokes `rule` at the current position.
    ///
    /// On failure the position and every side effect the rule recorded are
    /// rolled back and the failure is recorded at the entry position (see
    /// [`Self::record_failure`]). Runtime errors propagate untouched,
    /// leaving the position and call stack where the error was raised.
    pub fn invoke(&mut self, rule: Rule) -> MatchResult {
        let grammar = self.grammar;
        if self.depth >= self.options.max_depth {
            return Err(RuntimeError::RecursionLimit {
                rule,
                name: grammar.describe(rule),
                position: self.pos,
                limit: self.options.max_depth,
            });
        }

        let entry = self.checkpoint();
        let caller = self.current.replace(rule);
        self.depth += 1;
        if let Some(stack) = &mut self.call_stack {
            stack.push(Frame {
                rule,
                position: entry.position(),
            });
        }
        if let Some(tracer) = &mut self.tracer {
            tracer.enter(rule);
        }

        let matched = grammar.parser(rule).parse(self)?;

        if let Some(tracer) = &mut self.tracer {
            tracer.exit(rule, matched);
        }
        if !matched {
            self.record_failure(entry.position());
            self.restore(entry);
        }
        if let Some(stack) = &mut self.call_stack {
            stack.pop();
        }
        self.depth -= 1;
        self.current = caller;
        Ok(matched)
    }

    /// Raises the failure watermark to `position` unless a failure further
    /// right was already seen. The call stack is captured each time, so the
    /// last failure at the furthest position is the one reported.
    pub fn record_failure(&mut self, position: usize) {
        if self.error.is_some_and(|error| error > position) {
            return;
        }
        self.error = Some(position);
        if let Some(stack) = &self.call_stack {
            self.error_call_stack = Some(stack.clone());
        }
    }

    /// Returns the live call stack, if recorded.
    pub fn call_stack(&self) -> Option<&CallStack> {
        self.call_stack.as_ref()
    }

    /// Returns the call stack captured at the furthest failure, if recorded.
    pub fn error_call_stack(&self) -> Option<&CallStack> {
        self.error_call_stack.as_ref()
    }

    /// Returns the value stack.
    pub fn stack(&self) -> &ValueStack<V> {
        &self.tracked.stack
    }

    /// Pushes a value.
    pub fn push(&mut self, value: V) {
        self.log
            .record(&mut self.tracked, Effect::Push(Some(value)));
    }

    /// Pops the top value.
    pub fn pop(&mut self) -> Option<V>
    where
        V: Clone,
    {
        self.pop_n(1).and_then(|mut values| values.pop())
    }

    /// Pops the top `count` values, bottom-most first. Returns `None` and
    /// leaves the stack alone if fewer are present.
    pub fn pop_n(&mut self, count: usize) -> Option<Vec<V>>
    where
        V: Clone,
    {
        let values = self.tracked.stack.peek_n(count)?.to_vec();
        self.log.record(
            &mut self.tracked,
            Effect::Pop {
                count,
                removed: Vec::new(),
            },
        );
        Some(values)
    }

    /// Replaces the top `count` values with `value` as one undoable step.
    /// Returns `false` and leaves the stack alone if fewer are present.
    pub fn reduce(&mut self, count: usize, value: V) -> bool {
        if self.tracked.stack.len() < count {
            return false;
        }
        self.log.record(
            &mut self.tracked,
            Effect::Reduce {
                count,
                removed: Vec::new(),
                value: Some(value),
            },
        );
        true
    }

    /// Returns a state slot, creating it if needed. Creation is logged, so
    /// a slot first touched inside an abandoned match disappears with it.
    pub fn state<U: 'static>(&mut self, key: &StateKey<U>) -> &U {
        self.materialize(key);
        self.tracked.slots.get(key)
    }

    /// Returns a state slot if it exists, without creating it.
    pub fn peek_state<U: 'static>(&self, key: &StateKey<U>) -> Option<&U> {
        self.tracked.slots.peek(key)
    }

    /// Returns a state slot for in-place mutation. Changes made through
    /// this reference are not undone by backtracking; creating the slot is.
    pub fn state_mut<U: 'static>(&mut self, key: &StateKey<U>) -> &mut U {
        self.materialize(key);
        self.tracked.slots.get_mut(key)
    }

    /// Sets a state slot; the previous value comes back on rollback, and a
    /// slot created by this call is removed again.
    pub fn set_state<U: 'static>(&mut self, key: &StateKey<U>, value: U) {
        self.log.record(
            &mut self.tracked,
            Effect::Slot {
                id: key.id(),
                name: key.name(),
                value: Some(Box::new(value)),
            },
        );
    }

    /// Replaces a state slot with a value computed from the current one
    /// (or from the key's initial value); undone like [`Self::set_state`].
    pub fn update_state<U: 'static>(&mut self, key: &StateKey<U>, update: impl FnOnce(&U) -> U) {
        let next = match self.tracked.slots.peek(key) {
            Some(current) => update(current),
            None => update(&key.initial()),
        };
        self.set_state(key, next);
    }

    fn materialize<U: 'static>(&mut self, key: &StateKey<U>) {
        if !self.tracked.slots.is_materialized(key) {
            self.set_state(key, key.initial());
        }
    }

    /// Records a custom side effect.
    pub fn apply(&mut self, effect: impl SideEffect<TrackedState<V>> + 'static) {
        self.log
            .record(&mut self.tracked, Effect::Custom(Box::new(effect)));
    }

    /// Records a side effect made of an `apply` and an `undo` closure.
    pub fn apply_fn<A, U>(&mut self, apply: A, undo: U)
    where
        A: FnMut(&mut TrackedState<V>) + 'static,
        U: FnMut(&mut TrackedState<V>) + 'static,
    {
        self.apply(FnEffect::new(apply, undo));
    }

    /// Returns the number of side effects currently logged.
    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    pub(crate) fn action_failed(&self, source: BoxError) -> RuntimeError {
        let rule = self.current.unwrap_or(Rule(0));
        RuntimeError::Action {
            rule,
            name: self.grammar.describe(rule),
            position: self.pos,
            source,
        }
    }

    pub(crate) fn unresolved(&self, rule: Rule) -> RuntimeError {
        RuntimeError::Unresolved {
            rule,
            name: self.grammar.describe(rule),
            position: self.pos,
        }
    }

    /// Tears the context down: extension state is discarded into a
    /// snapshot and timings are folded into metrics.
    pub(crate) fn finish(mut self) -> Finished<V> {
        let state = self.tracked.slots.teardown();
        let grammar = self.grammar;
        Finished {
            pos: self.pos,
            error: self.error,
            stack: self.tracked.stack.into_vec(),
            state,
            error_call_stack: self.error_call_stack,
            metrics: self.tracer.map(|tracer| tracer.finish(grammar)),
        }
    }
}

impl<T, V: std::fmt::Debug> std::fmt::Debug for ParseContext<'_, T, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseContext")
            .field("pos", &self.pos)
            .field("error", &self.error)
            .field("input_len", &self.input.len())
            .field("stack", &self.tracked.stack)
            .field("log_len", &self.log.len())
            .field("depth", &self.depth)
            .finish()
    }
}
