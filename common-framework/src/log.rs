/// A reversible mutation of some state `S`.
///
/// `apply` runs exactly once, when the effect is recorded. `undo` runs at
/// most once, when the log is rolled back past the effect, and must leave the
/// state as it was before `apply`. Neither may fail.
pub trait SideEffect<S> {
    /// Performs the mutation.
    fn apply(&mut self, state: &mut S);

    /// Reverts the mutation performed by [`SideEffect::apply`].
    fn undo(&mut self, state: &mut S);
}

/// A position in a [`SideEffectLog`], used as a rollback target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogMark(usize);

impl LogMark {
    /// Returns the log length this mark refers to.
    pub fn len(&self) -> usize {
        self.0
    }

    /// Returns `true` if the mark points at the start of the log.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// An append-only log of applied side effects.
///
/// The log is generic over its payload: it knows nothing about what the
/// effects mutate, only that replaying `undo` in reverse order restores the
/// state observed at any earlier mark.
#[derive(Debug)]
pub struct SideEffectLog<E> {
    records: Vec<E>,
}

impl<E> SideEffectLog<E> {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Returns the number of effects currently in the log.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no effect is in the log.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns a checkpoint for the current log length.
    pub fn mark(&self) -> LogMark {
        LogMark(self.records.len())
    }

    /// Returns the effects currently in the log, oldest first.
    pub fn records(&self) -> &[E] {
        &self.records
    }

    /// Applies `effect` to `state` and appends it to the log.
    pub fn record<S>(&mut self, state: &mut S, mut effect: E)
    where
        E: SideEffect<S>,
    {
        effect.apply(state);
        self.records.push(effect);
    }

    /// Undoes every effect recorded after `mark`, newest first, and truncates
    /// the log to `mark`. Rolling back to a mark at or past the current
    /// length does nothing.
    pub fn rollback<S>(&mut self, state: &mut S, mark: LogMark)
    where
        E: SideEffect<S>,
    {
        while self.records.len() > mark.0 {
            if let Some(mut effect) = self.records.pop() {
                effect.undo(state);
            }
        }
    }
}

impl<E> Default for SideEffectLog<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    enum VecEffect {
        Push(i32),
        PopInto(Option<i32>),
    }

    impl SideEffect<Vec<i32>> for VecEffect {
        fn apply(&mut self, state: &mut Vec<i32>) {
            match self {
                VecEffect::Push(value) => state.push(*value),
                VecEffect::PopInto(slot) => *slot = state.pop(),
            }
        }

        fn undo(&mut self, state: &mut Vec<i32>) {
            match self {
                VecEffect::Push(_) => {
                    state.pop();
                }
                VecEffect::PopInto(slot) => {
                    if let Some(value) = slot.take() {
                        state.push(value);
                    }
                }
            }
        }
    }

    #[test]
    fn test_record_applies_immediately() {
        let mut state = Vec::new();
        let mut log = SideEffectLog::new();
        log.record(&mut state, VecEffect::Push(1));
        assert_eq!(state, vec![1]);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_rollback_undoes_in_reverse_order() {
        let mut state = vec![1, 2];
        let mut log = SideEffectLog::new();
        let mark = log.mark();

        log.record(&mut state, VecEffect::PopInto(None));
        log.record(&mut state, VecEffect::PopInto(None));
        log.record(&mut state, VecEffect::Push(7));
        assert_eq!(state, vec![7]);

        log.rollback(&mut state, mark);
        assert_eq!(state, vec![1, 2]);
        assert!(log.is_empty());
    }

    #[test]
    fn test_rollback_to_intermediate_mark() {
        let mut state = Vec::new();
        let mut log = SideEffectLog::new();
        log.record(&mut state, VecEffect::Push(1));
        let mark = log.mark();
        log.record(&mut state, VecEffect::Push(2));
        log.record(&mut state, VecEffect::Push(3));

        log.rollback(&mut state, mark);
        assert_eq!(state, vec![1]);
        assert_eq!(log.mark(), mark);
    }

    #[test]
    fn test_rollback_past_end_is_noop() {
        let mut state = Vec::new();
        let mut log = SideEffectLog::new();
        log.record(&mut state, VecEffect::Push(1));
        let later = log.mark();
        log.rollback(&mut state, LogMark(5));
        log.rollback(&mut state, later);
        assert_eq!(state, vec![1]);
    }
}
