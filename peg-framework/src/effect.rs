use crate::stack::ValueStack;
use crate::state::{ExtensionState, SlotId, StateKey};
use common_framework::SideEffect;
use std::any::Any;

/// The backtrack-safe state of a parse: everything the side-effect log can
/// restore.
#[derive(Debug)]
pub struct TrackedState<V> {
    pub(crate) stack: ValueStack<V>,
    pub(crate) slots: ExtensionState,
}

impl<V> TrackedState<V> {
    pub(crate) fn new() -> Self {
        Self {
            stack: ValueStack::new(),
            slots: ExtensionState::new(),
        }
    }

    /// Returns the value stack.
    pub fn stack(&self) -> &ValueStack<V> {
        &self.stack
    }

    /// Returns a state slot, creating it if needed.
    pub fn slot<T: 'static>(&mut self, key: &StateKey<T>) -> &T {
        self.slots.get(key)
    }

    /// Returns a state slot for mutation, creating it if needed.
    ///
    /// Intended for custom [`SideEffect`] implementations, which are
    /// responsible for undoing what they change.
    pub fn slot_mut<T: 'static>(&mut self, key: &StateKey<T>) -> &mut T {
        self.slots.get_mut(key)
    }
}

/// The effects recorded in a parse's log.
pub(crate) enum Effect<V> {
    Push(Option<V>),
    Pop {
        count: usize,
        removed: Vec<V>,
    },
    Reduce {
        count: usize,
        removed: Vec<V>,
        value: Option<V>,
    },
    /// Swaps a slot's value: the payload holds the new value before `apply`
    /// and the previous one afterwards, `None` if the slot did not exist.
    Slot {
        id: SlotId,
        name: &'static str,
        value: Option<Box<dyn Any>>,
    },
    Custom(Box<dyn SideEffect<TrackedState<V>>>),
}

impl<V> SideEffect<TrackedState<V>> for Effect<V> {
    fn apply(&mut self, state: &mut TrackedState<V>) {
        match self {
            Effect::Push(value) => {
                if let Some(value) = value.take() {
                    state.stack.push(value);
                }
            }
            Effect::Pop { count, removed } => *removed = state.stack.split_top(*count),
            Effect::Reduce {
                count,
                removed,
                value,
            } => {
                *removed = state.stack.split_top(*count);
                if let Some(value) = value.take() {
                    state.stack.push(value);
                }
            }
            Effect::Slot { id, name, value } => {
                if let Some(next) = value.take() {
                    *value = state.slots.replace(*id, *name, next);
                }
            }
            Effect::Custom(effect) => effect.apply(state),
        }
    }

    fn undo(&mut self, state: &mut TrackedState<V>) {
        match self {
            Effect::Push(_) => {
                state.stack.pop();
            }
            Effect::Pop { removed, .. } => state.stack.restore_top(removed),
            Effect::Reduce { removed, .. } => {
                state.stack.pop();
                state.stack.restore_top(removed);
            }
            Effect::Slot { id, name, value } => match value.take() {
                Some(previous) => {
                    state.slots.replace(*id, *name, previous);
                }
                None => state.slots.remove(*id),
            },
            Effect::Custom(effect) => effect.undo(state),
        }
    }
}

/// A side effect built from a pair of closures.
pub struct FnEffect<A, U> {
    apply: A,
    undo: U,
}

impl<A, U> FnEffect<A, U> {
    /// Creates an effect running `apply` when recorded and `undo` on
    /// rollback.
    pub fn new(apply: A, undo: U) -> Self {
        Self { apply, undo }
    }
}

impl<V, A, U> SideEffect<TrackedState<V>> for FnEffect<A, U>
where
    A: FnMut(&mut TrackedState<V>),
    U: FnMut(&mut TrackedState<V>),
{
    fn apply(&mut self, state: &mut TrackedState<V>) {
        (self.apply)(state)
    }

    fn undo(&mut self, state: &mut TrackedState<V>) {
        (self.undo)(state)
    }
}
