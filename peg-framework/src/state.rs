//! Typed extension state.
//!
//! Grammars that need mutable state beyond the value stack (nesting depth,
//! symbol tables, ...) declare a [`StateKey`] per slot. Slots are created on
//! first access from the key's initialiser, live in the parse context, and
//! are torn down when the parse ends.

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_SLOT: AtomicUsize = AtomicUsize::new(0);

/// Identity of a state slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

/// A key naming a state slot holding values of type `T`.
///
/// Every key created with [`StateKey::new`] is distinct, even when two keys
/// share a name. Keys are `Copy` so actions can capture them freely.
pub struct StateKey<T> {
    id: SlotId,
    name: &'static str,
    init: fn() -> T,
}

impl<T: 'static> StateKey<T> {
    /// Creates a new key; `init` produces the slot's value on first access.
    pub fn new(name: &'static str, init: fn() -> T) -> Self {
        Self {
            id: SlotId(NEXT_SLOT.fetch_add(1, Ordering::Relaxed)),
            name,
            init,
        }
    }

    /// Returns the slot's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn id(&self) -> SlotId {
        self.id
    }

    pub(crate) fn initial(&self) -> T {
        (self.init)()
    }
}

impl<T> Clone for StateKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StateKey<T> {}

impl<T> std::fmt::Debug for StateKey<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateKey")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// The extension state of one parse.
#[derive(Default)]
pub struct ExtensionState {
    values: HashMap<SlotId, Box<dyn Any>>,
    /// Live slots in creation order.
    order: Vec<(SlotId, &'static str)>,
}

impl ExtensionState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the slot's value, creating it if needed.
    pub fn get<T: 'static>(&mut self, key: &StateKey<T>) -> &T {
        let slot = self.materialize(key);
        downcast_ref(key.name, &**slot)
    }

    /// Returns the slot's value for in-place mutation, creating it if needed.
    ///
    /// Writes made through this reference are not logged and survive
    /// backtracking.
    pub fn get_mut<T: 'static>(&mut self, key: &StateKey<T>) -> &mut T {
        let slot = self.materialize(key);
        downcast_mut(key.name, &mut **slot)
    }

    /// Returns the slot's value if it has been created.
    pub fn peek<T: 'static>(&self, key: &StateKey<T>) -> Option<&T> {
        self.values
            .get(&key.id)
            .map(|slot| downcast_ref(key.name, &**slot))
    }

    /// Returns `true` if the slot has been created.
    pub fn is_materialized<T: 'static>(&self, key: &StateKey<T>) -> bool {
        self.values.contains_key(&key.id)
    }

    /// Returns the number of live slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no slot is live.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn materialize<T: 'static>(&mut self, key: &StateKey<T>) -> &mut Box<dyn Any> {
        match self.values.entry(key.id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.order.push((key.id, key.name));
                entry.insert(Box::new((key.init)()))
            }
        }
    }

    /// Stores `value` in a slot, creating the slot if needed, and returns
    /// what it held before.
    pub(crate) fn replace(
        &mut self,
        id: SlotId,
        name: &'static str,
        value: Box<dyn Any>,
    ) -> Option<Box<dyn Any>> {
        let previous = self.values.insert(id, value);
        if previous.is_none() {
            self.order.push((id, name));
        }
        previous
    }

    pub(crate) fn remove(&mut self, id: SlotId) {
        if self.values.remove(&id).is_some() {
            self.order.retain(|(slot, _)| *slot != id);
        }
    }

    /// Discards every slot, handing their final values to a snapshot.
    pub(crate) fn teardown(&mut self) -> StateSnapshot {
        let values = std::mem::take(&mut self.values);
        let names = std::mem::take(&mut self.order)
            .into_iter()
            .map(|(_, name)| name)
            .collect();
        log::trace!("discarding {} extension state slot(s)", values.len());
        StateSnapshot { values, names }
    }
}

impl std::fmt::Debug for ExtensionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionState")
            .field("slots", &self.order)
            .finish()
    }
}

/// The extension state left at the end of a parse.
#[derive(Default)]
pub struct StateSnapshot {
    values: HashMap<SlotId, Box<dyn Any>>,
    names: Vec<&'static str>,
}

impl StateSnapshot {
    /// Returns the final value of the slot, if it was ever created.
    pub fn get<T: 'static>(&self, key: &StateKey<T>) -> Option<&T> {
        self.values
            .get(&key.id)
            .map(|slot| downcast_ref(key.name, &**slot))
    }

    /// Returns the names of the slots created during the parse, in creation
    /// order.
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// Returns the number of slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no slot was created.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for StateSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSnapshot")
            .field("slots", &self.names)
            .finish()
    }
}

// A slot is only ever written through its own typed key.
fn downcast_ref<'v, T: 'static>(name: &str, value: &'v dyn Any) -> &'v T {
    match value.downcast_ref::<T>() {
        Some(value) => value,
        None => unreachable!("state slot `{name}` holds a value of another type"),
    }
}

fn downcast_mut<'v, T: 'static>(name: &str, value: &'v mut dyn Any) -> &'v mut T {
    match value.downcast_mut::<T>() {
        Some(value) => value,
        None => unreachable!("state slot `{name}` holds a value of another type"),
    }
}
