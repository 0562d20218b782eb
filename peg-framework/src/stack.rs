/// The stack parses use to build their output.
///
/// Only read access is public: every mutation goes through the
/// [`ParseContext`](crate::ParseContext) so that it is logged and undone
/// when the enclosing match is abandoned.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueStack<V> {
    items: Vec<V>,
}

impl<V> ValueStack<V> {
    pub(crate) fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Returns the number of values on the stack.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the top value.
    pub fn peek(&self) -> Option<&V> {
        self.items.last()
    }

    /// Returns the top `count` values, bottom-most first, or `None` if fewer
    /// are present.
    pub fn peek_n(&self, count: usize) -> Option<&[V]> {
        let from = self.items.len().checked_sub(count)?;
        self.items.get(from..)
    }

    /// Returns every value, bottom-most first.
    pub fn as_slice(&self) -> &[V] {
        &self.items
    }

    pub(crate) fn push(&mut self, value: V) {
        self.items.push(value);
    }

    pub(crate) fn pop(&mut self) -> Option<V> {
        self.items.pop()
    }

    /// Removes the top `count` values (or all of them if fewer are present).
    pub(crate) fn split_top(&mut self, count: usize) -> Vec<V> {
        let at = self.items.len().saturating_sub(count);
        self.items.split_off(at)
    }

    pub(crate) fn restore_top(&mut self, values: &mut Vec<V>) {
        self.items.append(values);
    }

    pub(crate) fn into_vec(self) -> Vec<V> {
        self.items
    }
}
