use crate::log::LogMark;

/// A checkpoint for saving and restoring parsing state.
/// Restoring one resets the input position and rolls the side-effect log
/// back to the recorded mark, which undoes every mutation made since.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    /// The input index (byte offset for text, element index for tokens).
    position: usize,
    /// The length of the side-effect log at this checkpoint.
    mark: LogMark,
}

impl Checkpoint {
    /// Creates a new checkpoint with the given position and log mark.
    pub fn new(position: usize, mark: LogMark) -> Self {
        Self { position, mark }
    }

    /// Returns the input position stored in this checkpoint.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the log mark stored in this checkpoint.
    pub fn mark(&self) -> LogMark {
        self.mark
    }
}
