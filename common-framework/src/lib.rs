//! Common Framework
//!
//! Leaf components shared by the combinator engine: the input view, the
//! reversible side-effect log and the checkpoints that tie the two together.

pub mod checkpoint;
pub mod input;
pub mod log;
pub mod position;

pub use checkpoint::Checkpoint;
pub use input::Input;
pub use log::{LogMark, SideEffect, SideEffectLog};
pub use position::Position;
