//! The combinator vocabulary.
//!
//! Every combinator is a [`Parser`](crate::Parser) implementation paired with
//! a builder method on [`Grammar`](crate::Grammar) that adds it to the arena
//! and returns its handle.

mod action;
mod lookahead;
mod primitives;
mod reference;
mod repeat;
mod sequence;

pub use action::{BuildFn, Collected};
pub(crate) use action::collect_into;
