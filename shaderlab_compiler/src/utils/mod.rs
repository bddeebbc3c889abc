//! Shared primitive types: source positions and the per-compile arena.

pub mod arena;
pub mod span;

pub use arena::{Arena, Handle};
pub use span::{LineIndex, Position, Span};
