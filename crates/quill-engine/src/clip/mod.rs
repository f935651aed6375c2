//! Clip region stack.
//!
//! Clip entries form a persistent singly-linked list: pushing returns a new
//! stack that shares its parent, so saved stacks stay valid after the live one
//! moves on. Each entry carries its window-space bounds, already intersected
//! with every ancestor.

mod stack;

pub use stack::{ClipShape, ClipStack, ClipState, PrimitiveId};
