//! Copy-on-write matrix stacks for modelview and projection transforms.

mod stack;

pub use stack::TransformStack;
