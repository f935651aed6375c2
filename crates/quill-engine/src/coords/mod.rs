//! Geometry types shared by the journal, the transform stack and the clip stack.
//!
//! Model space is whatever the caller's modelview matrix maps from.
//! Window space is framebuffer pixels after projection and the viewport
//! transform.

mod matrix;
mod rect;
mod vec2;
mod viewport;

pub use matrix::Matrix4;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
