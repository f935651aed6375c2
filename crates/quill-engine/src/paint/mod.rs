//! Color model shared by materials and the vertex logger.

pub mod color;

pub use color::Color;
