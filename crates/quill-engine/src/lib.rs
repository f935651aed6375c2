//! Quill engine crate.
//!
//! Deferred draw-call journal for textured quads. Rectangles logged through a
//! [`RenderContext`] are packed into one interleaved vertex buffer and drawn
//! later in as few backend calls as state changes allow, without ever
//! reordering them.

pub mod backend;
pub mod clip;
pub mod config;
pub mod context;
pub mod coords;
pub mod error;
pub mod journal;
pub mod logging;
pub mod material;
pub mod paint;
pub mod transform;

pub use backend::{GpuBackend, RecordingBackend};
pub use config::JournalConfig;
pub use context::{PolygonVertex, RenderContext};
pub use error::{QuillError, Result};
pub use journal::{FlushReport, Quad};
pub use material::{Material, MaterialRef};
