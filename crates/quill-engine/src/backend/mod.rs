//! GPU backend seam.
//!
//! The journal never talks to a graphics API directly. Everything it needs
//! (matrix loads, pointer setup, material flushes, draws, buffer uploads)
//! goes through [`GpuBackend`], chosen once when the `RenderContext` is built.

mod recording;

use thiserror::Error;

use crate::clip::ClipState;
use crate::coords::Matrix4;
use crate::material::{Material, TextureId};

pub use recording::{BackendCall, RecordingBackend};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MatrixMode {
    Modelview,
    Projection,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrawMode {
    Triangles,
    TriangleFan,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index(IndexFormat),
}

/// Backend-assigned buffer name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Per-batch overrides applied on top of a material when flushing it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FlushOptions {
    /// Layers to replace with a fully transparent placeholder texture.
    pub fallback_layers: u32,
    /// Layers to leave disabled.
    pub disable_layers: u32,
    /// Texture to bind on layer 0 instead of the material's own.
    pub layer0_override: Option<TextureId>,
    /// Skip flushing the material color (it is supplied per vertex).
    pub skip_color: bool,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend could not allocate a {bytes}-byte buffer")]
    OutOfMemory { bytes: usize },

    #[error("backend failure: {0}")]
    Other(String),
}

/// Operations the journal consumes from the graphics layer.
///
/// Byte strides and offsets are relative to the start of the buffer passed
/// to the bind call.
pub trait GpuBackend {
    fn set_matrix_mode(&mut self, mode: MatrixMode);

    fn load_matrix(&mut self, matrix: &Matrix4);

    fn upload_buffer(&mut self, kind: BufferKind, bytes: &[u8]) -> Result<BufferHandle, BackendError>;

    /// Releases a buffer returned by `upload_buffer`.
    fn release_buffer(&mut self, _buffer: BufferHandle) {}

    fn bind_vertex_pointer(&mut self, buffer: BufferHandle, components: u32, stride: usize, offset: usize);

    fn bind_color_pointer(&mut self, buffer: BufferHandle, stride: usize, offset: usize);

    fn bind_texcoord_pointer(&mut self, unit: u32, buffer: BufferHandle, stride: usize, offset: usize);

    fn flush_material_state(&mut self, material: &Material, options: &FlushOptions);

    /// Applies scissor and stencil clipping for the following draws.
    fn flush_clip_state(&mut self, state: &ClipState);

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32);

    fn draw_indexed(&mut self, mode: DrawMode, indices: BufferHandle, first: u32, count: u32);
}
