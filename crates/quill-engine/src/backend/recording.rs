use crate::clip::ClipState;
use crate::coords::Matrix4;
use crate::material::Material;

use super::{
    BackendError, BufferHandle, BufferKind, DrawMode, FlushOptions, GpuBackend, MatrixMode,
};

/// One recorded backend invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    SetMatrixMode(MatrixMode),
    LoadMatrix(Matrix4),
    UploadBuffer { kind: BufferKind, handle: BufferHandle, bytes: Vec<u8> },
    ReleaseBuffer(BufferHandle),
    BindVertexPointer { buffer: BufferHandle, components: u32, stride: usize, offset: usize },
    BindColorPointer { buffer: BufferHandle, stride: usize, offset: usize },
    BindTexcoordPointer { unit: u32, buffer: BufferHandle, stride: usize, offset: usize },
    FlushMaterial { material: Material, options: FlushOptions },
    FlushClip(ClipState),
    DrawArrays { mode: DrawMode, first: u32, count: u32 },
    DrawIndexed { mode: DrawMode, indices: BufferHandle, first: u32, count: u32 },
}

impl BackendCall {
    #[inline]
    pub fn is_draw(&self) -> bool {
        matches!(self, BackendCall::DrawArrays { .. } | BackendCall::DrawIndexed { .. })
    }
}

/// Backend that performs no GPU work and keeps a log of every call.
///
/// Used by tests and by headless tooling that wants to inspect what a flush
/// would have sent to the GPU.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    next_handle: u32,
    /// Upload budget in bytes; `None` means unlimited.
    upload_limit: Option<usize>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes any single upload larger than `bytes` fail with `OutOfMemory`.
    pub fn with_upload_limit(mut self, bytes: usize) -> Self {
        self.upload_limit = Some(bytes);
        self
    }

    #[inline]
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Returns and clears the recorded calls.
    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn draw_count(&self) -> usize {
        self.calls.iter().filter(|c| c.is_draw()).count()
    }

    pub fn material_flush_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BackendCall::FlushMaterial { .. }))
            .count()
    }
}

impl GpuBackend for RecordingBackend {
    fn set_matrix_mode(&mut self, mode: MatrixMode) {
        self.calls.push(BackendCall::SetMatrixMode(mode));
    }

    fn load_matrix(&mut self, matrix: &Matrix4) {
        self.calls.push(BackendCall::LoadMatrix(*matrix));
    }

    fn upload_buffer(&mut self, kind: BufferKind, bytes: &[u8]) -> Result<BufferHandle, BackendError> {
        if self.upload_limit.is_some_and(|limit| bytes.len() > limit) {
            return Err(BackendError::OutOfMemory { bytes: bytes.len() });
        }
        let handle = BufferHandle(self.next_handle);
        self.next_handle += 1;
        self.calls.push(BackendCall::UploadBuffer { kind, handle, bytes: bytes.to_vec() });
        Ok(handle)
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        self.calls.push(BackendCall::ReleaseBuffer(buffer));
    }

    fn bind_vertex_pointer(&mut self, buffer: BufferHandle, components: u32, stride: usize, offset: usize) {
        self.calls.push(BackendCall::BindVertexPointer { buffer, components, stride, offset });
    }

    fn bind_color_pointer(&mut self, buffer: BufferHandle, stride: usize, offset: usize) {
        self.calls.push(BackendCall::BindColorPointer { buffer, stride, offset });
    }

    fn bind_texcoord_pointer(&mut self, unit: u32, buffer: BufferHandle, stride: usize, offset: usize) {
        self.calls.push(BackendCall::BindTexcoordPointer { unit, buffer, stride, offset });
    }

    fn flush_material_state(&mut self, material: &Material, options: &FlushOptions) {
        self.calls.push(BackendCall::FlushMaterial { material: material.clone(), options: *options });
    }

    fn flush_clip_state(&mut self, state: &ClipState) {
        self.calls.push(BackendCall::FlushClip(state.clone()));
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        self.calls.push(BackendCall::DrawArrays { mode, first, count });
    }

    fn draw_indexed(&mut self, mode: DrawMode, indices: BufferHandle, first: u32, count: u32) {
        self.calls.push(BackendCall::DrawIndexed { mode, indices, first, count });
    }
}
