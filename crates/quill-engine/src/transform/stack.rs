use crate::backend::{GpuBackend, MatrixMode};
use crate::coords::Matrix4;
use crate::error::{QuillError, Result, StackKind};

/// One materialized matrix, shared by `push_count + 1` logical levels.
#[derive(Debug, Clone)]
struct Frame {
    matrix: Matrix4,
    push_count: u32,
}

/// Matrix stack where `push()` is free and copies happen on first mutation.
///
/// Invariants:
/// - `frames` is never empty; `frames[0]` is the root frame.
/// - A frame with `push_count > 0` is never mutated in place.
///
/// Because a mutation below a shared point always materializes a new frame,
/// any balanced push/mutate/pop sequence restores the previous matrix
/// bit-for-bit.
#[derive(Debug, Clone)]
pub struct TransformStack {
    kind: StackKind,
    frames: Vec<Frame>,
    /// The backend's cached matrix matches `get()`.
    flushed: bool,
}

impl TransformStack {
    pub fn new(kind: StackKind) -> Self {
        Self {
            kind,
            frames: vec![Frame { matrix: Matrix4::IDENTITY, push_count: 0 }],
            flushed: false,
        }
    }

    #[inline]
    pub fn kind(&self) -> StackKind {
        self.kind
    }

    #[inline]
    fn top(&self) -> &Frame {
        // `frames` is never empty.
        &self.frames[self.frames.len() - 1]
    }

    /// Current matrix.
    #[inline]
    pub fn get(&self) -> Matrix4 {
        self.top().matrix
    }

    /// Outstanding pushes (0 at the root level).
    pub fn depth(&self) -> usize {
        let shared: usize = self.frames.iter().map(|f| f.push_count as usize).sum();
        shared + self.frames.len() - 1
    }

    /// Materialized frames, including the root.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn push(&mut self) {
        let last = self.frames.len() - 1;
        self.frames[last].push_count += 1;
    }

    /// Discards the top logical level.
    ///
    /// Popping the root level returns `StackUnderflow`, logs a warning and
    /// leaves the stack untouched.
    pub fn pop(&mut self) -> Result<()> {
        let last = self.frames.len() - 1;
        if self.frames[last].push_count > 0 {
            self.frames[last].push_count -= 1;
            return Ok(());
        }
        if last == 0 {
            log::warn!("{} stack: pop without matching push ignored", self.kind);
            return Err(QuillError::StackUnderflow { stack: self.kind });
        }
        self.frames.pop();
        self.flushed = false;
        Ok(())
    }

    /// Returns the top matrix for in-place mutation, materializing a private
    /// frame first if the top is shared.
    fn top_mut(&mut self) -> &mut Matrix4 {
        let last = self.frames.len() - 1;
        if self.frames[last].push_count > 0 {
            self.frames[last].push_count -= 1;
            let matrix = self.frames[last].matrix;
            self.frames.push(Frame { matrix, push_count: 0 });
        }
        self.flushed = false;
        let last = self.frames.len() - 1;
        &mut self.frames[last].matrix
    }

    pub fn load_identity(&mut self) {
        *self.top_mut() = Matrix4::IDENTITY;
    }

    pub fn load(&mut self, matrix: &Matrix4) {
        *self.top_mut() = *matrix;
    }

    #[inline]
    pub fn set(&mut self, matrix: &Matrix4) {
        self.load(matrix);
    }

    /// Post-multiplies: subsequent points are transformed by `matrix` first.
    pub fn multiply(&mut self, matrix: &Matrix4) {
        let top = self.top_mut();
        *top = *top * *matrix;
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.multiply(&Matrix4::from_translation(x, y, z));
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.multiply(&Matrix4::from_scale(x, y, z));
    }

    pub fn rotate(&mut self, degrees: f32, x: f32, y: f32, z: f32) {
        self.multiply(&Matrix4::from_rotation(degrees, x, y, z));
    }

    pub fn ortho(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.multiply(&Matrix4::ortho(left, right, bottom, top, near, far));
    }

    pub fn frustum(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.multiply(&Matrix4::frustum(left, right, bottom, top, near, far));
    }

    pub fn perspective(&mut self, fov_y_degrees: f32, aspect: f32, near: f32, far: f32) {
        self.multiply(&Matrix4::perspective(fov_y_degrees, aspect, near, far));
    }

    #[inline]
    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    /// Forces the next `flush_to_backend` to reload the matrix.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.flushed = false;
    }

    /// Loads the current matrix into the backend unless it is already there.
    pub fn flush_to_backend<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        if self.flushed {
            return;
        }
        let mode = match self.kind {
            StackKind::Modelview => MatrixMode::Modelview,
            StackKind::Projection => MatrixMode::Projection,
        };
        backend.set_matrix_mode(mode);
        backend.load_matrix(&self.get());
        self.flushed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, RecordingBackend};

    fn stack() -> TransformStack {
        TransformStack::new(StackKind::Modelview)
    }

    #[test]
    fn starts_at_identity() {
        let s = stack();
        assert!(s.get().is_identity());
        assert_eq!(s.depth(), 0);
    }

    #[test]
    fn push_does_not_allocate_a_frame() {
        let mut s = stack();
        s.push();
        s.push();
        assert_eq!(s.frame_count(), 1);
        assert_eq!(s.depth(), 2);
    }

    #[test]
    fn balanced_push_mutate_pop_restores_bits() {
        let mut s = stack();
        s.translate(3.0, 4.0, 0.0);
        s.rotate(33.0, 0.0, 0.0, 1.0);
        let before = s.get();

        s.push();
        s.scale(2.0, 2.0, 1.0);
        s.push();
        s.push();
        s.rotate(17.0, 1.0, 1.0, 0.0);
        s.load_identity();
        s.translate(0.1, 0.2, 0.3);
        s.pop().unwrap();
        s.pop().unwrap();
        s.pop().unwrap();

        assert!(s.get().bits_eq(&before));
        assert_eq!(s.depth(), 0);
        assert_eq!(s.frame_count(), 1);
    }

    #[test]
    fn mutation_after_shared_push_materializes_one_frame() {
        let mut s = stack();
        s.push();
        s.push();
        s.translate(1.0, 0.0, 0.0);
        assert_eq!(s.frame_count(), 2);
        assert_eq!(s.depth(), 2);
        s.translate(1.0, 0.0, 0.0);
        assert_eq!(s.frame_count(), 2);
        assert_eq!(s.get().cols[3][0], 2.0);
    }

    #[test]
    fn pop_on_root_is_underflow_and_noop() {
        let mut s = stack();
        s.translate(5.0, 0.0, 0.0);
        let before = s.get();
        let err = s.pop().unwrap_err();
        assert!(matches!(err, QuillError::StackUnderflow { stack: StackKind::Modelview }));
        assert!(s.get().bits_eq(&before));
        assert_eq!(s.frame_count(), 1);
    }

    #[test]
    fn flushed_flag_tracks_content_changes() {
        let mut s = stack();
        let mut backend = RecordingBackend::new();
        s.flush_to_backend(&mut backend);
        assert!(s.is_flushed());

        s.push();
        assert!(s.is_flushed(), "push keeps content");
        s.pop().unwrap();
        assert!(s.is_flushed(), "pop of a virtual level keeps content");

        s.push();
        s.translate(1.0, 0.0, 0.0);
        assert!(!s.is_flushed());
        s.flush_to_backend(&mut backend);
        s.pop().unwrap();
        assert!(!s.is_flushed(), "pop of a real frame changes content");
    }

    #[test]
    fn flush_skips_when_clean() {
        let mut s = TransformStack::new(StackKind::Projection);
        let mut backend = RecordingBackend::new();
        s.flush_to_backend(&mut backend);
        s.flush_to_backend(&mut backend);
        assert_eq!(
            backend.calls(),
            &[
                BackendCall::SetMatrixMode(MatrixMode::Projection),
                BackendCall::LoadMatrix(Matrix4::IDENTITY),
            ]
        );
    }
}
