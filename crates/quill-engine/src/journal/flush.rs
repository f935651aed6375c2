use std::ops::Range;

use crate::backend::{
    BufferHandle, BufferKind, DrawMode, FlushOptions, GpuBackend, IndexFormat, MatrixMode,
};
use crate::clip::ClipStack;
use crate::coords::Matrix4;
use crate::error::{QuillError, Result};
use crate::transform::TransformStack;

use super::batch::{batch_and_call, same_layer_count, same_material_state, same_modelview, same_stride};
use super::vertex::stride_bytes;
use super::{Journal, JournalEntry};

/// Indices per quad: two triangles sharing the TL–BR diagonal.
const QUAD_INDEX_PATTERN: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Shared index buffer covering `quads` consecutive quads.
#[derive(Debug)]
pub(super) struct QuadIndices {
    handle: BufferHandle,
    quads: usize,
}

/// What a flush did, for diagnostics and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub entries: usize,
    pub vertices: usize,
    pub stride_batches: usize,
    pub layer_batches: usize,
    pub material_batches: usize,
    /// Entry ranges covered by each draw call, in submission order.
    pub draws: Vec<Range<usize>>,
}

impl FlushReport {
    #[inline]
    pub fn draw_calls(&self) -> usize {
        self.draws.len()
    }
}

impl Journal {
    /// Compiles and draws every pending entry, then resets the journal.
    ///
    /// An empty journal makes no backend calls. On a backend error the
    /// pending entries are still discarded.
    pub fn flush<B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        modelview: &mut TransformStack,
        projection: &mut TransformStack,
    ) -> Result<FlushReport> {
        if self.entries.is_empty() {
            return Ok(FlushReport::default());
        }

        let mut entries = std::mem::take(&mut self.entries);
        let result = self.execute(backend, modelview, projection, &entries);

        // Dropping the entries releases their material handles.
        entries.clear();
        self.entries = entries;
        self.vertices.clear();

        result
    }

    fn execute<B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        modelview: &mut TransformStack,
        projection: &mut TransformStack,
        entries: &[JournalEntry],
    ) -> Result<FlushReport> {
        let vbo = backend.upload_buffer(BufferKind::Vertex, self.vertices.as_bytes())?;
        let indices = if entries.len() > 1 {
            match self.ensure_quad_indices(backend, entries.len()) {
                Ok(handle) => Some(handle),
                Err(err) => {
                    backend.release_buffer(vbo);
                    return Err(err);
                }
            }
        } else {
            None
        };

        projection.flush_to_backend(backend);

        // The journal drives the modelview itself from here on; whatever the
        // stack last flushed is no longer in the backend.
        backend.set_matrix_mode(MatrixMode::Modelview);
        if self.config.software_transform {
            backend.load_matrix(&Matrix4::IDENTITY);
        }
        modelview.mark_dirty();

        self.flush_clip(backend);

        let mut state = FlushState {
            backend: &mut *backend,
            vbo,
            indices,
            position_components: self.position_components(),
            software_transform: self.config.software_transform,
            batching: self.config.batching,
            trace: self.config.trace_batching,
            run_start: 0,
            run_offset: 0,
            report: FlushReport {
                entries: entries.len(),
                vertices: self.vertices.vertex_count(),
                ..FlushReport::default()
            },
        };
        state.flush_strides(entries);
        let report = state.report;

        backend.release_buffer(vbo);

        log::debug!(
            "journal flush: {} entries, {} draws ({} stride / {} layer / {} material batches)",
            report.entries,
            report.draws.len(),
            report.stride_batches,
            report.layer_batches,
            report.material_batches,
        );
        Ok(report)
    }

    /// Brings the backend's clip state up to date for a draw issued outside
    /// the journal. Only valid while the journal is empty.
    pub(crate) fn flush_clip_for_immediate<B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        clip: &ClipStack,
    ) {
        debug_assert!(self.entries.is_empty(), "immediate draw with pending entries");
        self.clip = clip.clone();
        self.flush_clip(backend);
    }

    /// Sends the pending entries' clip state unless the backend already has it.
    fn flush_clip<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        if self.flushed_clip.as_ref().is_some_and(|c| c.ptr_eq(&self.clip)) {
            return;
        }
        backend.flush_clip_state(&self.clip.resolve());
        self.flushed_clip = Some(self.clip.clone());
    }

    /// Makes sure the shared index buffer covers `quads` quads.
    fn ensure_quad_indices<B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        quads: usize,
    ) -> Result<BufferHandle> {
        if let Some(existing) = &self.quad_indices {
            if existing.quads >= quads {
                return Ok(existing.handle);
            }
        }

        let capacity = quads.next_power_of_two().max(64);
        let (format, bytes) = build_quad_indices(capacity)?;
        let handle = backend.upload_buffer(BufferKind::Index(format), &bytes)?;
        if let Some(old) = self.quad_indices.take() {
            backend.release_buffer(old.handle);
        }
        log::debug!("quad index buffer grown to {capacity} quads ({format:?})");
        self.quad_indices = Some(QuadIndices { handle, quads: capacity });
        Ok(handle)
    }
}

/// Index data for `quads` consecutive quads, u16 while every vertex index
/// fits.
fn build_quad_indices(quads: usize) -> Result<(IndexFormat, Vec<u8>)> {
    let vertices = quads
        .checked_mul(4)
        .filter(|&v| u32::try_from(v.saturating_sub(1)).is_ok());
    let format = match vertices {
        Some(v) if v <= u16::MAX as usize + 1 => IndexFormat::U16,
        Some(_) => IndexFormat::U32,
        None => return Err(QuillError::OutOfMemory { words: usize::MAX }),
    };
    let len = quads
        .checked_mul(QUAD_INDEX_PATTERN.len() * format.size())
        .ok_or(QuillError::OutOfMemory { words: usize::MAX })?;

    let mut bytes: Vec<u8> = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|_| QuillError::OutOfMemory { words: len.div_ceil(4) })?;
    for q in 0..quads as u32 {
        for i in QUAD_INDEX_PATTERN {
            let index = q * 4 + i;
            match format {
                IndexFormat::U16 => bytes.extend_from_slice(&(index as u16).to_ne_bytes()),
                IndexFormat::U32 => bytes.extend_from_slice(&index.to_ne_bytes()),
            }
        }
    }
    Ok((format, bytes))
}

/// Per-flush cursor threaded through the nested batch levels.
struct FlushState<'b, B: GpuBackend + ?Sized> {
    backend: &'b mut B,
    vbo: BufferHandle,
    indices: Option<BufferHandle>,
    position_components: u32,
    software_transform: bool,
    batching: bool,
    trace: bool,
    /// First entry of the current stride run.
    run_start: usize,
    /// Byte offset of the current stride run in the vertex buffer.
    run_offset: usize,
    report: FlushReport,
}

impl<B: GpuBackend + ?Sized> FlushState<'_, B> {
    /// Level 1: vertex layout.
    fn flush_strides(&mut self, entries: &[JournalEntry]) {
        let batching = self.batching;
        batch_and_call(
            entries,
            |a, b| batching && same_stride(a, b),
            |start, run| self.flush_stride_run(start, run),
        );
    }

    fn flush_stride_run(&mut self, start: usize, run: &[JournalEntry]) {
        let pc = self.position_components;
        let stride = stride_bytes(pc, run[0].n_layers());
        self.report.stride_batches += 1;
        self.run_start = start;

        self.backend.bind_vertex_pointer(self.vbo, pc, stride, self.run_offset);
        self.backend.bind_color_pointer(self.vbo, stride, self.run_offset + pc as usize * 4);

        let batching = self.batching;
        batch_and_call(
            run,
            |a, b| batching && same_layer_count(a, b),
            |offset, sub| self.flush_layer_run(start + offset, sub),
        );

        self.run_offset += run.len() * 4 * stride;
    }

    /// Level 2: texture coordinate bindings.
    fn flush_layer_run(&mut self, start: usize, run: &[JournalEntry]) {
        let pc = self.position_components as usize;
        let n_layers = run[0].n_layers();
        let stride = stride_bytes(self.position_components, n_layers);
        self.report.layer_batches += 1;

        for unit in 0..n_layers {
            let offset = self.run_offset + (pc + 1) * 4 + unit * 8;
            self.backend.bind_texcoord_pointer(unit as u32, self.vbo, stride, offset);
        }

        let batching = self.batching;
        batch_and_call(
            run,
            |a, b| batching && same_material_state(a, b),
            |offset, sub| self.flush_material_run(start + offset, sub),
        );
    }

    /// Level 3: material state.
    fn flush_material_run(&mut self, start: usize, run: &[JournalEntry]) {
        let first = &run[0];
        self.report.material_batches += 1;
        let options = FlushOptions {
            fallback_layers: first.fallback_layers,
            disable_layers: first.disable_layers,
            layer0_override: first.layer0_override,
            skip_color: true,
        };
        self.backend.flush_material_state(&first.material, &options);

        if self.software_transform {
            self.draw(start, run.len());
            return;
        }

        let batching = self.batching;
        batch_and_call(
            run,
            |a, b| batching && same_modelview(a, b),
            |offset, sub| self.flush_modelview_run(start + offset, sub),
        );
    }

    /// Level 4: modelview, only without software transform.
    fn flush_modelview_run(&mut self, start: usize, run: &[JournalEntry]) {
        if let Some(m) = &run[0].modelview {
            self.backend.load_matrix(m);
        }
        self.draw(start, run.len());
    }

    fn draw(&mut self, start: usize, quads: usize) {
        let local = start - self.run_start;
        if self.trace {
            log::trace!("batch: entries {}..{} ({} quads)", start, start + quads, quads);
        }

        if quads == 1 {
            self.backend.draw_arrays(DrawMode::TriangleFan, (local * 4) as u32, 4);
        } else {
            // The shared index buffer exists whenever the journal holds more
            // than one entry.
            debug_assert!(self.indices.is_some(), "multi-quad batch without quad indices");
            if let Some(indices) = self.indices {
                self.backend.draw_indexed(
                    DrawMode::Triangles,
                    indices,
                    (local * 6) as u32,
                    (quads * 6) as u32,
                );
            }
        }
        self.report.draws.push(start..start + quads);
    }
}
