//! Deferred draw journal.
//!
//! Logging a quad appends its vertices to one shared buffer and a small
//! record to the entry log; nothing reaches the backend until [`Journal::flush`].
//! Flushing compiles the entry log into nested batches and issues one draw
//! per finest-grain batch.

mod batch;
mod entry;
mod flush;
mod validate;
mod vertex;

use crate::clip::ClipStack;
use crate::config::JournalConfig;
use crate::coords::{Matrix4, Rect};
use crate::error::{QuillError, Result};
use crate::material::{MaterialRef, TextureId};

pub use batch::{batch_and_call, same_layer_count, same_material_state, same_modelview, same_stride};
pub use entry::JournalEntry;
pub use flush::FlushReport;
pub use validate::{LayerPlan, LayerValidator};
pub use vertex::{stride_bytes, stride_words, VertexBuffer, DEFAULT_TEX_COORDS};

pub(crate) use vertex::MIN_LAYER_SLOTS;

use flush::QuadIndices;

/// Everything needed to log one quad.
#[derive(Debug, Clone, Copy)]
pub struct Quad<'a> {
    pub position: Rect,
    pub material: &'a MaterialRef,
    pub n_layers: usize,
    pub fallback_layers: u32,
    pub disable_layers: u32,
    pub layer0_override: Option<TextureId>,
    /// `(s1, t1, s2, t2)` per layer; missing layers use the unit square.
    pub tex_coords: &'a [[f32; 4]],
}

impl<'a> Quad<'a> {
    /// A quad using every layer of `material` with default coordinates.
    pub fn new(position: Rect, material: &'a MaterialRef) -> Self {
        Self {
            position,
            material,
            n_layers: material.n_layers(),
            fallback_layers: 0,
            disable_layers: 0,
            layer0_override: None,
            tex_coords: &[],
        }
    }
}

#[derive(Debug)]
pub struct Journal {
    config: JournalConfig,
    entries: Vec<JournalEntry>,
    vertices: VertexBuffer,
    /// Clip stack the pending entries were logged under.
    clip: ClipStack,
    /// Clip stack last sent to the backend.
    flushed_clip: Option<ClipStack>,
    quad_indices: Option<QuadIndices>,
}

impl Journal {
    pub fn new(config: JournalConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            vertices: VertexBuffer::new(),
            clip: ClipStack::new(),
            flushed_clip: None,
            quad_indices: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    #[inline]
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.vertex_count()
    }

    #[inline]
    pub fn vertices(&self) -> &VertexBuffer {
        &self.vertices
    }

    /// Position components per vertex for this journal's transform mode.
    #[inline]
    pub fn position_components(&self) -> u32 {
        if self.config.software_transform { 3 } else { 2 }
    }

    /// Clip stack the pending entries belong to.
    #[inline]
    pub fn clip(&self) -> &ClipStack {
        &self.clip
    }

    /// `true` if any pending entry holds `material`.
    pub fn references(&self, material: &MaterialRef) -> bool {
        self.entries.iter().any(|e| std::rc::Rc::ptr_eq(&e.material, material))
    }

    /// Forgets what clip state the backend holds, so the next flush resends it.
    #[inline]
    pub fn invalidate_clip(&mut self) {
        self.flushed_clip = None;
    }

    /// Appends one quad.
    ///
    /// The caller must flush first if `clip` differs from the clip of the
    /// pending entries; the journal records `clip` for the first entry only.
    pub fn log_quad(&mut self, quad: &Quad<'_>, modelview: &Matrix4, clip: &ClipStack) -> Result<()> {
        let n_layers = quad.n_layers.min(32);
        let transform = self.config.software_transform.then_some(modelview);

        // Reserve the entry slot first so a failure leaves both logs untouched.
        self.entries
            .try_reserve(1)
            .map_err(|_| QuillError::OutOfMemory { words: size_of::<JournalEntry>().div_ceil(4) })?;

        self.vertices.append_quad(
            quad.position,
            quad.material.color.to_packed(),
            n_layers,
            quad.tex_coords,
            transform,
        )?;

        if self.entries.is_empty() {
            self.clip = clip.clone();
        }

        let entry = JournalEntry {
            material: quad.material.clone(),
            n_layers: n_layers as u8,
            fallback_layers: quad.fallback_layers,
            disable_layers: quad.disable_layers,
            layer0_override: quad.layer0_override,
            modelview: (!self.config.software_transform).then_some(*modelview),
        };

        if self.config.trace_journal {
            log::trace!(
                "journal[{}]: {:?} layers={} fallback={:#x} disable={:#x} override={:?}",
                self.entries.len(),
                quad.position,
                entry.n_layers,
                entry.fallback_layers,
                entry.disable_layers,
                entry.layer0_override,
            );
        }

        self.entries.push(entry);
        Ok(())
    }
}
