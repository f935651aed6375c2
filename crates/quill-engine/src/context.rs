use std::rc::Rc;

use crate::backend::{BufferKind, DrawMode, FlushOptions, GpuBackend};
use crate::clip::{ClipStack, PrimitiveId};
use crate::config::JournalConfig;
use crate::coords::{Matrix4, Rect, Vec2, Viewport};
use crate::error::{QuillError, Result, StackKind};
use crate::journal::{stride_words, FlushReport, Journal, LayerValidator, Quad, MIN_LAYER_SLOTS};
use crate::material::{Material, MaterialRef};
use crate::transform::TransformStack;

/// Vertex of an immediately drawn polygon. `tex_coord` is used for every
/// texture layer.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PolygonVertex {
    pub position: Vec2,
    pub tex_coord: Vec2,
}

impl PolygonVertex {
    #[inline]
    pub const fn new(x: f32, y: f32, s: f32, t: f32) -> Self {
        Self { position: Vec2::new(x, y), tex_coord: Vec2::new(s, t) }
    }
}

/// Rendering state for one GPU context.
///
/// Owns the backend, both transform stacks, the clip stack and the journal.
/// Everything runs on the caller's thread; draws are deferred until
/// [`flush`](Self::flush) or until an operation needs the GPU to be current.
pub struct RenderContext<B: GpuBackend> {
    backend: B,
    modelview: TransformStack,
    projection: TransformStack,
    clip: ClipStack,
    viewport: Viewport,
    journal: Journal,
    validator: LayerValidator,
}

impl<B: GpuBackend> RenderContext<B> {
    pub fn new(backend: B, config: JournalConfig) -> Self {
        log::debug!(
            "render context: software_transform={} batching={} texture_units={}",
            config.software_transform,
            config.batching,
            config.max_texture_units,
        );
        Self {
            backend,
            modelview: TransformStack::new(StackKind::Modelview),
            projection: TransformStack::new(StackKind::Projection),
            clip: ClipStack::new(),
            viewport: Viewport::default(),
            journal: Journal::new(config),
            validator: LayerValidator::new(),
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Direct backend access. Pending entries are not flushed.
    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Drops pending entries and returns the backend.
    pub fn into_backend(self) -> B {
        if !self.journal.is_empty() {
            log::debug!("render context dropped with {} pending entries", self.journal.entries().len());
        }
        self.backend
    }

    #[inline]
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    #[inline]
    pub fn config(&self) -> &JournalConfig {
        self.journal.config()
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Changes the viewport. Pending entries are flushed first.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        if viewport != self.viewport {
            self.flush()?;
            self.viewport = viewport;
        }
        Ok(())
    }

    // ── transforms ────────────────────────────────────────────────────────

    #[inline]
    pub fn modelview(&self) -> &TransformStack {
        &self.modelview
    }

    /// Pending entries already captured their transform, so the modelview can
    /// change freely between logs.
    #[inline]
    pub fn modelview_mut(&mut self) -> &mut TransformStack {
        &mut self.modelview
    }

    #[inline]
    pub fn projection(&self) -> &TransformStack {
        &self.projection
    }

    /// Mutable projection stack. Pending entries are drawn with the
    /// projection active at flush time, so they are flushed first.
    pub fn projection_mut(&mut self) -> Result<&mut TransformStack> {
        self.flush()?;
        Ok(&mut self.projection)
    }

    /// Runs `edit` on the projection stack; see [`projection_mut`](Self::projection_mut).
    pub fn edit_projection<F: FnOnce(&mut TransformStack)>(&mut self, edit: F) -> Result<()> {
        edit(self.projection_mut()?);
        Ok(())
    }

    #[inline]
    pub fn push_matrix(&mut self) {
        self.modelview.push();
    }

    #[inline]
    pub fn pop_matrix(&mut self) -> Result<()> {
        self.modelview.pop()
    }

    // ── clipping ──────────────────────────────────────────────────────────

    #[inline]
    pub fn clip_stack(&self) -> &ClipStack {
        &self.clip
    }

    /// Replaces the clip stack, e.g. with one saved earlier.
    #[inline]
    pub fn set_clip_stack(&mut self, clip: ClipStack) {
        self.clip = clip;
    }

    /// Clips to a model-space rectangle under the current transforms.
    pub fn push_clip_rectangle(&mut self, rect: Rect) {
        self.clip = self.clip.push_rectangle(
            rect,
            &self.modelview.get(),
            &self.projection.get(),
            self.viewport,
        );
    }

    pub fn push_clip_window_rectangle(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.clip = self.clip.push_window_rectangle(x, y, width, height);
    }

    pub fn push_clip_primitive(&mut self, primitive: PrimitiveId, bounds: Rect) {
        self.clip = self.clip.push_primitive(
            primitive,
            bounds,
            &self.modelview.get(),
            &self.projection.get(),
            self.viewport,
        );
    }

    pub fn pop_clip(&mut self) {
        self.clip = self.clip.pop();
    }

    #[inline]
    pub fn clip_window_bounds(&self) -> Option<Rect> {
        self.clip.window_bounds()
    }

    // ── logging ───────────────────────────────────────────────────────────

    /// Logs one quad with explicit layer overrides.
    ///
    /// Flushes first when the pending entries were logged under a different
    /// clip stack, and right after when batching is disabled.
    pub fn log_quad(&mut self, quad: &Quad<'_>) -> Result<()> {
        if !self.journal.is_empty() && !self.journal.clip().ptr_eq(&self.clip) {
            log::trace!("clip stack changed; flushing journal");
            self.flush()?;
        }

        self.journal.log_quad(quad, &self.modelview.get(), &self.clip)?;

        if !self.journal.config().batching {
            self.flush()?;
        }
        Ok(())
    }

    /// Draws `rect` with the unit square as texture coordinates on every layer.
    pub fn draw_rectangle(&mut self, rect: Rect, material: &MaterialRef) -> Result<()> {
        self.draw_multitextured_rectangle(rect, material, &[])
    }

    /// Draws `rect` with `(s1, t1, s2, t2)` on the first layer.
    pub fn draw_textured_rectangle(
        &mut self,
        rect: Rect,
        material: &MaterialRef,
        tex_coords: [f32; 4],
    ) -> Result<()> {
        self.draw_multitextured_rectangle(rect, material, &[tex_coords])
    }

    /// Draws `rect` with one coordinate set per layer; missing layers use the
    /// unit square, extra sets are ignored.
    pub fn draw_multitextured_rectangle(
        &mut self,
        rect: Rect,
        material: &MaterialRef,
        tex_coords: &[[f32; 4]],
    ) -> Result<()> {
        let limit = self.journal.config().layer_limit();
        let plan = self.validator.plan(material, tex_coords, limit);
        let quad = Quad {
            position: rect,
            material,
            n_layers: plan.n_layers,
            fallback_layers: plan.fallback_layers,
            disable_layers: plan.disable_layers,
            layer0_override: None,
            tex_coords,
        };
        self.log_quad(&quad)
    }

    pub fn draw_rectangles(&mut self, rects: &[Rect], material: &MaterialRef) -> Result<()> {
        for rect in rects {
            self.draw_rectangle(*rect, material)?;
        }
        Ok(())
    }

    /// Draws a convex polygon immediately as a triangle fan.
    ///
    /// Polygons bypass the journal, so pending entries are flushed first to
    /// keep painter's order.
    pub fn draw_polygon(&mut self, vertices: &[PolygonVertex], material: &MaterialRef) -> Result<()> {
        if vertices.len() < 3 {
            log::warn!("polygon with {} vertices ignored", vertices.len());
            return Ok(());
        }

        self.flush()?;

        let limit = self.journal.config().layer_limit();
        let coords = polygon_tex_range(vertices);
        let plan = self.validator.plan(material, &vec![coords; material.n_layers()], limit);

        let position_components = 2u32;
        let stride = stride_words(position_components, plan.n_layers);
        let color = material.color.to_packed();
        let total = stride * vertices.len();
        let mut words: Vec<u32> = Vec::new();
        words.try_reserve(total).map_err(|_| QuillError::OutOfMemory { words: total })?;
        for v in vertices {
            words.extend_from_slice(&[v.position.x.to_bits(), v.position.y.to_bits(), color]);
            for slot in 0..plan.n_layers.max(MIN_LAYER_SLOTS) {
                let st = if slot < plan.n_layers { v.tex_coord } else { Vec2::default() };
                words.extend_from_slice(&[st.x.to_bits(), st.y.to_bits()]);
            }
        }

        self.projection.flush_to_backend(&mut self.backend);
        self.modelview.flush_to_backend(&mut self.backend);
        self.journal.flush_clip_for_immediate(&mut self.backend, &self.clip);

        let buffer = self.backend.upload_buffer(BufferKind::Vertex, bytemuck::cast_slice(&words))?;
        let stride_bytes = stride * 4;
        self.backend.bind_vertex_pointer(buffer, position_components, stride_bytes, 0);
        self.backend.bind_color_pointer(buffer, stride_bytes, position_components as usize * 4);
        for unit in 0..plan.n_layers {
            let offset = (position_components as usize + 1) * 4 + unit * 8;
            self.backend.bind_texcoord_pointer(unit as u32, buffer, stride_bytes, offset);
        }
        let options = FlushOptions {
            fallback_layers: plan.fallback_layers,
            disable_layers: plan.disable_layers,
            layer0_override: None,
            skip_color: true,
        };
        self.backend.flush_material_state(material, &options);
        self.backend.draw_arrays(DrawMode::TriangleFan, 0, vertices.len() as u32);
        self.backend.release_buffer(buffer);
        Ok(())
    }

    // ── materials ─────────────────────────────────────────────────────────

    /// Mutates a shared material.
    ///
    /// A material referenced by pending entries is frozen: the journal is
    /// flushed before `edit` runs. If other handles still share the material
    /// afterwards, `material` is detached onto a private copy.
    pub fn edit_material<F: FnOnce(&mut Material)>(&mut self, material: &mut MaterialRef, edit: F) -> Result<()> {
        if self.journal.references(material) {
            log::trace!("material edited while referenced by the journal; flushing");
            self.flush()?;
        }
        edit(Rc::make_mut(material));
        Ok(())
    }

    // ── flushing ──────────────────────────────────────────────────────────

    /// Draws every pending entry and empties the journal.
    pub fn flush(&mut self) -> Result<FlushReport> {
        self.journal.flush(&mut self.backend, &mut self.modelview, &mut self.projection)
    }

    /// Forgets cached backend state (matrices and clip), e.g. after another
    /// renderer touched the GPU context.
    pub fn invalidate_backend_state(&mut self) {
        self.modelview.mark_dirty();
        self.projection.mark_dirty();
        self.journal.invalidate_clip();
    }
}

/// Texture coordinate extent of a polygon, as `(s1, t1, s2, t2)`.
fn polygon_tex_range(vertices: &[PolygonVertex]) -> [f32; 4] {
    let pts: Vec<[f32; 2]> = vertices.iter().map(|v| v.tex_coord.to_array()).collect();
    Rect::bounding(&pts).map_or([0.0, 0.0, 1.0, 1.0], |r| [r.x0, r.y0, r.x1, r.y1])
}
