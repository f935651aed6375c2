use std::rc::Rc;

use crate::coords::{Matrix4, Rect, Viewport};

/// Tolerance in window pixels when deciding whether transformed corners are
/// still axis-aligned.
const AXIS_EPSILON: f32 = 1e-4;

/// Opaque identity of a backend-side silhouette primitive (for example a
/// tessellated path kept by the caller).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PrimitiveId(pub u32);

/// Shape of a single clip entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipShape {
    /// Rectangle already in window pixels.
    WindowRect(Rect),
    /// Model-space rectangle with the transforms active when it was pushed.
    Rectangle { rect: Rect, modelview: Matrix4, projection: Matrix4 },
    /// Arbitrary silhouette; `bounds` is its model-space bounding box.
    Primitive { primitive: PrimitiveId, bounds: Rect, modelview: Matrix4, projection: Matrix4 },
}

#[derive(Debug)]
struct ClipEntry {
    shape: ClipShape,
    /// Window-space bounds intersected with all ancestors.
    window_bounds: Rect,
    can_be_scissor: bool,
    parent: Option<Rc<ClipEntry>>,
}

/// What the backend needs to clip the next draws.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipState {
    /// Scissor box in window pixels. `None` disables scissoring.
    pub scissor: Option<Rect>,
    /// Shapes that need silhouette (stencil) clipping, root first.
    pub stencil: Vec<ClipShape>,
}

/// Handle to the current top of a clip chain. Cloning shares the chain.
#[derive(Debug, Clone, Default)]
pub struct ClipStack {
    top: Option<Rc<ClipEntry>>,
}

impl ClipStack {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    /// Same chain (same top entry, or both empty).
    #[inline]
    pub fn ptr_eq(&self, other: &ClipStack) -> bool {
        match (&self.top, &other.top) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    pub fn depth(&self) -> usize {
        self.entries().count()
    }

    fn entries(&self) -> impl Iterator<Item = &ClipEntry> {
        std::iter::successors(self.top.as_deref(), |e| e.parent.as_deref())
    }

    fn push_entry(&self, shape: ClipShape, bounds: Rect, can_be_scissor: bool) -> ClipStack {
        let window_bounds = match &self.top {
            Some(parent) => parent.window_bounds.intersect(bounds),
            None => bounds.normalized(),
        };
        ClipStack {
            top: Some(Rc::new(ClipEntry {
                shape,
                window_bounds,
                can_be_scissor,
                parent: self.top.clone(),
            })),
        }
    }

    /// Pushes a rectangle given directly in window pixels.
    pub fn push_window_rectangle(&self, x: f32, y: f32, width: f32, height: f32) -> ClipStack {
        let rect = Rect::from_origin_size(x, y, width, height).normalized();
        self.push_entry(ClipShape::WindowRect(rect), rect, true)
    }

    /// Pushes a model-space rectangle.
    ///
    /// Scissoring is possible only while the transformed rectangle stays
    /// axis-aligned in window space.
    pub fn push_rectangle(
        &self,
        rect: Rect,
        modelview: &Matrix4,
        projection: &Matrix4,
        viewport: Viewport,
    ) -> ClipStack {
        let projected = project_corners(rect, modelview, projection, viewport);
        let (bounds, can_be_scissor) = match projected {
            Some(corners) => (
                Rect::bounding(&corners).unwrap_or_default(),
                is_axis_aligned(&corners),
            ),
            None => (viewport_rect(viewport), false),
        };
        let shape = ClipShape::Rectangle { rect, modelview: *modelview, projection: *projection };
        self.push_entry(shape, bounds, can_be_scissor)
    }

    /// Pushes an arbitrary silhouette. Always needs stencil clipping.
    pub fn push_primitive(
        &self,
        primitive: PrimitiveId,
        bounds: Rect,
        modelview: &Matrix4,
        projection: &Matrix4,
        viewport: Viewport,
    ) -> ClipStack {
        let window = project_corners(bounds, modelview, projection, viewport)
            .and_then(|c| Rect::bounding(&c))
            .unwrap_or_else(|| viewport_rect(viewport));
        let shape = ClipShape::Primitive {
            primitive,
            bounds,
            modelview: *modelview,
            projection: *projection,
        };
        self.push_entry(shape, window, false)
    }

    /// Returns the parent stack. The popped entry is freed once no other
    /// stack shares it.
    pub fn pop(&self) -> ClipStack {
        match &self.top {
            Some(top) => ClipStack { top: top.parent.clone() },
            None => {
                log::warn!("clip stack: pop without matching push ignored");
                ClipStack::default()
            }
        }
    }

    /// Combined window-space bounds of every active clip, or `None` when
    /// nothing is clipped.
    pub fn window_bounds(&self) -> Option<Rect> {
        let mut entries = self.entries();
        let first = entries.next()?.window_bounds;
        Some(entries.fold(first, |acc, e| e.window_bounds.intersect(acc)))
    }

    /// `true` when every entry can be expressed as a scissor box.
    pub fn is_scissor_only(&self) -> bool {
        self.entries().all(|e| e.can_be_scissor)
    }

    /// Resolves the chain into backend clip state.
    pub fn resolve(&self) -> ClipState {
        let mut stencil: Vec<ClipShape> = self
            .entries()
            .filter(|e| !e.can_be_scissor)
            .map(|e| e.shape.clone())
            .collect();
        stencil.reverse();
        ClipState { scissor: self.window_bounds(), stencil }
    }
}

fn viewport_rect(vp: Viewport) -> Rect {
    Rect::from_origin_size(vp.x, vp.y, vp.width, vp.height)
}

/// Window-space corners (TL, BL, BR, TR), or `None` if any corner falls
/// behind the eye.
fn project_corners(
    rect: Rect,
    modelview: &Matrix4,
    projection: &Matrix4,
    viewport: Viewport,
) -> Option<[[f32; 2]; 4]> {
    let mvp = *projection * *modelview;
    let mut out = [[0.0f32; 2]; 4];
    for (o, c) in out.iter_mut().zip(rect.corners()) {
        let p = mvp.transform_point([c[0], c[1], 0.0, 1.0]);
        if p[3] <= f32::EPSILON {
            return None;
        }
        *o = viewport.ndc_to_window(p[0] / p[3], p[1] / p[3]);
    }
    Some(out)
}

fn is_axis_aligned(c: &[[f32; 2]; 4]) -> bool {
    let eq = |a: f32, b: f32| (a - b).abs() <= AXIS_EPSILON;
    // Corners are TL, BL, BR, TR: either the left/right edges are vertical
    // or, after a quarter turn, horizontal.
    let upright = eq(c[0][0], c[1][0]) && eq(c[3][0], c[2][0]) && eq(c[0][1], c[3][1]) && eq(c[1][1], c[2][1]);
    let turned = eq(c[0][1], c[1][1]) && eq(c[3][1], c[2][1]) && eq(c[0][0], c[3][0]) && eq(c[1][0], c[2][0]);
    upright || turned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp() -> Viewport {
        Viewport::new(0.0, 0.0, 200.0, 100.0)
    }

    /// Projection mapping model units 1:1 onto window pixels.
    fn pixel_projection() -> Matrix4 {
        Matrix4::ortho(0.0, 200.0, 0.0, 100.0, -1.0, 1.0)
    }

    fn close(a: Rect, b: Rect) -> bool {
        (a.x0 - b.x0).abs() < 1e-3
            && (a.y0 - b.y0).abs() < 1e-3
            && (a.x1 - b.x1).abs() < 1e-3
            && (a.y1 - b.y1).abs() < 1e-3
    }

    #[test]
    fn empty_stack_has_no_bounds() {
        let s = ClipStack::new();
        assert_eq!(s.window_bounds(), None);
        assert_eq!(s.resolve(), ClipState::default());
    }

    #[test]
    fn window_rectangle_is_scissor() {
        let s = ClipStack::new().push_window_rectangle(10.0, 20.0, 30.0, 40.0);
        assert_eq!(s.window_bounds(), Some(Rect::new(10.0, 20.0, 40.0, 60.0)));
        assert!(s.is_scissor_only());
    }

    #[test]
    fn translated_rectangle_projects_to_window() {
        let mv = Matrix4::from_translation(5.0, 5.0, 0.0);
        let s = ClipStack::new().push_rectangle(Rect::new(0.0, 0.0, 10.0, 10.0), &mv, &pixel_projection(), vp());
        assert!(close(s.window_bounds().unwrap(), Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(s.is_scissor_only());
    }

    #[test]
    fn rotated_rectangle_needs_stencil() {
        let mv = Matrix4::from_translation(50.0, 50.0, 0.0) * Matrix4::from_rotation(45.0, 0.0, 0.0, 1.0);
        let s = ClipStack::new().push_rectangle(Rect::new(-10.0, -10.0, 10.0, 10.0), &mv, &pixel_projection(), vp());
        assert!(!s.is_scissor_only());
        let state = s.resolve();
        assert_eq!(state.stencil.len(), 1);
        let b = state.scissor.unwrap();
        let half_diag = 10.0 * std::f32::consts::SQRT_2;
        assert!(close(b, Rect::new(50.0 - half_diag, 50.0 - half_diag, 50.0 + half_diag, 50.0 + half_diag)));
    }

    #[test]
    fn quarter_turn_stays_scissor() {
        let mv = Matrix4::from_translation(50.0, 50.0, 0.0) * Matrix4::from_rotation(90.0, 0.0, 0.0, 1.0);
        let s = ClipStack::new().push_rectangle(Rect::new(0.0, 0.0, 20.0, 10.0), &mv, &pixel_projection(), vp());
        assert!(s.is_scissor_only());
    }

    #[test]
    fn nested_pushes_never_expand() {
        let proj = pixel_projection();
        let mut s = ClipStack::new().push_window_rectangle(0.0, 0.0, 100.0, 100.0);
        let pushes = [
            Rect::new(-50.0, -50.0, 500.0, 500.0),
            Rect::new(20.0, 10.0, 60.0, 90.0),
            Rect::new(150.0, 150.0, 160.0, 160.0),
        ];
        for r in pushes {
            let parent = s.window_bounds().unwrap();
            s = s.push_rectangle(r, &Matrix4::IDENTITY, &proj, vp());
            let child = s.window_bounds().unwrap();
            assert!(parent.contains_rect(child), "{child:?} escapes {parent:?}");
        }
        assert!(s.window_bounds().unwrap().is_empty());
    }

    #[test]
    fn primitive_is_never_scissor() {
        let s = ClipStack::new()
            .push_window_rectangle(0.0, 0.0, 50.0, 50.0)
            .push_primitive(PrimitiveId(7), Rect::new(10.0, 10.0, 80.0, 80.0), &Matrix4::IDENTITY, &pixel_projection(), vp());
        let state = s.resolve();
        assert!(close(state.scissor.unwrap(), Rect::new(10.0, 10.0, 50.0, 50.0)));
        assert!(matches!(state.stencil.as_slice(), [ClipShape::Primitive { primitive: PrimitiveId(7), .. }]));
    }

    #[test]
    fn pop_returns_parent_and_shares_entries() {
        let base = ClipStack::new().push_window_rectangle(0.0, 0.0, 10.0, 10.0);
        let child = base.push_window_rectangle(2.0, 2.0, 4.0, 4.0);
        let saved = child.clone();
        let popped = child.pop();
        assert!(popped.ptr_eq(&base));
        assert_eq!(saved.depth(), 2);
        assert_eq!(saved.window_bounds(), Some(Rect::new(2.0, 2.0, 6.0, 6.0)));
    }

    #[test]
    fn pop_on_empty_is_noop() {
        let s = ClipStack::new().pop();
        assert!(s.is_empty());
    }
}
