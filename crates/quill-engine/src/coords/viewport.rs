/// Window-space viewport: origin and size in framebuffer pixels.
///
/// Maps normalized device coordinates to window coordinates the way the
/// fixed-function viewport transform does; no Y flip is applied, so window
/// space follows the backend's own origin convention.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// NDC `[-1, 1]` to window coordinates.
    #[inline]
    pub fn ndc_to_window(self, ndc_x: f32, ndc_y: f32) -> [f32; 2] {
        [
            self.x + (ndc_x * 0.5 + 0.5) * self.width,
            self.y + (ndc_y * 0.5 + 0.5) * self.height,
        ]
    }
}
