/// Axis-aligned rectangle stored by its corners.
///
/// Drawing requests use `(x0, y0)` as the first corner and `(x1, y1)` as the
/// opposite one; the corners may be given in any order (a flipped rectangle
/// flips its texture coordinates). Clip bounds are always normalized.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    #[inline]
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[inline]
    pub const fn from_origin_size(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(x, y, x + w, y + h)
    }

    #[inline]
    pub fn width(self) -> f32 {
        self.x1 - self.x0
    }

    #[inline]
    pub fn height(self) -> f32 {
        self.y1 - self.y0
    }

    /// Zero or negative area.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    /// Swaps corners so that `x0 <= x1` and `y0 <= y1`.
    #[inline]
    pub fn normalized(self) -> Self {
        Self::new(
            self.x0.min(self.x1),
            self.y0.min(self.y1),
            self.x0.max(self.x1),
            self.y0.max(self.y1),
        )
    }

    /// Corners in quad drawing order: top-left, bottom-left, bottom-right, top-right.
    #[inline]
    pub fn corners(self) -> [[f32; 2]; 4] {
        [
            [self.x0, self.y0],
            [self.x0, self.y1],
            [self.x1, self.y1],
            [self.x1, self.y0],
        ]
    }

    /// Smallest normalized rectangle containing every point.
    ///
    /// Returns `None` for an empty slice.
    pub fn bounding(points: &[[f32; 2]]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut r = Self::new(first[0], first[1], first[0], first[1]);
        for p in rest {
            r.x0 = r.x0.min(p[0]);
            r.y0 = r.y0.min(p[1]);
            r.x1 = r.x1.max(p[0]);
            r.y1 = r.y1.max(p[1]);
        }
        Some(r)
    }

    /// Intersection that only ever narrows.
    ///
    /// Disjoint inputs yield a zero-area rectangle positioned inside `self`
    /// rather than `None`, so nested clips stay representable.
    #[inline]
    pub fn intersect(self, other: Rect) -> Rect {
        let a = self.normalized();
        let b = other.normalized();
        let x0 = a.x0.max(b.x0);
        let y0 = a.y0.max(b.y0);
        let x1 = a.x1.min(b.x1).max(x0);
        let y1 = a.y1.min(b.y1).max(y0);
        Rect::new(x0.min(a.x1), y0.min(a.y1), x1.min(a.x1), y1.min(a.y1))
    }

    /// `true` when `other` lies fully inside `self` (edges inclusive).
    #[inline]
    pub fn contains_rect(self, other: Rect) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        b.x0 >= a.x0 && b.y0 >= a.y0 && b.x1 <= a.x1 && b.y1 <= a.y1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_swaps_flipped_corners() {
        let r = Rect::new(10.0, 20.0, 0.0, 5.0).normalized();
        assert_eq!(r, Rect::new(0.0, 5.0, 10.0, 20.0));
    }

    #[test]
    fn corners_follow_quad_order() {
        let c = Rect::new(0.0, 0.0, 2.0, 3.0).corners();
        assert_eq!(c, [[0.0, 0.0], [0.0, 3.0], [2.0, 3.0], [2.0, 0.0]]);
    }

    #[test]
    fn intersect_overlapping() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 15.0, 15.0);
        assert_eq!(a.intersect(b), Rect::new(5.0, 5.0, 10.0, 10.0));
    }

    #[test]
    fn intersect_disjoint_is_empty_and_inside_self() {
        let a = Rect::new(0.0, 0.0, 5.0, 5.0);
        let b = Rect::new(20.0, 20.0, 25.0, 25.0);
        let i = a.intersect(b);
        assert!(i.is_empty());
        assert!(a.contains_rect(i));
    }

    #[test]
    fn intersect_never_widens() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(-100.0, -100.0, 100.0, 100.0);
        assert_eq!(a.intersect(b), a);
    }

    #[test]
    fn bounding_of_points() {
        let pts = [[3.0, 1.0], [-1.0, 4.0], [2.0, -2.0]];
        assert_eq!(Rect::bounding(&pts), Some(Rect::new(-1.0, -2.0, 3.0, 4.0)));
        assert_eq!(Rect::bounding(&[]), None);
    }

    #[test]
    fn is_empty_zero_size() {
        assert!(Rect::new(0.0, 0.0, 0.0, 5.0).is_empty());
        assert!(!Rect::from_origin_size(0.0, 0.0, 1.0, 1.0).is_empty());
    }
}
