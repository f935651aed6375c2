use crate::coords::{Matrix4, Rect};
use crate::error::{QuillError, Result};

/// Texture coordinates used for layers the caller did not specify.
pub const DEFAULT_TEX_COORDS: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

/// Layers below this count share one vertex layout.
pub(crate) const MIN_LAYER_SLOTS: usize = 2;

/// Words per vertex for `n_layers` texture layers.
///
/// Layout: position, packed color, then one `(s, t)` pair per layer slot.
/// The slot count never drops below two so that toggling a second layer
/// does not change the layout.
#[inline]
pub fn stride_words(position_components: u32, n_layers: usize) -> usize {
    position_components as usize + 1 + 2 * n_layers.max(MIN_LAYER_SLOTS)
}

/// Byte stride counterpart of [`stride_words`].
#[inline]
pub fn stride_bytes(position_components: u32, n_layers: usize) -> usize {
    stride_words(position_components, n_layers) * 4
}

/// Interleaved vertex data for every quad logged since the last flush.
///
/// Stored as raw 32-bit words so the packed color keeps its exact bits.
#[derive(Debug, Default)]
pub struct VertexBuffer {
    words: Vec<u32>,
    vertices: usize,
}

impl VertexBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices == 0
    }

    /// Resets the length; capacity is kept for the next cycle.
    #[inline]
    pub fn clear(&mut self) {
        self.words.clear();
        self.vertices = 0;
    }

    /// Appends the four corners of `position` (TL, BL, BR, TR).
    ///
    /// With `transform` the positions are pre-multiplied and written as
    /// `x, y, z`; without it they are written as raw `x, y`.
    pub fn append_quad(
        &mut self,
        position: Rect,
        color: u32,
        n_layers: usize,
        tex_coords: &[[f32; 4]],
        transform: Option<&Matrix4>,
    ) -> Result<()> {
        let position_components = if transform.is_some() { 3 } else { 2 };
        let stride = stride_words(position_components, n_layers);
        let words = stride * 4;
        self.words
            .try_reserve(words)
            .map_err(|_| QuillError::OutOfMemory { words })?;

        let corners = position.corners();
        for (corner, p) in corners.iter().enumerate() {
            match transform {
                Some(m) => {
                    let t = m.transform_point([p[0], p[1], 0.0, 1.0]);
                    self.words.extend_from_slice(&[t[0].to_bits(), t[1].to_bits(), t[2].to_bits()]);
                }
                None => self.words.extend_from_slice(&[p[0].to_bits(), p[1].to_bits()]),
            }
            self.words.push(color);

            for slot in 0..n_layers.max(MIN_LAYER_SLOTS) {
                let st = if slot < n_layers {
                    let [s1, t1, s2, t2] = tex_coords.get(slot).copied().unwrap_or(DEFAULT_TEX_COORDS);
                    // Same corner order as `Rect::corners`.
                    match corner {
                        0 => [s1, t1],
                        1 => [s1, t2],
                        2 => [s2, t2],
                        _ => [s2, t1],
                    }
                } else {
                    [0.0, 0.0]
                };
                self.words.extend_from_slice(&[st[0].to_bits(), st[1].to_bits()]);
            }
        }

        self.vertices += 4;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(w: u32) -> f32 {
        f32::from_bits(w)
    }

    #[test]
    fn stride_has_two_layer_floor() {
        assert_eq!(stride_words(3, 0), 3 + 1 + 4);
        assert_eq!(stride_words(3, 1), stride_words(3, 2));
        assert_eq!(stride_words(2, 3), 2 + 1 + 6);
        assert_eq!(stride_bytes(2, 2), 28);
    }

    #[test]
    fn raw_quad_layout() {
        let mut vb = VertexBuffer::new();
        vb.append_quad(Rect::new(0.0, 0.0, 10.0, 20.0), 0xdead_beef, 1, &[[0.0, 0.0, 0.5, 1.0]], None)
            .unwrap();
        assert_eq!(vb.vertex_count(), 4);
        let stride = stride_words(2, 1);
        assert_eq!(vb.words().len(), stride * 4);

        // Bottom-left vertex.
        let v = &vb.words()[stride..stride * 2];
        assert_eq!((f(v[0]), f(v[1])), (0.0, 20.0));
        assert_eq!(v[2], 0xdead_beef);
        assert_eq!((f(v[3]), f(v[4])), (0.0, 1.0));
        // Padding slot.
        assert_eq!((f(v[5]), f(v[6])), (0.0, 0.0));

        // Top-right vertex.
        let v = &vb.words()[stride * 3..];
        assert_eq!((f(v[0]), f(v[1])), (10.0, 0.0));
        assert_eq!((f(v[3]), f(v[4])), (0.5, 0.0));
    }

    #[test]
    fn transformed_quad_has_three_components() {
        let mut vb = VertexBuffer::new();
        let m = Matrix4::from_translation(100.0, 50.0, 0.0);
        vb.append_quad(Rect::new(0.0, 0.0, 1.0, 1.0), 0, 0, &[], Some(&m)).unwrap();
        let stride = stride_words(3, 0);
        let br = &vb.words()[stride * 2..stride * 3];
        assert_eq!((f(br[0]), f(br[1]), f(br[2])), (101.0, 51.0, 0.0));
    }

    #[test]
    fn missing_tex_coords_use_unit_square() {
        let mut vb = VertexBuffer::new();
        vb.append_quad(Rect::new(0.0, 0.0, 1.0, 1.0), 0, 2, &[], None).unwrap();
        let stride = stride_words(2, 2);
        let br = &vb.words()[stride * 2..stride * 3];
        assert_eq!((f(br[3]), f(br[4]), f(br[5]), f(br[6])), (1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut vb = VertexBuffer::new();
        vb.append_quad(Rect::new(0.0, 0.0, 1.0, 1.0), 0, 0, &[], None).unwrap();
        let cap = vb.words.capacity();
        vb.clear();
        assert!(vb.is_empty());
        assert!(vb.words().is_empty());
        assert_eq!(vb.words.capacity(), cap);
    }
}
