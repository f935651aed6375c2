//! Material model: blend state plus an ordered list of texture layers.
//!
//! The journal treats a material as opaque apart from two questions:
//! how many layers it has, and whether two materials can share one state
//! flush. The second answer is shallow and may say "no" for
//! materials that would render identically; it never says "yes" for
//! materials that would render differently.

mod layer;
mod texture;

use std::rc::Rc;
use std::sync::Once;

use crate::paint::Color;

pub use layer::{CombineMode, FilterMode, MaterialLayer, WrapMode};
pub use texture::{Texture, TextureId};

/// Shared, immutable-while-shared material handle.
///
/// The journal clones this handle for every pending entry; mutation goes
/// through `RenderContext::edit_material`, which flushes first.
pub type MaterialRef = Rc<Material>;

/// Identity of a user-supplied shader program.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Framebuffer blend equation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Premultiplied source-over.
    #[default]
    SourceOver,
    Additive,
    Multiply,
    /// Blending disabled.
    Replace,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    /// Written per vertex by the journal; never part of the flushed state.
    pub color: Color,
    pub blend: BlendMode,
    pub layers: Vec<MaterialLayer>,
    pub program: Option<ProgramId>,
}

static DEEP_COMPARE_WARNING: Once = Once::new();

impl Material {
    pub fn new() -> Self {
        Self { color: Color::WHITE, ..Self::default() }
    }

    /// Wraps into a shareable handle.
    #[inline]
    pub fn into_ref(self) -> MaterialRef {
        Rc::new(self)
    }

    #[inline]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    #[inline]
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    #[inline]
    pub fn with_layer(mut self, layer: MaterialLayer) -> Self {
        self.layers.push(layer);
        self
    }

    #[inline]
    pub fn with_program(mut self, program: ProgramId) -> Self {
        self.program = Some(program);
        self
    }

    #[inline]
    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    /// Conservative batch equality, ignoring color.
    ///
    /// Layer texture matrices are not compared; a material carrying one is
    /// reported as different from everything but itself (see [`same_batch`]).
    pub fn batch_equivalent(&self, other: &Material) -> bool {
        if self.blend != other.blend
            || self.program != other.program
            || self.layers.len() != other.layers.len()
        {
            return false;
        }

        for (a, b) in self.layers.iter().zip(&other.layers) {
            match a.shallow_eq(b) {
                Some(true) => {}
                Some(false) => return false,
                None => {
                    DEEP_COMPARE_WARNING.call_once(|| {
                        log::warn!(
                            "material comparison with layer matrices is not supported; \
                             treating materials as different"
                        );
                    });
                    return false;
                }
            }
        }
        true
    }
}

/// Handle-level batch equality: identical handles always match, otherwise
/// falls back to [`Material::batch_equivalent`].
#[inline]
pub fn same_batch(a: &MaterialRef, b: &MaterialRef) -> bool {
    Rc::ptr_eq(a, b) || a.batch_equivalent(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Matrix4;

    fn tex(id: u32) -> Texture {
        Texture::new(TextureId(id), 64, 64)
    }

    #[test]
    fn color_does_not_split_batches() {
        let a = Material::new().with_color(Color::WHITE);
        let b = Material::new().with_color(Color::TRANSPARENT);
        assert!(a.batch_equivalent(&b));
    }

    #[test]
    fn different_texture_splits() {
        let a = Material::new().with_layer(MaterialLayer::textured(tex(1)));
        let b = Material::new().with_layer(MaterialLayer::textured(tex(2)));
        assert!(!a.batch_equivalent(&b));
    }

    #[test]
    fn combine_and_blend_are_compared() {
        let base = Material::new().with_layer(MaterialLayer::textured(tex(1)));
        let add = Material::new()
            .with_layer(MaterialLayer::textured(tex(1)).with_combine(CombineMode::Add));
        assert!(!base.batch_equivalent(&add));
        assert!(!base.batch_equivalent(&base.clone().with_blend(BlendMode::Additive)));
    }

    #[test]
    fn layer_matrix_is_conservatively_unequal() {
        let layer = MaterialLayer::textured(tex(1)).with_matrix(Matrix4::IDENTITY);
        let a = Material::new().with_layer(layer.clone()).into_ref();
        let b = Material::new().with_layer(layer).into_ref();
        assert!(!same_batch(&a, &b));
        assert!(same_batch(&a, &a.clone()));
    }

    #[test]
    fn program_identity_is_compared() {
        let a = Material::new().with_program(ProgramId(1));
        let b = Material::new().with_program(ProgramId(2));
        assert!(!a.batch_equivalent(&b));
        assert!(a.batch_equivalent(&a.clone()));
    }
}
