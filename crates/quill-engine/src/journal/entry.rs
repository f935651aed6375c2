use crate::coords::Matrix4;
use crate::material::{MaterialRef, TextureId};

/// One logged quad.
///
/// Geometry lives in the journal's vertex buffer; the entry only carries
/// the state needed to decide batch boundaries. The material handle keeps
/// the material alive (and frozen) until the entry is flushed.
#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub(crate) material: MaterialRef,
    pub(crate) n_layers: u8,
    pub(crate) fallback_layers: u32,
    pub(crate) disable_layers: u32,
    pub(crate) layer0_override: Option<TextureId>,
    /// Set only when software transform is disabled.
    pub(crate) modelview: Option<Matrix4>,
}

impl JournalEntry {
    #[inline]
    pub fn material(&self) -> &MaterialRef {
        &self.material
    }

    #[inline]
    pub fn n_layers(&self) -> usize {
        self.n_layers as usize
    }

    #[inline]
    pub fn fallback_layers(&self) -> u32 {
        self.fallback_layers
    }

    #[inline]
    pub fn disable_layers(&self) -> u32 {
        self.disable_layers
    }

    #[inline]
    pub fn layer0_override(&self) -> Option<TextureId> {
        self.layer0_override
    }

    #[inline]
    pub fn modelview(&self) -> Option<&Matrix4> {
        self.modelview.as_ref()
    }
}
