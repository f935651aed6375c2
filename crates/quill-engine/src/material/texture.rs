/// Opaque texture identity as understood by the backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// What the journal needs to know about a texture.
///
/// Loading, uploading and slicing happen elsewhere; this is only the
/// description used to validate layers at log time.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Texture {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
    /// Number of backing GPU textures. More than one means the texture was
    /// split to fit hardware limits and cannot be sampled as a single unit.
    pub slices: u32,
    /// The backing storage is larger than `width × height` (padded to a
    /// power of two), so repeating texture coordinates would sample padding.
    pub has_waste: bool,
}

impl Texture {
    #[inline]
    pub const fn new(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height, slices: 1, has_waste: false }
    }

    #[inline]
    pub fn with_slices(mut self, slices: u32) -> Self {
        self.slices = slices;
        self
    }

    #[inline]
    pub fn with_waste(mut self) -> Self {
        self.has_waste = true;
        self
    }

    #[inline]
    pub const fn is_sliced(&self) -> bool {
        self.slices > 1
    }
}
