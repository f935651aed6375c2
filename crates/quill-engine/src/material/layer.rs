use crate::coords::Matrix4;

use super::Texture;

/// How a layer combines with the result of the previous layers.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum CombineMode {
    #[default]
    Modulate,
    Replace,
    Add,
    Interpolate,
}

/// Texture coordinate wrapping.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum WrapMode {
    /// Clamp unless the coordinates leave `[0, 1]`, in which case repeat.
    #[default]
    Automatic,
    ClampToEdge,
    Repeat,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    #[default]
    Linear,
    Nearest,
}

/// One texture unit worth of material state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialLayer {
    pub texture: Option<Texture>,
    pub combine: CombineMode,
    pub wrap: WrapMode,
    pub filter: FilterMode,
    /// User texture matrix. Not compared for batching; any layer carrying
    /// one makes the material incomparable.
    pub matrix: Option<Matrix4>,
}

impl MaterialLayer {
    #[inline]
    pub fn textured(texture: Texture) -> Self {
        Self { texture: Some(texture), ..Self::default() }
    }

    #[inline]
    pub fn with_combine(mut self, combine: CombineMode) -> Self {
        self.combine = combine;
        self
    }

    #[inline]
    pub fn with_wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }

    #[inline]
    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    #[inline]
    pub fn with_matrix(mut self, matrix: Matrix4) -> Self {
        self.matrix = Some(matrix);
        self
    }

    /// Whether sampling outside `[0, 1]` repeats.
    #[inline]
    pub fn repeats(&self, coords_in_unit_range: bool) -> bool {
        match self.wrap {
            WrapMode::Repeat => true,
            WrapMode::Automatic => !coords_in_unit_range,
            WrapMode::ClampToEdge => false,
        }
    }

    /// Shallow state match. `None` when a user matrix makes the layers
    /// incomparable.
    pub(crate) fn shallow_eq(&self, other: &Self) -> Option<bool> {
        if self.matrix.is_some() || other.matrix.is_some() {
            return None;
        }
        Some(
            self.texture.map(|t| t.id) == other.texture.map(|t| t.id)
                && self.combine == other.combine
                && self.wrap == other.wrap
                && self.filter == other.filter,
        )
    }
}
