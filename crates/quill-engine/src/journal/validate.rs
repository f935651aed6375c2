use crate::material::Material;

/// Per-quad layer overrides derived from a material and its coordinates.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LayerPlan {
    pub n_layers: usize,
    pub fallback_layers: u32,
    pub disable_layers: u32,
}

/// Checks material layers against what a single batched draw can express.
///
/// Offending layers are not rejected: they are disabled or swapped for a
/// transparent placeholder, and each kind of problem is reported once.
#[derive(Debug, Default)]
pub struct LayerValidator {
    warned_units: bool,
    warned_sliced: bool,
    warned_waste: bool,
}

impl LayerValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(&mut self, material: &Material, tex_coords: &[[f32; 4]], layer_limit: usize) -> LayerPlan {
        let total = material.n_layers().min(32);
        let n_layers = total.min(layer_limit);
        let mut plan = LayerPlan { n_layers, ..LayerPlan::default() };

        if total > n_layers {
            for i in n_layers..total {
                plan.disable_layers |= 1 << i;
            }
            if !self.warned_units {
                log::warn!(
                    "material uses {total} layers but only {layer_limit} texture units are available; \
                     extra layers are disabled"
                );
                self.warned_units = true;
            }
        }

        for (i, layer) in material.layers.iter().take(n_layers).enumerate() {
            let Some(texture) = layer.texture else { continue };

            if texture.is_sliced() && n_layers > 1 {
                if !self.warned_sliced {
                    log::warn!(
                        "sliced texture on layer {i} of a multi-layer material is not supported; \
                         using a transparent fallback"
                    );
                    self.warned_sliced = true;
                }
                plan.fallback_layers |= 1 << i;
                continue;
            }

            let coords = tex_coords.get(i).copied().unwrap_or(super::DEFAULT_TEX_COORDS);
            let in_unit_range = coords.iter().all(|c| (0.0..=1.0).contains(c));
            if texture.has_waste && !in_unit_range && layer.repeats(in_unit_range) {
                if !self.warned_waste {
                    log::warn!(
                        "layer {i}: repeating a texture with padding waste is not supported; \
                         using a transparent fallback"
                    );
                    self.warned_waste = true;
                }
                plan.fallback_layers |= 1 << i;
            }
        }

        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{MaterialLayer, Texture, TextureId, WrapMode};

    fn tex(id: u32) -> Texture {
        Texture::new(TextureId(id), 32, 32)
    }

    #[test]
    fn plain_layers_pass_through() {
        let m = Material::new()
            .with_layer(MaterialLayer::textured(tex(1)))
            .with_layer(MaterialLayer::textured(tex(2)));
        let plan = LayerValidator::new().plan(&m, &[], 8);
        assert_eq!(plan, LayerPlan { n_layers: 2, fallback_layers: 0, disable_layers: 0 });
    }

    #[test]
    fn excess_layers_are_disabled() {
        let mut m = Material::new();
        for i in 0..4 {
            m = m.with_layer(MaterialLayer::textured(tex(i)));
        }
        let plan = LayerValidator::new().plan(&m, &[], 2);
        assert_eq!(plan.n_layers, 2);
        assert_eq!(plan.disable_layers, 0b1100);
    }

    #[test]
    fn sliced_texture_only_falls_back_with_several_layers() {
        let sliced = MaterialLayer::textured(tex(1).with_slices(4));
        let single = Material::new().with_layer(sliced.clone());
        assert_eq!(LayerValidator::new().plan(&single, &[], 8).fallback_layers, 0);

        let multi = Material::new()
            .with_layer(MaterialLayer::textured(tex(2)))
            .with_layer(sliced);
        assert_eq!(LayerValidator::new().plan(&multi, &[], 8).fallback_layers, 0b10);
    }

    #[test]
    fn waste_with_repeat_falls_back() {
        let layer = MaterialLayer::textured(tex(1).with_waste());
        let m = Material::new().with_layer(layer.clone());
        let mut v = LayerValidator::new();

        // Automatic wrap within the unit square clamps: fine.
        assert_eq!(v.plan(&m, &[[0.0, 0.0, 1.0, 1.0]], 8).fallback_layers, 0);
        // Leaving the unit square repeats.
        assert_eq!(v.plan(&m, &[[0.0, 0.0, 2.0, 2.0]], 8).fallback_layers, 1);

        let clamped = Material::new().with_layer(layer.clone().with_wrap(WrapMode::ClampToEdge));
        assert_eq!(v.plan(&clamped, &[[0.0, 0.0, 2.0, 2.0]], 8).fallback_layers, 0);

        // Explicit repeat only matters once the coordinates leave the unit square.
        let repeat = Material::new().with_layer(layer.with_wrap(WrapMode::Repeat));
        assert_eq!(v.plan(&repeat, &[[0.0, 0.0, 1.0, 1.0]], 8).fallback_layers, 0);
        assert_eq!(v.plan(&repeat, &[[-1.0, 0.0, 1.0, 1.0]], 8).fallback_layers, 1);
    }
}
