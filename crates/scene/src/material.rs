use drivescape_common::Color;
use drivescape_textures::TextureSlot;

/// Lighting model a material is shaded with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    /// Diffuse only.
    Lambert,
    /// Diffuse plus a specular highlight.
    Phong { shininess: f32, specular: Color },
    /// Flat color, ignores lights. Used for line overlays.
    Unlit,
}

/// Surface appearance of a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Base color; multiplies the texture when one is mapped.
    pub color: Color,
    pub shading: Shading,
    pub map: Option<TextureSlot>,
    pub uv_repeat: [f32; 2],
    pub emissive: Color,
    pub emissive_intensity: f32,
    pub opacity: f32,
    /// Rendered into the sun's shadow map.
    pub cast_shadow: bool,
    /// Darkened where the sun's shadow map is occluded.
    pub receive_shadow: bool,
}

/// Specular color used when a Phong material does not set one.
pub const DEFAULT_SPECULAR: Color = Color::hex(0x111111);

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            shading: Shading::Lambert,
            map: None,
            uv_repeat: [1.0, 1.0],
            emissive: Color::BLACK,
            emissive_intensity: 1.0,
            opacity: 1.0,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

impl Material {
    pub fn lambert(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    pub fn phong(color: Color, shininess: f32) -> Self {
        Self {
            color,
            shading: Shading::Phong {
                shininess,
                specular: DEFAULT_SPECULAR,
            },
            ..Self::default()
        }
    }

    pub fn unlit(color: Color) -> Self {
        Self {
            color,
            shading: Shading::Unlit,
            ..Self::default()
        }
    }

    /// Sample `slot`, tiling it `repeat` times across the UV range.
    pub fn with_map(mut self, slot: TextureSlot, repeat: [f32; 2]) -> Self {
        self.map = Some(slot);
        self.uv_repeat = repeat;
        self
    }

    /// Override the specular color. No effect on non-Phong materials.
    pub fn with_specular(mut self, color: Color) -> Self {
        if let Shading::Phong { specular, .. } = &mut self.shading {
            *specular = color;
        }
        self
    }

    pub fn with_emissive(mut self, color: Color, intensity: f32) -> Self {
        self.emissive = color;
        self.emissive_intensity = intensity;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }

    /// Translucent materials are drawn after opaque ones, with blending.
    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specular_only_applies_to_phong() {
        let lambert = Material::lambert(Color::WHITE).with_specular(Color::BLACK);
        assert_eq!(lambert.shading, Shading::Lambert);
        let phong = Material::phong(Color::WHITE, 30.0).with_specular(Color::hex(0x333333));
        assert_eq!(
            phong.shading,
            Shading::Phong {
                shininess: 30.0,
                specular: Color::hex(0x333333)
            }
        );
    }

    #[test]
    fn shadows_are_opt_in() {
        let plain = Material::lambert(Color::WHITE);
        assert!(!plain.cast_shadow && !plain.receive_shadow);
        let ground = plain.with_shadows(false, true);
        assert!(!ground.cast_shadow && ground.receive_shadow);
    }

    #[test]
    fn opacity_marks_transparency() {
        assert!(!Material::default().is_transparent());
        assert!(Material::default().with_opacity(0.6).is_transparent());
    }
}
