use crate::TextureError;
use crate::canvas::{Canvas, GradientStop, LineCap};
use drivescape_common::Color;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

/// Addressing mode used when sampling outside `0..1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    Clamp,
    Repeat,
}

/// Which of the four generated textures a material samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureSlot {
    Body,
    Ground,
    Tread,
    Metal,
}

impl TextureSlot {
    pub const ALL: [Self; 4] = [Self::Body, Self::Ground, Self::Tread, Self::Metal];
}

/// A finished RGBA8 raster plus its sampling parameters.
#[derive(Debug, Clone)]
pub struct Texture {
    pub slot: TextureSlot,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub wrap: Wrap,
    /// UV multiplier applied by materials using this texture.
    pub repeat: [f32; 2],
}

impl Texture {
    fn from_canvas(slot: TextureSlot, canvas: Canvas, wrap: Wrap, repeat: [f32; 2]) -> Self {
        Self {
            slot,
            width: canvas.width(),
            height: canvas.height(),
            pixels: canvas.into_pixels(),
            wrap,
            repeat,
        }
    }

    /// SHA-256 of the pixel data, as lowercase hex.
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(&self.pixels))
    }
}

/// The four textures consumed by the scene builder.
#[derive(Debug, Clone)]
pub struct TextureSet {
    pub body: Texture,
    pub ground: Texture,
    pub tread: Texture,
    pub metal: Texture,
}

impl TextureSet {
    pub fn get(&self, slot: TextureSlot) -> &Texture {
        match slot {
            TextureSlot::Body => &self.body,
            TextureSlot::Ground => &self.ground,
            TextureSlot::Tread => &self.tread,
            TextureSlot::Metal => &self.metal,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Texture> {
        TextureSlot::ALL.into_iter().map(|slot| self.get(slot))
    }
}

const BODY_SIZE: u32 = 512;
const GROUND_SIZE: u32 = 512;
const TREAD_SIZE: u32 = 256;
const METAL_SIZE: u32 = 256;

/// How many times the ground texture tiles across the ground plane.
pub const GROUND_REPEAT: f32 = 15.0;

/// Procedural texture generator.
///
/// All randomness is drawn from the wrapped generator, so a seeded generator
/// yields reproducible textures.
pub struct TextureSynth<R> {
    rng: R,
}

impl TextureSynth<StdRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> TextureSynth<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generate all four textures.
    pub fn generate_all(&mut self) -> Result<TextureSet, TextureError> {
        let set = TextureSet {
            body: self.body()?,
            ground: self.ground()?,
            tread: self.tread()?,
            metal: self.metal()?,
        };
        tracing::info!("procedural textures generated");
        Ok(set)
    }

    pub fn generate(&mut self, slot: TextureSlot) -> Result<Texture, TextureError> {
        match slot {
            TextureSlot::Body => self.body(),
            TextureSlot::Ground => self.ground(),
            TextureSlot::Tread => self.tread(),
            TextureSlot::Metal => self.metal(),
        }
    }

    /// Red metallic paint: a diagonal gradient with soft highlights.
    pub fn body(&mut self) -> Result<Texture, TextureError> {
        let size = BODY_SIZE as f32;
        let mut canvas = Canvas::new(BODY_SIZE, BODY_SIZE)?;
        canvas.fill_linear_gradient(
            (0.0, 0.0),
            (size, size),
            &[
                GradientStop::new(0.0, Color::hex(0xff3333)),
                GradientStop::new(0.5, Color::hex(0xcc0000)),
                GradientStop::new(1.0, Color::hex(0xff3333)),
            ],
        );
        for _ in 0..80 {
            let alpha = self.rng.random::<f32>() * 0.15 + 0.05;
            let x = self.rng.random::<f32>() * size;
            let y = self.rng.random::<f32>() * size;
            let radius = self.rng.random::<f32>() * 15.0 + 3.0;
            canvas.fill_circle(x, y, radius, Color::WHITE.with_alpha(alpha));
        }
        Ok(Texture::from_canvas(
            TextureSlot::Body,
            canvas,
            Wrap::Clamp,
            [1.0, 1.0],
        ))
    }

    /// Soil with lighter clods and grass blades; tiles over the ground plane.
    pub fn ground(&mut self) -> Result<Texture, TextureError> {
        const TONES: [Color; 3] = [
            Color::hex(0x6d4c41),
            Color::hex(0x795548),
            Color::hex(0x8d6e63),
        ];
        let size = GROUND_SIZE as f32;
        let mut canvas = Canvas::new(GROUND_SIZE, GROUND_SIZE)?;
        canvas.fill_rect(0.0, 0.0, size, size, Color::hex(0x5d4037));

        for _ in 0..2000 {
            let x = self.rng.random::<f32>() * size;
            let y = self.rng.random::<f32>() * size;
            let radius = self.rng.random::<f32>() * 15.0 + 3.0;
            let tone = TONES[self.rng.random_range(0..TONES.len())];
            canvas.fill_circle(x, y, radius, tone);
        }

        let grass = Color::hex(0x388e3c);
        for _ in 0..3000 {
            let x = self.rng.random::<f32>() * size;
            let y = self.rng.random::<f32>() * size;
            let w = self.rng.random::<f32>() * 2.0 + 1.0;
            let h = self.rng.random::<f32>() * 12.0 + 4.0;
            canvas.fill_rect(x, y, w, h, grass);
        }

        Ok(Texture::from_canvas(
            TextureSlot::Ground,
            canvas,
            Wrap::Repeat,
            [GROUND_REPEAT, GROUND_REPEAT],
        ))
    }

    /// Black rubber with a diagonal and horizontal tread pattern.
    pub fn tread(&mut self) -> Result<Texture, TextureError> {
        let size = TREAD_SIZE as f32;
        let mut canvas = Canvas::new(TREAD_SIZE, TREAD_SIZE)?;
        canvas.fill_rect(0.0, 0.0, size, size, Color::hex(0x1a1a1a));

        let diagonal = Color::hex(0x333333);
        let mut i = -(TREAD_SIZE as i32);
        while i < 2 * TREAD_SIZE as i32 {
            let x = i as f32;
            canvas.stroke_line((x, 0.0), (x + size, size), 4.0, LineCap::Round, diagonal);
            i += 25;
        }

        let horizontal = Color::hex(0x444444);
        for y in (0..TREAD_SIZE).step_by(30) {
            let y = y as f32;
            canvas.stroke_line((0.0, y), (size, y), 2.0, LineCap::Round, horizontal);
        }

        Ok(Texture::from_canvas(
            TextureSlot::Tread,
            canvas,
            Wrap::Repeat,
            [1.0, 1.0],
        ))
    }

    /// Brushed metal: a horizontal gradient with fine vertical streaks.
    pub fn metal(&mut self) -> Result<Texture, TextureError> {
        let size = METAL_SIZE as f32;
        let mut canvas = Canvas::new(METAL_SIZE, METAL_SIZE)?;
        canvas.fill_linear_gradient(
            (0.0, 0.0),
            (size, 0.0),
            &[
                GradientStop::new(0.0, Color::hex(0x666666)),
                GradientStop::new(0.5, Color::hex(0x999999)),
                GradientStop::new(1.0, Color::hex(0x666666)),
            ],
        );
        let streak = Color::WHITE.with_alpha(0.2);
        for x in (0..METAL_SIZE).step_by(8) {
            let x = x as f32;
            canvas.stroke_line((x, 0.0), (x, size), 1.0, LineCap::Butt, streak);
        }
        Ok(Texture::from_canvas(
            TextureSlot::Metal,
            canvas,
            Wrap::Clamp,
            [1.0, 1.0],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_four_textures_at_fixed_sizes() {
        let set = TextureSynth::from_seed(1).generate_all().unwrap();
        let sizes: Vec<_> = set.iter().map(|t| (t.slot, t.width, t.height)).collect();
        assert_eq!(
            sizes,
            vec![
                (TextureSlot::Body, 512, 512),
                (TextureSlot::Ground, 512, 512),
                (TextureSlot::Tread, 256, 256),
                (TextureSlot::Metal, 256, 256),
            ]
        );
        for t in set.iter() {
            assert_eq!(t.pixels.len(), (t.width * t.height * 4) as usize);
        }
    }

    #[test]
    fn same_seed_regenerates_identically() {
        let a = TextureSynth::from_seed(7).ground().unwrap();
        let b = TextureSynth::from_seed(7).ground().unwrap();
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn different_seeds_vary() {
        let a = TextureSynth::from_seed(1).body().unwrap();
        let b = TextureSynth::from_seed(2).body().unwrap();
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn deterministic_textures_ignore_the_rng() {
        let a = TextureSynth::from_seed(1).metal().unwrap();
        let b = TextureSynth::from_seed(99).metal().unwrap();
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn ground_tiles_and_is_opaque() {
        let ground = TextureSynth::from_seed(3).ground().unwrap();
        assert_eq!(ground.wrap, Wrap::Repeat);
        assert_eq!(ground.repeat, [GROUND_REPEAT, GROUND_REPEAT]);
        assert!(ground.pixels.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn metal_streaks_are_lighter_than_gaps() {
        let metal = TextureSynth::from_seed(0).metal().unwrap();
        let at = |x: u32| metal.pixels[(x * 4) as usize];
        // Streak at x = 8 straddles columns 7 and 8; column 12 sits between streaks.
        assert!(at(8) > at(12));
    }

    #[test]
    fn tread_base_shows_between_strokes() {
        let tread = TextureSynth::from_seed(0).tread().unwrap();
        let px = |x: u32, y: u32| {
            let i = ((y * tread.width + x) * 4) as usize;
            [tread.pixels[i], tread.pixels[i + 1], tread.pixels[i + 2]]
        };
        // On the horizontal stroke at y = 0.
        assert_eq!(px(12, 0), [0x44, 0x44, 0x44]);
        // Far from any stroke: diagonals run along x - y = 25k - 6, horizontals every 30 rows.
        assert_eq!(px(12, 15), [0x1a, 0x1a, 0x1a]);
    }
}
