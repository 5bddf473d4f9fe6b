use crate::TextureError;
use drivescape_common::Color;
use glam::Vec2;

/// Line-end style for strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    /// Stroke stops flat at the segment endpoints.
    #[default]
    Butt,
    /// Stroke is extended by a half-disc at each endpoint.
    Round,
}

/// A color stop of a linear gradient, `offset` in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

impl GradientStop {
    pub const fn new(offset: f32, color: Color) -> Self {
        Self { offset, color }
    }
}

/// CPU drawing surface with RGBA8 pixels in row-major order.
///
/// Coverage is decided by pixel centers, so a shape covers pixel `(x, y)`
/// when the point `(x + 0.5, y + 0.5)` lies inside it. Every paint operation
/// composites source-over.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    /// Allocate a transparent-black surface.
    pub fn new(width: u32, height: u32) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::EmptySurface { width, height });
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or(TextureError::TooLarge { width, height })?;
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len)?;
        pixels.resize(len, 0);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Paint every pixel whose center lies in `[x, x + w) x [y, y + h)`.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        let Some((x0, y0, x1, y1)) = self.pixel_bounds(x, y, x + w, y + h) else {
            return;
        };
        for py in y0..y1 {
            let cy = py as f32 + 0.5;
            if cy < y || cy >= y + h {
                continue;
            }
            for px in x0..x1 {
                let cx = px as f32 + 0.5;
                if cx >= x && cx < x + w {
                    self.blend(px, py, color);
                }
            }
        }
    }

    /// Paint a solid disc.
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        let Some((x0, y0, x1, y1)) =
            self.pixel_bounds(cx - radius, cy - radius, cx + radius, cy + radius)
        else {
            return;
        };
        let r2 = radius * radius;
        for py in y0..y1 {
            let dy = py as f32 + 0.5 - cy;
            for px in x0..x1 {
                let dx = px as f32 + 0.5 - cx;
                if dx * dx + dy * dy <= r2 {
                    self.blend(px, py, color);
                }
            }
        }
    }

    /// Stroke the segment `from -> to` with the given line width.
    pub fn stroke_line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        cap: LineCap,
        color: Color,
    ) {
        let half = width * 0.5;
        let a = Vec2::new(from.0, from.1);
        let b = Vec2::new(to.0, to.1);
        let Some((x0, y0, x1, y1)) = self.pixel_bounds(
            a.x.min(b.x) - half,
            a.y.min(b.y) - half,
            a.x.max(b.x) + half,
            a.y.max(b.y) + half,
        ) else {
            return;
        };
        let ab = b - a;
        let len2 = ab.dot(ab);
        for py in y0..y1 {
            for px in x0..x1 {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let t = if len2 > 0.0 { (p - a).dot(ab) / len2 } else { 0.0 };
                if cap == LineCap::Butt && !(0.0..=1.0).contains(&t) {
                    continue;
                }
                let closest = a + ab * t.clamp(0.0, 1.0);
                if (p - closest).length() <= half {
                    self.blend(px, py, color);
                }
            }
        }
    }

    /// Fill the whole surface with a linear gradient running `from -> to`.
    ///
    /// Points before the start take the first stop, points past the end take
    /// the last. `stops` must be sorted by offset.
    pub fn fill_linear_gradient(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        stops: &[GradientStop],
    ) {
        let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
            return;
        };
        let a = Vec2::new(from.0, from.1);
        let d = Vec2::new(to.0, to.1) - a;
        let len2 = d.dot(d);
        for py in 0..self.height {
            for px in 0..self.width {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let t = if len2 > 0.0 {
                    ((p - a).dot(d) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let color = if t <= first.offset {
                    first.color
                } else if t >= last.offset {
                    last.color
                } else {
                    let i = stops.partition_point(|s| s.offset <= t);
                    let (lo, hi) = (stops[i - 1], stops[i]);
                    let span = hi.offset - lo.offset;
                    let f = if span > 0.0 { (t - lo.offset) / span } else { 1.0 };
                    lo.color.lerp(hi.color, f)
                };
                self.blend(px, py, color);
            }
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Clip a float rectangle to the pixel grid. `None` when nothing is visible.
    fn pixel_bounds(&self, x0: f32, y0: f32, x1: f32, y1: f32) -> Option<(u32, u32, u32, u32)> {
        let clip = |v: f32, max: u32| v.clamp(0.0, max as f32) as u32;
        let (sx, sy) = (clip(x0.floor(), self.width), clip(y0.floor(), self.height));
        let (ex, ey) = (clip(x1.ceil(), self.width), clip(y1.ceil(), self.height));
        (sx < ex && sy < ey).then_some((sx, sy, ex, ey))
    }

    fn blend(&mut self, x: u32, y: u32, color: Color) {
        let i = self.index(x, y);
        let src = color.to_rgba8();
        let sa = src[3] as f32 / 255.0;
        let da = self.pixels[i + 3] as f32 / 255.0;
        for c in 0..3 {
            let s = src[c] as f32;
            let d = self.pixels[i + c] as f32;
            self.pixels[i + c] = (s * sa + d * (1.0 - sa)).round() as u8;
        }
        self.pixels[i + 3] = ((sa + da * (1.0 - sa)) * 255.0).round() as u8;
    }
}
