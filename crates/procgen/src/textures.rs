//! Procedural bark textures painted into CPU pixel buffers.
//!
//! The painter mirrors a small 2D canvas: filled rectangles, stroked lines and filled
//! circles are alpha-blended over a gradient or flat base, with coverage computed
//! against pixel centres.

use anyhow::{anyhow, Result};
use glam::{Vec2, Vec3};
use noise::{NoiseFn, Perlin};
use rand::prelude::*;
use std::path::Path;

pub const BARK_COLOR_SIZE: u32 = 512;
pub const BARK_BUMP_SIZE: u32 = 256;

/// `0xRRGGBB` to linear-ish float RGB in [0, 1].
pub fn hex_rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// RGBA pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: (r.clamp(0.0, 1.0) * 255.0).round() as u8,
            g: (g.clamp(0.0, 1.0) * 255.0).round() as u8,
            b: (b.clamp(0.0, 1.0) * 255.0).round() as u8,
            a: 255,
        }
    }

    pub fn grey(level: u8) -> Self {
        Self::new(level, level, level, 255)
    }

    pub fn to_rgb(self) -> Vec3 {
        Vec3::new(self.r as f32, self.g as f32, self.b as f32) / 255.0
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Source-over blend of `color` at `alpha` onto this opaque pixel.
    pub fn blend(self, color: Vec3, alpha: f32) -> Self {
        let a = alpha.clamp(0.0, 1.0);
        let c = self.to_rgb() * (1.0 - a) + color * a;
        Self::from_rgb(c.x, c.y, c.z)
    }
}

/// Generated texture data
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Pixel>,
}

impl TextureData {
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Pixel::new(0, 0, 0, 255))
    }

    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Self {
        Self {
            width,
            height,
            pixels: vec![pixel; (width * height) as usize],
        }
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = pixel;
        }
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Pixel {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize]
        } else {
            Pixel::new(0, 0, 0, 255)
        }
    }

    /// Wrapping lookup, matching a repeat-wrapped texture.
    pub fn sample(&self, u: f32, v: f32) -> Pixel {
        let x = ((u.fract() + 1.0).fract() * self.width as f32) as u32 % self.width;
        let y = ((v.fract() + 1.0).fract() * self.height as f32) as u32 % self.height;
        self.get_pixel(x, y)
    }

    fn blend_pixel(&mut self, x: i64, y: i64, color: Vec3, alpha: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 || alpha <= 0.0 {
            return;
        }
        let i = (y as u32 * self.width + x as u32) as usize;
        self.pixels[i] = self.pixels[i].blend(color, alpha);
    }

    /// Fill pixels whose centres fall inside the rectangle; clipped to the canvas.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Vec3, alpha: f32) {
        let x0 = (x - 0.5).ceil().max(0.0) as i64;
        let y0 = (y - 0.5).ceil().max(0.0) as i64;
        let x1 = (x + w - 0.5).ceil().min(self.width as f32) as i64;
        let y1 = (y + h - 0.5).ceil().min(self.height as f32) as i64;
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px, py, color, alpha);
            }
        }
    }

    /// Stroke a line segment with anti-aliased coverage.
    pub fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Vec3, alpha: f32) {
        let half = width * 0.5;
        let pad = half + 1.0;
        let min = from.min(to) - Vec2::splat(pad);
        let max = from.max(to) + Vec2::splat(pad);
        let seg = to - from;
        let len_sq = seg.length_squared();
        for py in min.y.floor() as i64..=max.y.ceil() as i64 {
            for px in min.x.floor() as i64..=max.x.ceil() as i64 {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let t = if len_sq > 0.0 { ((p - from).dot(seg) / len_sq).clamp(0.0, 1.0) } else { 0.0 };
                let dist = p.distance(from + seg * t);
                let coverage = (half + 0.5 - dist).clamp(0.0, 1.0);
                self.blend_pixel(px, py, color, alpha * coverage);
            }
        }
    }

    /// Fill a disc with anti-aliased edge.
    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Vec3, alpha: f32) {
        for py in (center.y - radius - 1.0).floor() as i64..=(center.y + radius + 1.0).ceil() as i64 {
            for px in (center.x - radius - 1.0).floor() as i64..=(center.x + radius + 1.0).ceil() as i64 {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let coverage = (radius + 0.5 - p.distance(center)).clamp(0.0, 1.0);
                self.blend_pixel(px, py, color, alpha * coverage);
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            bytes.extend_from_slice(&pixel.to_bytes());
        }
        bytes
    }

    pub fn to_image(&self) -> Result<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.to_bytes())
            .ok_or_else(|| anyhow!("pixel buffer does not match {}x{}", self.width, self.height))
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.to_image()?.save_with_format(path, image::ImageFormat::Png)?;
        log::info!("Wrote {}x{} texture to {}", self.width, self.height, path.display());
        Ok(())
    }

    /// Mean colour over every pixel.
    pub fn average_rgb(&self) -> Vec3 {
        if self.pixels.is_empty() {
            return Vec3::ZERO;
        }
        self.pixels.iter().map(|p| p.to_rgb()).sum::<Vec3>() / self.pixels.len() as f32
    }
}

/// Colour and bump maps shared by trunk and roots.
#[derive(Debug, Clone)]
pub struct BarkTextures {
    pub color: TextureData,
    pub bump: TextureData,
}

/// Diagonal gradient stops for the bark base colour.
const BARK_GRADIENT: [(f32, u32); 4] = [(0.0, 0x3d2817), (0.3, 0x2d1f12), (0.6, 0x4a3520), (1.0, 0x2a1810)];

/// Procedural bark painter
pub struct BarkTextureGenerator {
    perlin: Perlin,
    rng: StdRng,
}

impl BarkTextureGenerator {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            perlin: Perlin::new(rng.gen()),
            rng,
        }
    }

    pub fn generate(&mut self) -> BarkTextures {
        BarkTextures {
            color: self.color_map(BARK_COLOR_SIZE),
            bump: self.bump_map(BARK_BUMP_SIZE),
        }
    }

    /// Gradient base, dark vertical streaks, thin crack strokes and soft highlights.
    pub fn color_map(&mut self, size: u32) -> TextureData {
        let mut tex = TextureData::new(size, size);
        let s = size as f32;
        for y in 0..size {
            for x in 0..size {
                // Projection onto the (0,0)→(s,s) diagonal.
                let t = (x as f32 + 0.5 + y as f32 + 0.5) / (2.0 * s);
                let c = gradient(&BARK_GRADIENT, t);
                tex.set_pixel(x, y, Pixel::from_rgb(c.x, c.y, c.z));
            }
        }

        let scale = s / 512.0;
        let rng = &mut self.rng;
        for _ in 0..80 {
            let x = rng.gen::<f32>() * s;
            let w = (2.0 + rng.gen::<f32>() * 6.0) * scale;
            let h = (100.0 + rng.gen::<f32>() * 400.0) * scale;
            let y = rng.gen::<f32>() * s;
            let color = Vec3::new(
                20.0 + rng.gen::<f32>() * 30.0,
                15.0 + rng.gen::<f32>() * 20.0,
                10.0 + rng.gen::<f32>() * 15.0,
            ) / 255.0;
            let alpha = 0.3 + rng.gen::<f32>() * 0.4;
            tex.fill_rect(x, y, w, h, color, alpha);
        }

        for _ in 0..120 {
            let from = Vec2::new(rng.gen::<f32>() * s, rng.gen::<f32>() * s);
            let to = from + Vec2::new((rng.gen::<f32>() - 0.5) * 30.0, rng.gen::<f32>() * 60.0) * scale;
            let alpha = 0.1 + rng.gen::<f32>() * 0.2;
            let width = 0.5 + rng.gen::<f32>() * 1.5;
            tex.stroke_line(from, to, width, Vec3::ZERO, alpha);
        }

        let highlight = Vec3::new(80.0, 60.0, 40.0) / 255.0;
        for _ in 0..40 {
            let center = Vec2::new(rng.gen::<f32>() * s, rng.gen::<f32>() * s);
            let radius = (2.0 + rng.gen::<f32>() * 8.0) * scale;
            let alpha = 0.1 + rng.gen::<f32>() * 0.15;
            tex.fill_circle(center, radius, highlight, alpha);
        }

        tex
    }

    /// Grey base, full-height ridges, dark cracks, then Perlin grain over everything.
    pub fn bump_map(&mut self, size: u32) -> TextureData {
        let mut tex = TextureData::filled(size, size, Pixel::grey(0x80));
        let s = size as f32;
        let scale = s / 256.0;

        for _ in 0..50 {
            let x = self.rng.gen::<f32>() * s;
            let w = (3.0 + self.rng.gen::<f32>() * 8.0) * scale;
            let c = self.grey_between(100.0, 180.0);
            tex.fill_rect(x, 0.0, w, s, c, 1.0);
        }

        for _ in 0..30 {
            let from = Vec2::new(self.rng.gen::<f32>() * s, self.rng.gen::<f32>() * s);
            let to = from + Vec2::new((self.rng.gen::<f32>() - 0.5) * 20.0, self.rng.gen::<f32>() * 50.0) * scale;
            let c = self.grey_between(40.0, 80.0);
            let width = 1.0 + self.rng.gen::<f32>() * 2.0;
            tex.stroke_line(from, to, width, c, 1.0);
        }

        for y in 0..size {
            for x in 0..size {
                let u = x as f64 / size as f64;
                let v = y as f64 / size as f64;
                // Stretched vertically so the grain runs with the ridges.
                let grain = (self.fbm(u * 12.0, v * 3.0, 4) - 0.5) as f32 * 0.12;
                let p = tex.get_pixel(x, y).to_rgb() + Vec3::splat(grain);
                tex.set_pixel(x, y, Pixel::from_rgb(p.x, p.y, p.z));
            }
        }

        tex
    }

    /// Independent random channels, as the ridges are painted with per-channel jitter.
    fn grey_between(&mut self, lo: f32, hi: f32) -> Vec3 {
        let span = hi - lo;
        Vec3::new(
            lo + self.rng.gen::<f32>() * span,
            lo + self.rng.gen::<f32>() * span,
            lo + self.rng.gen::<f32>() * span,
        ) / 255.0
    }

    fn fbm(&self, x: f64, y: f64, octaves: u32) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 0.5;
        let mut frequency = 1.0;

        for _ in 0..octaves {
            value += amplitude * (self.perlin.get([x * frequency, y * frequency]) * 0.5 + 0.5);
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        value
    }
}

fn gradient(stops: &[(f32, u32)], t: f32) -> Vec3 {
    let t = t.clamp(0.0, 1.0);
    let mut prev = stops[0];
    for &stop in stops {
        if t <= stop.0 {
            let span = stop.0 - prev.0;
            let f = if span > 0.0 { (t - prev.0) / span } else { 0.0 };
            return hex_rgb(prev.1).lerp(hex_rgb(stop.1), f);
        }
        prev = stop;
    }
    hex_rgb(prev.1)
}
