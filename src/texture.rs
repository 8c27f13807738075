//! Procedural surface textures
//!
//! Small tileable textures generated once per `(liquid type, tile size)`
//! pair and shared by every region of that type, plus one type-agnostic
//! low-frequency noise texture reused by all overlay sprites. The pixel
//! recipes are aesthetic; the hard contract is that every texture tiles
//! seamlessly under repetition and that the types stay visually distinct.

use std::collections::HashMap;
use std::f32::consts::TAU;

use image::{Rgba, RgbaImage};
use noise::{NoiseFn, Perlin, Seedable};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::registry::LiquidType;
use crate::scene::{RenderBackend, TextureId};

/// Side length of the shared overlay noise texture.
pub const NOISE_TEXTURE_SIZE: u32 = 128;

struct CacheEntry {
    image: RgbaImage,
    uploaded: Option<TextureId>,
}

impl CacheEntry {
    fn texture_id(&mut self, backend: &mut dyn RenderBackend) -> TextureId {
        if let Some(id) = self.uploaded {
            id
        } else {
            let id = backend.upload_texture(&self.image);
            self.uploaded = Some(id);
            id
        }
    }
}

/// Cache of procedural surface textures, keyed by `(type, tile size)`.
///
/// Base entries survive rebuilds and are invalidated only when the tile
/// size changes; the noise texture survives even that and is released on
/// system destroy.
pub struct SurfaceTextureCache {
    seed: u64,
    base: HashMap<(LiquidType, u32), CacheEntry>,
    noise: Option<CacheEntry>,
}

impl SurfaceTextureCache {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            base: HashMap::new(),
            noise: None,
        }
    }

    /// Base surface texture for a liquid type, synthesizing and uploading
    /// on first use.
    pub fn base_texture(
        &mut self,
        backend: &mut dyn RenderBackend,
        liquid_type: LiquidType,
        tile_size: u32,
    ) -> TextureId {
        let seed = self.seed;
        let entry = self
            .base
            .entry((liquid_type, tile_size))
            .or_insert_with(|| CacheEntry {
                image: synthesize_surface(liquid_type, tile_size, seed),
                uploaded: None,
            });
        entry.texture_id(backend)
    }

    /// The shared overlay noise texture.
    pub fn noise_texture(&mut self, backend: &mut dyn RenderBackend) -> TextureId {
        let seed = self.seed;
        let entry = self.noise.get_or_insert_with(|| CacheEntry {
            image: synthesize_noise(NOISE_TEXTURE_SIZE, seed),
            uploaded: None,
        });
        entry.texture_id(backend)
    }

    /// Drop all size-dependent base textures (tile size changed). The
    /// noise texture is size-independent and persists.
    pub fn invalidate_base(&mut self, backend: &mut dyn RenderBackend) {
        for (_, entry) in self.base.drain() {
            if let Some(id) = entry.uploaded {
                backend.free_texture(id);
            }
        }
    }

    /// Release everything, including the noise texture.
    pub fn destroy(&mut self, backend: &mut dyn RenderBackend) {
        self.invalidate_base(backend);
        if let Some(entry) = self.noise.take() {
            if let Some(id) = entry.uploaded {
                backend.free_texture(id);
            }
        }
    }

    pub fn cached_base_count(&self) -> usize {
        self.base.len()
    }
}

/// Synthesize the base tile texture for a liquid type.
pub fn synthesize_surface(liquid_type: LiquidType, tile_size: u32, seed: u64) -> RgbaImage {
    let size = tile_size.max(1);
    match liquid_type {
        LiquidType::Water => water_surface(size),
        LiquidType::Lava => lava_surface(size, seed),
        LiquidType::Other => plain_surface(size),
    }
}

/// Water: cool blue body with bright ripple bands. All terms are periodic
/// in both axes so the tile wraps cleanly.
fn water_surface(size: u32) -> RgbaImage {
    let s = size as f32;
    RgbaImage::from_fn(size, size, |x, y| {
        let fx = x as f32 / s;
        let fy = y as f32 / s;

        // Periodic depth shading: light near tile edges, deeper mid-tile.
        let depth = 0.5 - 0.5 * (TAU * fy).cos();
        let r = lerp_u8(36, 14, depth);
        let g = lerp_u8(110, 62, depth);
        let b = lerp_u8(180, 130, depth);

        // Ripple highlight bands drifting with a horizontal wobble.
        let band = (TAU * fy * 3.0 + 1.2 * (TAU * fx).sin()).sin();
        if band > 0.72 {
            let k = (band - 0.72) / 0.28;
            Rgba([
                lighten(r, k * 0.5),
                lighten(g, k * 0.5),
                lighten(b, k * 0.35),
                255,
            ])
        } else {
            Rgba([r, g, b, 255])
        }
    })
}

/// Lava: dark crust with glowing veins and a sprinkling of bright gas
/// bubbles stamped with wrap-around so the tile stays seamless.
fn lava_surface(size: u32, seed: u64) -> RgbaImage {
    let s = size as f32;
    let mut img = RgbaImage::from_fn(size, size, |x, y| {
        let fx = x as f32 / s;
        let fy = y as f32 / s;

        let heat = 0.5 - 0.5 * (TAU * fy).cos();
        let mut r = lerp_u8(70, 150, heat);
        let mut g = lerp_u8(16, 48, heat);
        let b = 10u8;

        // Ridged periodic veins.
        let vein = 1.0 - (TAU * fx * 2.0 + 1.7 * (TAU * fy).sin()).sin().abs();
        let glow = vein * vein * vein;
        r = lighten(r, glow * 0.8);
        g = lighten(g, glow * 0.45);

        Rgba([r, g, b, 255])
    });

    // Bubble speckles.
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(0xB0B5));
    let bubbles = (size / 6).max(2);
    for _ in 0..bubbles {
        let bx = rng.gen_range(0..size);
        let by = rng.gen_range(0..size);
        let radius = rng.gen_range(1..=2) as i32;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                let px = (bx as i32 + dx).rem_euclid(size as i32) as u32;
                let py = (by as i32 + dy).rem_euclid(size as i32) as u32;
                let Rgba([r, g, b, a]) = *img.get_pixel(px, py);
                img.put_pixel(
                    px,
                    py,
                    Rgba([lighten(r, 0.6), lighten(g, 0.5), lighten(b, 0.2), a]),
                );
            }
        }
    }

    img
}

/// Fallback for generic liquid: a desaturated periodic wash.
fn plain_surface(size: u32) -> RgbaImage {
    let s = size as f32;
    RgbaImage::from_fn(size, size, |_, y| {
        let depth = 0.5 - 0.5 * (TAU * y as f32 / s).cos();
        let v = lerp_u8(120, 80, depth);
        Rgba([v, v, lighten(v, 0.1), 255])
    })
}

/// Low-frequency grayscale noise with value-driven alpha; overlays tint it
/// through node alpha. Tileable via four-corner torus blending.
pub fn synthesize_noise(size: u32, seed: u64) -> RgbaImage {
    let perlin = Perlin::new(1).set_seed(seed as u32);
    let period = size as f64;
    RgbaImage::from_fn(size, size, |x, y| {
        let v = tileable_fbm(&perlin, x as f64, y as f64, period);
        let a = (v.clamp(0.0, 1.0) * 255.0) as u8;
        Rgba([255, 255, 255, a])
    })
}

/// Multi-octave fractional Brownian motion.
fn fbm(noise: &impl NoiseFn<f64, 2>, x: f64, y: f64, octaves: u32) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    total / max_value
}

/// Sample fBm on a torus of the given period: the four-corner blend makes
/// `f(0, y) == f(period, y)` (and likewise vertically), so the resulting
/// texture wraps without a seam. Returns a value in `[0, 1]`.
fn tileable_fbm(noise: &impl NoiseFn<f64, 2>, x: f64, y: f64, period: f64) -> f32 {
    const FREQ: f64 = 0.035;
    let sample = |sx: f64, sy: f64| fbm(noise, sx * FREQ, sy * FREQ, 4);

    let fx = x / period;
    let fy = y / period;
    let blended = sample(x, y) * (1.0 - fx) * (1.0 - fy)
        + sample(x - period, y) * fx * (1.0 - fy)
        + sample(x, y - period) * (1.0 - fx) * fy
        + sample(x - period, y - period) * fx * fy;

    (blended as f32 * 0.5 + 0.5).clamp(0.0, 1.0)
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t.clamp(0.0, 1.0)) as u8
}

fn lighten(v: u8, k: f32) -> u8 {
    (v as f32 + (255.0 - v as f32) * k.clamp(0.0, 1.0)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;

    #[test]
    fn noise_blend_wraps_at_period() {
        let perlin = Perlin::new(1).set_seed(77);
        for y in [0.0, 13.0, 100.0] {
            let left = tileable_fbm(&perlin, 0.0, y, 128.0);
            let right = tileable_fbm(&perlin, 128.0, y, 128.0);
            assert!((left - right).abs() < 1e-4, "x seam at y={y}");
        }
        for x in [0.0, 40.0, 127.0] {
            let top = tileable_fbm(&perlin, x, 0.0, 128.0);
            let bottom = tileable_fbm(&perlin, x, 128.0, 128.0);
            assert!((top - bottom).abs() < 1e-4, "y seam at x={x}");
        }
    }

    #[test]
    fn water_and_lava_are_distinguishable() {
        let water = synthesize_surface(LiquidType::Water, 32, 7);
        let lava = synthesize_surface(LiquidType::Lava, 32, 7);

        let avg = |img: &RgbaImage, channel: usize| -> f32 {
            let sum: u64 = img.pixels().map(|p| p[channel] as u64).sum();
            sum as f32 / (img.width() * img.height()) as f32
        };

        assert!(avg(&water, 2) > avg(&water, 0), "water should lean blue");
        assert!(avg(&lava, 0) > avg(&lava, 2), "lava should lean red");
    }

    #[test]
    fn textures_match_requested_size() {
        for size in [8, 16, 48] {
            let img = synthesize_surface(LiquidType::Other, size, 1);
            assert_eq!((img.width(), img.height()), (size, size));
        }
    }

    #[test]
    fn cache_reuses_uploads() {
        let mut scene = SceneGraph::new(4, 4, 0);
        let mut cache = SurfaceTextureCache::new(9);
        let a = cache.base_texture(&mut scene, LiquidType::Water, 16);
        let b = cache.base_texture(&mut scene, LiquidType::Water, 16);
        assert_eq!(a, b);
        assert_eq!(scene.texture_count(), 1);

        // A different tile size is a different entry.
        let c = cache.base_texture(&mut scene, LiquidType::Water, 32);
        assert_ne!(a, c);
        assert_eq!(scene.texture_count(), 2);
    }

    #[test]
    fn invalidate_frees_base_but_keeps_noise() {
        let mut scene = SceneGraph::new(4, 4, 0);
        let mut cache = SurfaceTextureCache::new(9);
        cache.base_texture(&mut scene, LiquidType::Water, 16);
        cache.base_texture(&mut scene, LiquidType::Lava, 16);
        let noise = cache.noise_texture(&mut scene);
        assert_eq!(scene.texture_count(), 3);

        cache.invalidate_base(&mut scene);
        assert_eq!(cache.cached_base_count(), 0);
        assert_eq!(scene.texture_count(), 1);
        assert_eq!(cache.noise_texture(&mut scene), noise);
    }

    #[test]
    fn destroy_releases_everything() {
        let mut scene = SceneGraph::new(4, 4, 0);
        let mut cache = SurfaceTextureCache::new(9);
        cache.base_texture(&mut scene, LiquidType::Water, 16);
        cache.noise_texture(&mut scene);
        cache.destroy(&mut scene);
        assert_eq!(scene.texture_count(), 0);
    }
}
