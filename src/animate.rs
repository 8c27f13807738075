//! Per-frame surface animation and the wave model
//!
//! Advances each region's tiling drift, alpha breathing, overlay
//! desynchronization, and (for water) the rim highlight with its
//! wave-influenced vertical displacement. The drift vectors and rates are
//! fixed aesthetic constants, not gameplay state.

use std::f32::consts::TAU;

use crate::boundary::Span;
use crate::region::LiquidRegion;
use crate::registry::LiquidType;
use crate::scene::{Rect, RenderBackend};

/// Waves fade out completely after this long.
pub const WAVE_LIFETIME_MS: f32 = 900.0;
/// Hard cap on injected wave strength, in pixels of rim displacement.
pub const WAVE_MAX_STRENGTH: f32 = 12.0;
/// Horizontal reach of a wave, in tile widths.
pub const WAVE_FALLOFF_TILES: f32 = 3.0;

/// Rim highlight color (translucent white).
pub const RIM_COLOR: [u8; 4] = [255, 255, 255, 150];
/// Lava holds this alpha instead of breathing.
pub const LAVA_ALPHA: f32 = 0.96;

const RIM_THICKNESS: f32 = 2.0;
// Ambient rim motion: radians per millisecond and per pixel of x, so
// adjacent spans stay phase-continuous.
const RIM_WAVE_RATE: f32 = 0.0035;
const RIM_WAVE_PHASE_X: f32 = 0.045;
const RIM_WAVE_AMP: f32 = 1.6;

// Water alpha breathing.
const WATER_ALPHA_BASE: f32 = 0.80;
const WATER_ALPHA_SWING: f32 = 0.06;
const WATER_ALPHA_RATE: f32 = 0.0009;

// Drift vectors in pixels per millisecond.
const WATER_DRIFT: (f32, f32) = (0.012, 0.0);
const LAVA_DRIFT: (f32, f32) = (-0.004, 0.002);
const OTHER_DRIFT: (f32, f32) = (0.006, 0.0);

// The two overlays run at different multiples of the base drift so they
// slide apart over time.
const OVERLAY_A_RATE: f32 = 1.7;
const OVERLAY_B_RATE: f32 = -0.6;

fn drift(liquid_type: LiquidType) -> (f32, f32) {
    match liquid_type {
        LiquidType::Water => WATER_DRIFT,
        LiquidType::Lava => LAVA_DRIFT,
        LiquidType::Other => OTHER_DRIFT,
    }
}

/// One transient surface disturbance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wave {
    pub origin_x: f32,
    pub strength: f32,
    pub age_ms: f32,
}

impl Wave {
    pub fn new(origin_x: f32, strength: f32) -> Self {
        Self {
            origin_x,
            strength: strength.clamp(0.0, WAVE_MAX_STRENGTH),
            age_ms: 0.0,
        }
    }

    pub fn expired(&self) -> bool {
        self.age_ms >= WAVE_LIFETIME_MS
    }

    /// Displacement this wave contributes at horizontal position `x`.
    /// Linear decay over the lifetime, linear falloff over `falloff_px`.
    pub fn contribution(&self, x: f32, falloff_px: f32) -> f32 {
        let decay = (1.0 - self.age_ms / WAVE_LIFETIME_MS).max(0.0);
        let falloff = (1.0 - (x - self.origin_x).abs() / falloff_px).max(0.0);
        self.strength * decay * falloff
    }
}

/// Total rim displacement at `x`: ambient sinusoid plus all live waves.
pub fn rim_displacement(clock_ms: f32, x: f32, waves: &[Wave], falloff_px: f32) -> f32 {
    let ambient = (clock_ms * RIM_WAVE_RATE + x * RIM_WAVE_PHASE_X).sin() * RIM_WAVE_AMP;
    let disturbed: f32 = waves.iter().map(|w| w.contribution(x, falloff_px)).sum();
    ambient + disturbed
}

/// Rim highlight rectangles for a span list. Long spans are subdivided at
/// tile granularity so wave falloff stays locally visible instead of
/// shifting a whole span as one slab.
pub fn rim_rects(spans: &[Span], clock_ms: f32, waves: &[Wave], tile_size: u32) -> Vec<Rect> {
    let ts = tile_size as f32;
    let falloff_px = WAVE_FALLOFF_TILES * ts;
    let mut rects = Vec::new();

    for span in spans {
        let end = span.x + span.w;
        let mut seg_x = span.x;
        while seg_x < end {
            let seg_w = ts.min(end - seg_x);
            let center = seg_x + seg_w * 0.5;
            let disp = rim_displacement(clock_ms, center, waves, falloff_px);
            rects.push(Rect::new(seg_x, span.y + disp, seg_w, RIM_THICKNESS));
            seg_x += seg_w;
        }
    }

    rects
}

fn breathing_alpha(clock_ms: f32) -> f32 {
    WATER_ALPHA_BASE + WATER_ALPHA_SWING * (clock_ms * WATER_ALPHA_RATE * TAU).sin()
}

/// Advance every region's animation state by `dt_ms`.
pub fn advance(
    backend: &mut dyn RenderBackend,
    regions: &mut [LiquidRegion],
    clock_ms: f32,
    dt_ms: f32,
    tile_size: u32,
) {
    for region in regions.iter_mut() {
        let liquid_type = region.liquid_type;
        let Some(visual) = region.visual.as_mut() else {
            continue;
        };

        // Surface drift.
        let (dx, dy) = drift(liquid_type);
        visual.surface_offset.0 += dx * dt_ms;
        visual.surface_offset.1 += dy * dt_ms;
        backend.set_tile_offset(visual.surface, visual.surface_offset.0, visual.surface_offset.1);

        // Overlays desynchronize at their own rates.
        visual.overlay_a_offset.0 += dx * OVERLAY_A_RATE * dt_ms;
        visual.overlay_a_offset.1 += dy * OVERLAY_A_RATE * dt_ms;
        backend.set_tile_offset(
            visual.overlay_a,
            visual.overlay_a_offset.0,
            visual.overlay_a_offset.1,
        );
        visual.overlay_b_offset.0 += dx * OVERLAY_B_RATE * dt_ms;
        visual.overlay_b_offset.1 += dy * OVERLAY_B_RATE * dt_ms;
        backend.set_tile_offset(
            visual.overlay_b,
            visual.overlay_b_offset.0,
            visual.overlay_b_offset.1,
        );

        if liquid_type == LiquidType::Water {
            backend.set_alpha(visual.root, breathing_alpha(clock_ms));
        }

        // Age and prune waves, then redraw the rim from the span list.
        for wave in &mut region.waves {
            wave.age_ms += dt_ms;
        }
        region.waves.retain(|w| !w.expired());

        if let Some(rim) = visual.rim {
            let rects = rim_rects(&region.top_spans, clock_ms, &region.waves, tile_size);
            backend.set_shape_rects(rim, &rects, RIM_COLOR);
        }
    }
}
