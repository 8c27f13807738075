//! Region visual assembly
//!
//! Builds the scene subtree owned by one region: a masked container
//! holding the tiling surface sprite, two noise overlays, and (water
//! only) the rim-highlight shape the animator redraws every frame. All
//! parts share one mask and one parent so they clip identically and die
//! together.

use crate::animate;
use crate::region::LiquidRegion;
use crate::registry::LiquidType;
use crate::scene::{NodeId, Rect, RenderBackend};
use crate::texture::SurfaceTextureCache;

/// Sub-pixel expansion applied to every mask rectangle. Adjacent tile
/// rects otherwise leave anti-aliased sampling seams between them.
pub const MASK_BLEED: f32 = 0.5;

/// Overlay styling per liquid type: lava reads denser and hotter, water
/// stays subtle.
struct OverlayStyle {
    scale_a: f32,
    alpha_a: f32,
    scale_b: f32,
    alpha_b: f32,
}

fn overlay_style(liquid_type: LiquidType) -> OverlayStyle {
    match liquid_type {
        LiquidType::Water => OverlayStyle {
            scale_a: 2.0,
            alpha_a: 0.10,
            scale_b: 3.2,
            alpha_b: 0.07,
        },
        LiquidType::Lava => OverlayStyle {
            scale_a: 1.2,
            alpha_a: 0.26,
            scale_b: 2.1,
            alpha_b: 0.17,
        },
        LiquidType::Other => OverlayStyle {
            scale_a: 2.0,
            alpha_a: 0.12,
            scale_b: 3.0,
            alpha_b: 0.08,
        },
    }
}

/// Handles to the scene subtree a region exclusively owns.
pub struct RegionVisual {
    pub root: NodeId,
    pub mask: NodeId,
    pub surface: NodeId,
    pub overlay_a: NodeId,
    pub overlay_b: NodeId,
    /// Present for water regions only.
    pub rim: Option<NodeId>,
    pub bounds_px: Rect,
    /// Accumulated tiling offsets, advanced by the animator.
    pub(crate) surface_offset: (f32, f32),
    pub(crate) overlay_a_offset: (f32, f32),
    pub(crate) overlay_b_offset: (f32, f32),
}

/// One bled rectangle per member tile; the union is the mask geometry.
pub(crate) fn tile_mask_rects(tiles: &[usize], grid_width: usize, tile_size: u32) -> Vec<Rect> {
    let ts = tile_size as f32;
    tiles
        .iter()
        .map(|&idx| {
            let x = (idx % grid_width) as f32 * ts;
            let y = (idx / grid_width) as f32 * ts;
            Rect::new(
                x - MASK_BLEED,
                y - MASK_BLEED,
                ts + 2.0 * MASK_BLEED,
                ts + 2.0 * MASK_BLEED,
            )
        })
        .collect()
}

/// Construct the render subtree for a region.
pub fn build_region_visual(
    backend: &mut dyn RenderBackend,
    cache: &mut SurfaceTextureCache,
    region: &LiquidRegion,
    grid_width: usize,
    tile_size: u32,
) -> RegionVisual {
    let bounds_px = region.pixel_bounds(tile_size);
    let style = overlay_style(region.liquid_type);

    let root = backend.create_container();

    let mask = backend.create_shape();
    let rects = tile_mask_rects(&region.tiles, grid_width, tile_size);
    backend.set_shape_rects(mask, &rects, [255, 255, 255, 255]);
    backend.add_child(root, mask);
    backend.set_mask(root, Some(mask));

    let base = cache.base_texture(backend, region.liquid_type, tile_size);
    let surface = backend.create_tiling_sprite(base, bounds_px);
    backend.add_child(root, surface);

    let noise = cache.noise_texture(backend);
    let overlay_a = backend.create_tiling_sprite(noise, bounds_px);
    backend.set_tile_scale(overlay_a, style.scale_a, style.scale_a);
    backend.set_alpha(overlay_a, style.alpha_a);
    backend.add_child(root, overlay_a);

    let overlay_b = backend.create_tiling_sprite(noise, bounds_px);
    backend.set_tile_scale(overlay_b, style.scale_b, style.scale_b);
    backend.set_alpha(overlay_b, style.alpha_b);
    backend.add_child(root, overlay_b);

    // Water gets a rim highlight redrawn per frame; lava holds a steady
    // near-opaque surface instead.
    let rim = if region.liquid_type == LiquidType::Water {
        let rim = backend.create_shape();
        let baseline = animate::rim_rects(&region.top_spans, 0.0, &[], tile_size);
        backend.set_shape_rects(rim, &baseline, animate::RIM_COLOR);
        backend.add_child(root, rim);
        Some(rim)
    } else {
        backend.set_alpha(root, animate::LAVA_ALPHA);
        None
    };

    RegionVisual {
        root,
        mask,
        surface,
        overlay_a,
        overlay_b,
        rim,
        bounds_px,
        surface_offset: (0.0, 0.0),
        overlay_a_offset: (0.0, 0.0),
        overlay_b_offset: (0.0, 0.0),
    }
}
