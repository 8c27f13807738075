//! Liquid region system façade
//!
//! Owns the region list, the shared texture cache, and the animation
//! clock. Hosts drive the whole core through this type: `build` after map
//! load, `update` once per frame, `surface_y`/`add_wave` from gameplay and
//! weather, `destroy` on teardown. There is no incremental rebuild; any
//! tile-data change is a full `destroy` + `build` cycle.

use log::info;
use thiserror::Error;

use crate::animate::{self, Wave};
use crate::boundary::top_edge_spans;
use crate::grid::TileGrid;
use crate::region::{region_stats, segment_regions, LiquidRegion};
use crate::registry::{LiquidType, TileRegistry};
use crate::renderer::build_region_visual;
use crate::scene::RenderBackend;
use crate::texture::SurfaceTextureCache;

/// Malformed `build` input. These fail loudly; everything else in this
/// crate degrades silently (see module docs on `surface_y`/`add_wave`).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("tile grid has {actual} entries, expected {expected} ({width}x{height})")]
    GridSizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    #[error("tile size must be positive")]
    InvalidTileSize,
}

/// Façade over segmentation, boundary extraction, rendering, and
/// animation of every liquid region in the map.
pub struct LiquidRegionSystem {
    regions: Vec<LiquidRegion>,
    cache: SurfaceTextureCache,
    clock_ms: f32,
    tile_size: u32,
    map_width: usize,
    map_height: usize,
    built: bool,
}

impl LiquidRegionSystem {
    /// `texture_seed` varies the procedural surface decoration.
    pub fn new(texture_seed: u64) -> Self {
        Self {
            regions: Vec::new(),
            cache: SurfaceTextureCache::new(texture_seed),
            clock_ms: 0.0,
            tile_size: 0,
            map_width: 0,
            map_height: 0,
            built: false,
        }
    }

    /// (Re)segment the grid and construct every region's visual subtree.
    /// Any previous build is torn down first. Idempotent for identical
    /// inputs: same region count, same span geometry.
    pub fn build(
        &mut self,
        backend: &mut dyn RenderBackend,
        grid: &TileGrid,
        registry: &TileRegistry,
        tile_size: u32,
    ) -> Result<(), BuildError> {
        let expected = grid.width * grid.height;
        if grid.len() != expected {
            return Err(BuildError::GridSizeMismatch {
                width: grid.width,
                height: grid.height,
                expected,
                actual: grid.len(),
            });
        }
        if tile_size == 0 {
            return Err(BuildError::InvalidTileSize);
        }

        self.teardown_regions(backend);
        self.tile_size = tile_size;
        self.map_width = grid.width;
        self.map_height = grid.height;

        let mut regions = segment_regions(grid, registry);
        for region in &mut regions {
            region.top_spans = top_edge_spans(&region.tiles, grid.width, grid.len(), tile_size);
            let visual = build_region_visual(backend, &mut self.cache, region, grid.width, tile_size);
            region.visual = Some(visual);
        }

        let stats = region_stats(&regions);
        info!(
            "built {} liquid regions covering {} tiles ({} water, {} lava, {} other)",
            stats.total_regions(),
            stats.total_tiles(),
            stats.water_regions,
            stats.lava_regions,
            stats.other_regions,
        );

        self.regions = regions;
        self.built = true;
        Ok(())
    }

    /// Invalidate size-dependent caches and drop to the empty state. Does
    /// not rebuild: the host calls `build` again with fresh tile data.
    pub fn resize(
        &mut self,
        backend: &mut dyn RenderBackend,
        map_width: usize,
        map_height: usize,
        tile_size: u32,
    ) {
        self.teardown_regions(backend);
        self.cache.invalidate_base(backend);
        self.map_width = map_width;
        self.map_height = map_height;
        self.tile_size = tile_size;
        self.built = false;
    }

    /// Advance animation and wave decay by `dt_ms`. No-op unless built.
    pub fn update(&mut self, backend: &mut dyn RenderBackend, dt_ms: f32) {
        if !self.built {
            return;
        }
        self.clock_ms += dt_ms;
        animate::advance(backend, &mut self.regions, self.clock_ms, dt_ms, self.tile_size);
    }

    /// Pixel Y of the topmost surface of `liquid_type` at horizontal
    /// position `x`, or `None` when no span of that type covers `x`:
    /// "no liquid surface here", not a failure.
    pub fn surface_y(&self, liquid_type: LiquidType, x: f32) -> Option<f32> {
        let mut best: Option<f32> = None;
        for region in &self.regions {
            if region.liquid_type != liquid_type {
                continue;
            }
            for span in &region.top_spans {
                if span.covers(x) {
                    best = Some(best.map_or(span.y, |b: f32| b.min(span.y)));
                }
            }
        }
        best
    }

    /// Inject a transient surface disturbance at pixel `x`. Attaches to
    /// the nearest matching-type region covering `x` (surface spans
    /// preferred, horizontal bounds as fallback); silently ignored when
    /// nothing matches or no build is live.
    pub fn add_wave(&mut self, liquid_type: LiquidType, x: f32, strength: f32) {
        if !self.built {
            return;
        }

        let mut best: Option<(usize, (u8, f32))> = None;
        for (i, region) in self.regions.iter().enumerate() {
            if region.liquid_type != liquid_type {
                continue;
            }
            let key = if let Some(span) = region.top_spans.iter().find(|s| s.covers(x)) {
                Some((0u8, (x - span.midpoint()).abs()))
            } else {
                let bounds = region.pixel_bounds(self.tile_size);
                if x >= bounds.x && x < bounds.right() {
                    Some((1u8, (x - (bounds.x + bounds.w * 0.5)).abs()))
                } else {
                    None
                }
            };
            if let Some(key) = key {
                if best.map_or(true, |(_, b)| key < b) {
                    best = Some((i, key));
                }
            }
        }

        if let Some((i, _)) = best {
            self.regions[i].waves.push(Wave::new(x, strength));
        }
    }

    /// Release every owned render resource and cached texture.
    pub fn destroy(&mut self, backend: &mut dyn RenderBackend) {
        self.teardown_regions(backend);
        self.cache.destroy(backend);
        self.built = false;
    }

    fn teardown_regions(&mut self, backend: &mut dyn RenderBackend) {
        for region in self.regions.drain(..) {
            if let Some(visual) = region.visual {
                backend.destroy_subtree(visual.root);
            }
        }
    }

    pub fn regions(&self) -> &[LiquidRegion] {
        &self.regions
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn clock_ms(&self) -> f32 {
        self.clock_ms
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animate::WAVE_LIFETIME_MS;
    use crate::boundary::Span;
    use crate::registry::{TileDef, TileFlags};
    use crate::scene::SceneGraph;

    const WATER: u16 = 2;
    const LAVA: u16 = 3;

    fn registry() -> TileRegistry {
        TileRegistry::new(vec![
            TileDef {
                id: WATER,
                name: "water".into(),
                flags: TileFlags { liquid: true, water: true, lava: false },
            },
            TileDef {
                id: LAVA,
                name: "lava".into(),
                flags: TileFlags { liquid: true, water: false, lava: true },
            },
        ])
    }

    /// 10x10 map with a 3x3 block of water at (3,3).
    fn pond_grid() -> TileGrid {
        let mut grid = TileGrid::new(10, 10);
        for y in 3..6 {
            for x in 3..6 {
                grid.set(x, y, WATER);
            }
        }
        grid
    }

    fn built_system(grid: &TileGrid) -> (LiquidRegionSystem, SceneGraph) {
        let mut scene = SceneGraph::new(grid.width * 16, grid.height * 16, 0);
        let mut system = LiquidRegionSystem::new(1);
        system
            .build(&mut scene, grid, &registry(), 16)
            .expect("build");
        (system, scene)
    }

    #[test]
    fn build_rejects_mismatched_grid_length() {
        let grid = TileGrid::from_tiles(4, 4, vec![0; 15]);
        let mut scene = SceneGraph::new(64, 64, 0);
        let mut system = LiquidRegionSystem::new(1);
        let err = system.build(&mut scene, &grid, &registry(), 16);
        assert_eq!(
            err,
            Err(BuildError::GridSizeMismatch {
                width: 4,
                height: 4,
                expected: 16,
                actual: 15,
            })
        );
        assert!(!system.is_built());
    }

    #[test]
    fn build_rejects_zero_tile_size() {
        let grid = TileGrid::new(4, 4);
        let mut scene = SceneGraph::new(64, 64, 0);
        let mut system = LiquidRegionSystem::new(1);
        assert_eq!(
            system.build(&mut scene, &grid, &registry(), 0),
            Err(BuildError::InvalidTileSize)
        );
    }

    #[test]
    fn pond_segments_into_one_region_with_one_top_span() {
        let grid = pond_grid();
        let (system, _scene) = built_system(&grid);

        assert_eq!(system.regions().len(), 1);
        let region = &system.regions()[0];
        assert_eq!(region.tile_count(), 9);
        assert_eq!(
            region.top_spans,
            vec![Span { x: 48.0, y: 48.0, w: 48.0 }]
        );
    }

    #[test]
    fn surface_y_inside_and_outside_spans() {
        let grid = pond_grid();
        let (system, _scene) = built_system(&grid);

        // Inside [48, 96): the top of the pond.
        assert_eq!(system.surface_y(LiquidType::Water, 48.0), Some(48.0));
        assert_eq!(system.surface_y(LiquidType::Water, 95.9), Some(48.0));
        // Outside.
        assert_eq!(system.surface_y(LiquidType::Water, 96.0), None);
        assert_eq!(system.surface_y(LiquidType::Water, 10.0), None);
        // Wrong type.
        assert_eq!(system.surface_y(LiquidType::Lava, 50.0), None);
    }

    #[test]
    fn surface_y_prefers_the_topmost_of_stacked_pools() {
        // Two vertically separated ponds sharing the same columns.
        let mut grid = TileGrid::new(6, 8);
        for x in 1..4 {
            grid.set(x, 1, WATER);
            grid.set(x, 5, WATER);
        }
        let (system, _scene) = built_system(&grid);

        assert_eq!(system.regions().len(), 2);
        assert_eq!(system.surface_y(LiquidType::Water, 24.0), Some(16.0));
    }

    #[test]
    fn rebuild_with_identical_input_is_idempotent() {
        let grid = pond_grid();
        let reg = registry();
        let mut scene = SceneGraph::new(160, 160, 0);
        let mut system = LiquidRegionSystem::new(1);

        system.build(&mut scene, &grid, &reg, 16).expect("first");
        let spans_a: Vec<_> = system.regions()[0].top_spans.clone();
        let nodes_a = scene.node_count();

        system.build(&mut scene, &grid, &reg, 16).expect("second");
        let spans_b: Vec<_> = system.regions()[0].top_spans.clone();

        assert_eq!(system.regions().len(), 1);
        assert_eq!(spans_a, spans_b);
        // The first build's subtree was torn down, not leaked.
        assert_eq!(scene.node_count(), nodes_a);
    }

    #[test]
    fn add_wave_attaches_to_covering_region_only() {
        let grid = pond_grid();
        let (mut system, _scene) = built_system(&grid);

        system.add_wave(LiquidType::Water, 60.0, 6.0);
        assert_eq!(system.regions()[0].active_waves(), 1);

        // No region covers x=5; silent no-op.
        system.add_wave(LiquidType::Water, 5.0, 6.0);
        assert_eq!(system.regions()[0].active_waves(), 1);

        // Wrong type; silent no-op.
        system.add_wave(LiquidType::Lava, 60.0, 6.0);
        assert_eq!(system.regions()[0].active_waves(), 1);
    }

    #[test]
    fn waves_expire_after_their_lifetime() {
        let grid = pond_grid();
        let (mut system, mut scene) = built_system(&grid);

        system.add_wave(LiquidType::Water, 60.0, 6.0);
        assert_eq!(system.regions()[0].active_waves(), 1);

        // Tick past the lifetime in frame-sized steps.
        let steps = (WAVE_LIFETIME_MS / 16.0) as usize + 2;
        for _ in 0..steps {
            system.update(&mut scene, 16.0);
        }
        assert_eq!(system.regions()[0].active_waves(), 0);
    }

    #[test]
    fn update_before_build_is_a_no_op() {
        let mut scene = SceneGraph::new(32, 32, 0);
        let mut system = LiquidRegionSystem::new(1);
        system.update(&mut scene, 16.0);
        assert_eq!(system.clock_ms(), 0.0);
    }

    #[test]
    fn update_advances_the_clock_and_offsets() {
        let grid = pond_grid();
        let (mut system, mut scene) = built_system(&grid);

        system.update(&mut scene, 16.0);
        system.update(&mut scene, 16.0);
        assert_eq!(system.clock_ms(), 32.0);
    }

    #[test]
    fn destroy_releases_all_nodes_and_textures() {
        let grid = pond_grid();
        let (mut system, mut scene) = built_system(&grid);
        assert!(scene.node_count() > 0);
        assert!(scene.texture_count() > 0);

        system.destroy(&mut scene);
        assert_eq!(scene.node_count(), 0);
        assert_eq!(scene.texture_count(), 0);
        assert!(!system.is_built());

        // Post-destroy calls degrade silently.
        system.add_wave(LiquidType::Water, 60.0, 6.0);
        system.update(&mut scene, 16.0);
        assert_eq!(system.surface_y(LiquidType::Water, 60.0), None);
    }

    #[test]
    fn resize_drops_regions_and_base_textures_but_keeps_noise() {
        let grid = pond_grid();
        let (mut system, mut scene) = built_system(&grid);
        // Water base + shared noise.
        assert_eq!(scene.texture_count(), 2);

        system.resize(&mut scene, 10, 10, 32);
        assert!(!system.is_built());
        assert_eq!(scene.node_count(), 0);
        // Base texture freed; the noise texture persists.
        assert_eq!(scene.texture_count(), 1);
    }

    #[test]
    fn water_beside_lava_renders_as_two_regions() {
        let mut grid = TileGrid::new(6, 2);
        grid.set(1, 1, WATER);
        grid.set(2, 1, WATER);
        grid.set(3, 1, LAVA);
        grid.set(4, 1, LAVA);
        let (system, _scene) = built_system(&grid);

        assert_eq!(system.regions().len(), 2);
        assert_eq!(system.surface_y(LiquidType::Water, 24.0), Some(16.0));
        assert_eq!(system.surface_y(LiquidType::Lava, 24.0), None);
        assert_eq!(system.surface_y(LiquidType::Lava, 56.0), Some(16.0));
    }
}
