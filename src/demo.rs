//! Demo map synthesis
//!
//! Generates a small side-view tile world for the viewer and snapshot
//! binary: a noisy terrain line, rock below it, and flooded basins wherever
//! the terrain dips under the waterline. A low-frequency stress field turns
//! some basins into lava pools.

use noise::{NoiseFn, Perlin, Seedable};

use crate::grid::TileGrid;
use crate::registry::{TileDef, TileFlags, TileRegistry};

pub const TILE_ROCK: u16 = 1;
pub const TILE_WATER: u16 = 2;
pub const TILE_LAVA: u16 = 3;
pub const TILE_MURK: u16 = 4;

/// Stress above this turns a basin into lava.
const LAVA_STRESS: f64 = 0.35;
/// Stress below this turns a basin into generic murk (rare).
const MURK_STRESS: f64 = -0.62;

/// Registry for the demo tiles. `murk` is liquid without a specific type,
/// exercising the generic-liquid path.
pub fn demo_registry() -> TileRegistry {
    let def = |id: u16, name: &str, flags: TileFlags| TileDef {
        id,
        name: name.to_string(),
        flags,
    };
    TileRegistry::new(vec![
        def(TILE_ROCK, "rock", TileFlags::default()),
        def(
            TILE_WATER,
            "water",
            TileFlags { liquid: true, water: true, lava: false },
        ),
        def(
            TILE_LAVA,
            "lava",
            TileFlags { liquid: true, water: false, lava: true },
        ),
        def(
            TILE_MURK,
            "murk",
            TileFlags { liquid: true, water: false, lava: false },
        ),
    ])
}

/// Generate a demo world. Deterministic for a given seed.
pub fn generate_demo_map(width: usize, height: usize, seed: u64) -> TileGrid {
    let terrain_noise = Perlin::new(1).set_seed(seed as u32);
    let stress_noise = Perlin::new(1).set_seed(seed as u32 + 1111);

    let base = height as f64 * 0.52;
    let amp = height as f64 * 0.30;

    // First solid row per column.
    let mut surface = vec![0usize; width];
    for (x, s) in surface.iter_mut().enumerate() {
        let fx = x as f64 * 0.045;
        let n = terrain_noise.get([fx, 0.5]) * 0.65
            + terrain_noise.get([fx * 2.0, 7.5]) * 0.25
            + terrain_noise.get([fx * 4.0, 13.5]) * 0.10;
        let level = base + n * amp;
        *s = (level.round() as isize).clamp(2, height as isize - 1) as usize;
    }

    let mut grid = TileGrid::new(width, height);
    for x in 0..width {
        for y in surface[x]..height {
            grid.set(x, y, TILE_ROCK);
        }
    }

    // Flood basins: columns whose terrain dips below the waterline get
    // liquid from the waterline down to the rock. Each contiguous run of
    // flooded columns is one basin and takes a single liquid type.
    let waterline = (height as f64 * 0.60) as usize;
    let mut x = 0;
    while x < width {
        if surface[x] <= waterline {
            x += 1;
            continue;
        }
        let start = x;
        while x < width && surface[x] > waterline {
            x += 1;
        }
        let center = (start + x - 1) / 2;
        let stress = stress_noise.get([center as f64 * 0.03, 0.5]);
        let tile = if stress > LAVA_STRESS {
            TILE_LAVA
        } else if stress < MURK_STRESS {
            TILE_MURK
        } else {
            TILE_WATER
        };
        for bx in start..x {
            for y in waterline..surface[bx] {
                grid.set(bx, y, tile);
            }
        }
    }

    grid
}
