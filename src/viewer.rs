//! Interactive liquid viewer
//!
//! Opens a minifb window over a generated demo map and ticks the region
//! system per frame. Left-click splashes the water surface, right-click
//! the lava, R regenerates the world, Escape exits.

use minifb::{Key, MouseButton, MouseMode, Window, WindowOptions};
use std::time::Instant;

use crate::demo::{demo_registry, generate_demo_map};
use crate::grid::TileGrid;
use crate::region::region_stats;
use crate::registry::{LiquidType, TileRegistry};
use crate::scene::{NodeId, Rect, RenderBackend, SceneGraph};
use crate::system::LiquidRegionSystem;

pub const BACKGROUND: u32 = 0x0b0d16;
const ROCK_COLOR: [u8; 4] = [86, 75, 66, 255];
const MARKER_COLOR: [u8; 4] = [255, 240, 120, 255];

const SPLASH_STRENGTH: f32 = 8.0;
const DT_CLAMP_MS: f32 = 50.0;

/// Run the interactive viewer.
pub fn run_viewer(map_width: usize, map_height: usize, tile_size: u32, initial_seed: Option<u64>) {
    let window_width = map_width * tile_size as usize;
    let window_height = map_height * tile_size as usize;

    let mut window = Window::new(
        "Liquid Regions - Click: splash, R: Regenerate, Esc: Exit",
        window_width,
        window_height,
        WindowOptions::default(),
    )
    .expect("Failed to create window");
    window.set_target_fps(60);

    let mut seed = initial_seed.unwrap_or_else(rand::random);
    let registry = demo_registry();
    let mut scene = SceneGraph::new(window_width, window_height, BACKGROUND);
    let mut system = LiquidRegionSystem::new(seed);

    let mut grid = generate_demo_map(map_width, map_height, seed);
    let mut backdrop = build_backdrop(&mut scene, &grid, &registry, tile_size);
    system
        .build(&mut scene, &grid, &registry, tile_size)
        .expect("demo map build");
    let mut marker = scene.create_shape();

    println!("Viewer started (seed {seed}). Controls:");
    println!("  Left click:  splash the water surface");
    println!("  Right click: splash the lava surface");
    println!("  R:           regenerate the world");
    println!("  Esc:         exit");
    print_stats(&system);

    let mut last = Instant::now();
    let mut prev_left = false;
    let mut prev_right = false;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let now = Instant::now();
        let dt = ((now - last).as_secs_f32() * 1000.0).min(DT_CLAMP_MS);
        last = now;

        if window.is_key_pressed(Key::R, minifb::KeyRepeat::No) {
            seed = rand::random();
            println!("Regenerating with seed {seed}");
            scene.destroy_subtree(backdrop);
            scene.destroy_subtree(marker);
            grid = generate_demo_map(map_width, map_height, seed);
            backdrop = build_backdrop(&mut scene, &grid, &registry, tile_size);
            system
                .build(&mut scene, &grid, &registry, tile_size)
                .expect("demo map build");
            marker = scene.create_shape();
            print_stats(&system);
        }

        let left = window.get_mouse_down(MouseButton::Left);
        let right = window.get_mouse_down(MouseButton::Right);
        if let Some((mx, _my)) = window.get_mouse_pos(MouseMode::Clamp) {
            if left && !prev_left {
                system.add_wave(LiquidType::Water, mx, SPLASH_STRENGTH);
            }
            if right && !prev_right {
                system.add_wave(LiquidType::Lava, mx, SPLASH_STRENGTH);
            }

            // Surface probe under the cursor.
            match system.surface_y(LiquidType::Water, mx) {
                Some(sy) => scene.set_shape_rects(
                    marker,
                    &[Rect::new(mx - 1.0, sy - 4.0, 2.0, 8.0)],
                    MARKER_COLOR,
                ),
                None => scene.set_shape_rects(marker, &[], MARKER_COLOR),
            }
        }
        prev_left = left;
        prev_right = right;

        system.update(&mut scene, dt);
        let buffer = scene.composite();
        window
            .update_with_buffer(buffer, window_width, window_height)
            .expect("window update");
    }
}

/// Flat-colored shape covering every solid tile, drawn under the liquid
/// surfaces. Shared with the headless snapshot path.
pub fn build_backdrop(
    scene: &mut SceneGraph,
    grid: &TileGrid,
    registry: &TileRegistry,
    tile_size: u32,
) -> NodeId {
    let ts = tile_size as f32;
    let mut rects = Vec::new();
    for (i, &id) in grid.tiles.iter().enumerate() {
        if id != 0 && registry.classify(id).is_none() {
            rects.push(Rect::new(
                (i % grid.width) as f32 * ts,
                (i / grid.width) as f32 * ts,
                ts,
                ts,
            ));
        }
    }
    let shape = scene.create_shape();
    scene.set_shape_rects(shape, &rects, ROCK_COLOR);
    shape
}

fn print_stats(system: &LiquidRegionSystem) {
    let stats = region_stats(system.regions());
    println!(
        "  {} regions: {} water, {} lava, {} other ({} liquid tiles)",
        stats.total_regions(),
        stats.water_regions,
        stats.lava_regions,
        stats.other_regions,
        stats.total_tiles(),
    );
}
