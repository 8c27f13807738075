//! Top-edge span extraction
//!
//! A region tile is part of the top boundary when no same-region tile sits
//! directly above it. Contiguous runs of such tiles in one row merge into
//! horizontal pixel spans, the renderable and queryable "surface line" of
//! the region. Spans are derived purely from the tile set and recomputed on
//! every rebuild; nothing mutates them incrementally.

/// One horizontal surface span, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub x: f32,
    pub y: f32,
    pub w: f32,
}

impl Span {
    /// Whether a horizontal pixel position falls inside the half-open
    /// range `[x, x + w)`.
    pub fn covers(&self, x: f32) -> bool {
        x >= self.x && x < self.x + self.w
    }

    pub fn midpoint(&self) -> f32 {
        self.x + self.w * 0.5
    }
}

/// Compute the top-edge spans for a set of region tile indices.
///
/// `grid_width`/`grid_len` describe the full map the indices address.
/// Returned spans are ordered by row, then column.
pub fn top_edge_spans(
    tile_indices: &[usize],
    grid_width: usize,
    grid_len: usize,
    tile_size: u32,
) -> Vec<Span> {
    if tile_indices.is_empty() || grid_width == 0 {
        return Vec::new();
    }

    let mut member = vec![false; grid_len];
    for &idx in tile_indices {
        member[idx] = true;
    }

    // Tiles exposed to the top: row 0, or nothing of this region above.
    let mut exposed: Vec<(usize, usize)> = Vec::new();
    for &idx in tile_indices {
        let row = idx / grid_width;
        if row == 0 || !member[idx - grid_width] {
            exposed.push((row, idx % grid_width));
        }
    }
    exposed.sort_unstable();

    // Merge consecutive columns within a row into single spans.
    let ts = tile_size as f32;
    let mut spans: Vec<Span> = Vec::new();
    let mut run: Option<(usize, usize, usize)> = None; // (row, start_col, end_col)

    for (row, col) in exposed {
        match run {
            Some((r, start, end)) if r == row && col == end + 1 => {
                run = Some((r, start, col));
            }
            Some((r, start, end)) => {
                spans.push(make_span(r, start, end, ts));
                run = Some((row, col, col));
            }
            None => run = Some((row, col, col)),
        }
    }
    if let Some((r, start, end)) = run {
        spans.push(make_span(r, start, end, ts));
    }

    spans
}

fn make_span(row: usize, start_col: usize, end_col: usize, ts: f32) -> Span {
    Span {
        x: start_col as f32 * ts,
        y: row as f32 * ts,
        w: (end_col - start_col + 1) as f32 * ts,
    }
}
