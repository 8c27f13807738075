//! Tile registry and liquid classification
//!
//! Maps tile ids to their definitions and answers the one question this
//! crate cares about: "what kind of liquid, if any, is this tile?". The
//! registry precomputes a dense id-indexed table at construction so the
//! per-tile classification during a rebuild is O(1), independent of
//! registry size.

use serde::{Deserialize, Serialize};

use crate::grid::EMPTY_TILE;

/// Kind of liquid a tile belongs to.
///
/// `Other` covers tiles flagged `liquid` without a specific type: they
/// segment into their own regions and never merge with water or lava,
/// which keeps future variants from silently joining existing surfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiquidType {
    Water,
    Lava,
    Other,
}

impl LiquidType {
    pub fn display_name(&self) -> &'static str {
        match self {
            LiquidType::Water => "Water",
            LiquidType::Lava => "Lava",
            LiquidType::Other => "Liquid",
        }
    }

    pub fn all() -> &'static [LiquidType] {
        &[LiquidType::Water, LiquidType::Lava, LiquidType::Other]
    }
}

/// Behavior flags for a tile definition. Only `liquid` plus the specific
/// type flags are consulted by this crate; hosts may carry more.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileFlags {
    #[serde(default)]
    pub liquid: bool,
    #[serde(default)]
    pub water: bool,
    #[serde(default)]
    pub lava: bool,
}

/// One tile definition as provided by the host's asset pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileDef {
    pub id: u16,
    pub name: String,
    #[serde(default)]
    pub flags: TileFlags,
}

/// Registry of tile definitions with O(1) id lookup.
pub struct TileRegistry {
    defs: Vec<TileDef>,
    /// Dense index: def position by tile id.
    def_index: Vec<Option<usize>>,
    /// Dense index: classified liquid type by tile id.
    liquid_index: Vec<Option<LiquidType>>,
}

impl TileRegistry {
    /// Build a registry from definitions. Duplicate ids keep the last
    /// definition seen.
    pub fn new(defs: Vec<TileDef>) -> Self {
        let max_id = defs.iter().map(|d| d.id as usize).max().unwrap_or(0);
        let mut def_index = vec![None; max_id + 1];
        let mut liquid_index = vec![None; max_id + 1];

        for (pos, def) in defs.iter().enumerate() {
            def_index[def.id as usize] = Some(pos);
            liquid_index[def.id as usize] = classify_flags(&def.flags);
        }

        // Id 0 is "no tile" regardless of what the host registered.
        if let Some(slot) = liquid_index.get_mut(EMPTY_TILE as usize) {
            *slot = None;
        }

        Self {
            defs,
            def_index,
            liquid_index,
        }
    }

    /// Classify a tile id. Unknown or empty ids are not liquid.
    pub fn classify(&self, id: u16) -> Option<LiquidType> {
        self.liquid_index.get(id as usize).copied().flatten()
    }

    /// Look up a tile definition by id.
    pub fn get(&self, id: u16) -> Option<&TileDef> {
        let pos = self.def_index.get(id as usize).copied().flatten()?;
        self.defs.get(pos)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Flag combination to liquid type. The `water`/`lava` flags only count
/// when `liquid` itself is set.
fn classify_flags(flags: &TileFlags) -> Option<LiquidType> {
    if !flags.liquid {
        return None;
    }
    if flags.water {
        Some(LiquidType::Water)
    } else if flags.lava {
        Some(LiquidType::Lava)
    } else {
        Some(LiquidType::Other)
    }
}
