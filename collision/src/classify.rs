//! Raw collision code classification for both regimes.

use rompilot_core::{ClassifiedTile, Regime, TileType};
use serde::Deserialize;

const CODE_COUNT: usize = 256;

/// Classifies a raw collision code using the built-in encoding of `regime`.
///
/// Overworld and dungeon codes live in separate spaces; a code must only be
/// interpreted under the regime it was read from.
#[must_use]
pub fn classify(code: u8, regime: Regime) -> TileType {
    match (regime, code) {
        (_, 0x00) => TileType::Floor,
        (Regime::Overworld, 0x40) => TileType::Floor,
        (_, 0x01..=0x03) => TileType::Wall,
        (_, 0x08) => TileType::DeepWater,
        (_, 0x09) => TileType::ShallowWater,
        (_, 0x20) => TileType::Pit,
        (_, 0x1d..=0x1f) | (_, 0x80..=0x8f) => TileType::Warp,
        (_, 0x50..=0x57) => TileType::Obstacle,
        _ => TileType::Unknown,
    }
}

/// Dense lookup table from raw code to tile class for a single regime.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "CodeLists")]
pub struct CodeTable {
    classes: [TileType; CODE_COUNT],
}

impl CodeTable {
    /// Builds the built-in table for `regime`.
    #[must_use]
    pub fn builtin(regime: Regime) -> Self {
        let mut classes = [TileType::Unknown; CODE_COUNT];
        for (code, class) in (0..=u8::MAX).zip(classes.iter_mut()) {
            *class = classify(code, regime);
        }
        Self { classes }
    }

    /// Class assigned to the raw code.
    #[must_use]
    pub fn get(&self, code: u8) -> TileType {
        self.classes[usize::from(code)]
    }
}

/// Per-class code lists as they appear in configuration files.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CodeLists {
    floor: Vec<u8>,
    wall: Vec<u8>,
    shallow_water: Vec<u8>,
    deep_water: Vec<u8>,
    pit: Vec<u8>,
    warp: Vec<u8>,
    obstacle: Vec<u8>,
}

impl From<CodeLists> for CodeTable {
    fn from(lists: CodeLists) -> Self {
        let mut classes = [TileType::Unknown; CODE_COUNT];
        let ordered = [
            (TileType::Floor, &lists.floor),
            (TileType::Wall, &lists.wall),
            (TileType::ShallowWater, &lists.shallow_water),
            (TileType::DeepWater, &lists.deep_water),
            (TileType::Pit, &lists.pit),
            (TileType::Warp, &lists.warp),
            (TileType::Obstacle, &lists.obstacle),
        ];

        for (kind, codes) in ordered {
            for &code in codes.iter() {
                let slot = &mut classes[usize::from(code)];
                if *slot == TileType::Unknown {
                    *slot = kind;
                }
            }
        }

        Self { classes }
    }
}

/// Code tables for both regimes.
///
/// A table supplied through configuration replaces the built-in table for its
/// regime entirely; codes it does not list classify as [`TileType::Unknown`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TileEncoding {
    overworld: CodeTable,
    dungeon: CodeTable,
}

impl TileEncoding {
    /// Creates an encoding from explicit per-regime tables.
    #[must_use]
    pub fn new(overworld: CodeTable, dungeon: CodeTable) -> Self {
        Self { overworld, dungeon }
    }

    /// Table used for `regime`.
    #[must_use]
    pub fn table(&self, regime: Regime) -> &CodeTable {
        match regime {
            Regime::Overworld => &self.overworld,
            Regime::Dungeon => &self.dungeon,
        }
    }

    /// Classifies `code` under `regime`, tagging the result with the regime.
    #[must_use]
    pub fn classify(&self, code: u8, regime: Regime) -> ClassifiedTile {
        ClassifiedTile::new(regime, self.table(regime).get(code))
    }
}

impl Default for TileEncoding {
    fn default() -> Self {
        Self {
            overworld: CodeTable::builtin(Regime::Overworld),
            dungeon: CodeTable::builtin(Regime::Dungeon),
        }
    }
}
