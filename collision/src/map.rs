//! Immutable walkability snapshot for one area or room.

use rompilot_core::{
    AreaId, ClassifiedTile, GameMode, Regime, RoomId, SearchFailure, TileBounds, TileCoord,
    TileType,
};

use crate::{classify::TileEncoding, reader::MapReadError};

/// Walkability snapshot of one area or room captured under a single game mode.
///
/// The map covers `bounds` in absolute tile coordinates of its regime and
/// stores tile classes in row-major order. It is never mutated after
/// construction; a fresh map is read for every planning cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollisionMap {
    regime: Regime,
    mode: GameMode,
    area: AreaId,
    room: RoomId,
    bounds: TileBounds,
    tiles: Vec<TileType>,
}

impl CollisionMap {
    /// Builds a map from already classified tiles.
    ///
    /// Fails when `mode` has no regime or when `tiles` does not cover `bounds`
    /// exactly.
    pub fn from_tiles(
        mode: GameMode,
        area: AreaId,
        room: RoomId,
        bounds: TileBounds,
        tiles: Vec<TileType>,
    ) -> Result<Self, MapReadError> {
        let regime = mode.regime().ok_or(MapReadError::ModeTransition(mode))?;
        if tiles.len() != bounds.area() {
            return Err(MapReadError::Truncated {
                expected: bounds.area(),
                actual: tiles.len(),
            });
        }

        Ok(Self {
            regime,
            mode,
            area,
            room,
            bounds,
            tiles,
        })
    }

    /// Classifies raw collision codes and builds a map from them.
    pub fn from_codes(
        encoding: &TileEncoding,
        mode: GameMode,
        area: AreaId,
        room: RoomId,
        bounds: TileBounds,
        codes: &[u8],
    ) -> Result<Self, MapReadError> {
        let regime = mode.regime().ok_or(MapReadError::ModeTransition(mode))?;
        let table = encoding.table(regime);
        let tiles = codes.iter().map(|&code| table.get(code)).collect();
        Self::from_tiles(mode, area, room, bounds, tiles)
    }

    /// Coordinate regime the map was captured in.
    #[must_use]
    pub fn regime(&self) -> Regime {
        self.regime
    }

    /// Game mode active when the map was captured.
    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Overworld area the map belongs to.
    #[must_use]
    pub fn area(&self) -> AreaId {
        self.area
    }

    /// Dungeon room the map belongs to.
    #[must_use]
    pub fn room(&self) -> RoomId {
        self.room
    }

    /// Tile region covered by the map.
    #[must_use]
    pub fn bounds(&self) -> TileBounds {
        self.bounds
    }

    /// Side length of one map cell in pixels.
    #[must_use]
    pub fn cell_size_px(&self) -> u32 {
        self.regime.cell_size_px()
    }

    /// Pixel position of the map's upper-left corner.
    #[must_use]
    pub fn origin_px(&self) -> (u32, u32) {
        let origin = self.bounds.origin();
        let cell = self.cell_size_px();
        (
            origin.x().saturating_mul(cell),
            origin.y().saturating_mul(cell),
        )
    }

    /// Class of the tile, if it lies inside the map.
    #[must_use]
    pub fn tile(&self, tile: TileCoord) -> Option<TileType> {
        self.bounds
            .index(tile)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Class of the tile tagged with the map's regime.
    #[must_use]
    pub fn classified(&self, tile: TileCoord) -> Option<ClassifiedTile> {
        self.tile(tile)
            .map(|kind| ClassifiedTile::new(self.regime, kind))
    }

    /// Reports whether the tile is passable under the map's regime.
    ///
    /// Tiles outside the map are treated as blocking.
    #[must_use]
    pub fn is_walkable(&self, tile: TileCoord) -> bool {
        self.classified(tile)
            .map_or(false, |classified| self.regime.walkable().permits(classified))
    }

    /// Confirms that the map may still be evaluated under `live` mode.
    pub fn ensure_mode(&self, live: GameMode) -> Result<(), SearchFailure> {
        if live == self.mode {
            Ok(())
        } else {
            Err(SearchFailure::StaleMap)
        }
    }

    /// Row-major tile classes.
    #[must_use]
    pub fn tiles(&self) -> &[TileType] {
        &self.tiles
    }
}
