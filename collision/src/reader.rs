//! Reads collision maps for the player's surroundings from live memory.

use log::debug;
use rompilot_core::{AreaId, GameMode, RoomId, TileBounds, TileCoord};
use thiserror::Error;

use crate::{classify::TileEncoding, map::CollisionMap};

const DEFAULT_REGION_MARGIN: u32 = 8;

/// Memory access required to fetch raw collision codes.
pub trait MemoryReader {
    /// Reads the raw collision codes covering `bounds` in row-major order.
    fn read_region(
        &mut self,
        area: AreaId,
        room: RoomId,
        bounds: TileBounds,
    ) -> Result<Vec<u8>, RegionError>;
}

impl<T: MemoryReader + ?Sized> MemoryReader for &mut T {
    fn read_region(
        &mut self,
        area: AreaId,
        room: RoomId,
        bounds: TileBounds,
    ) -> Result<Vec<u8>, RegionError> {
        (**self).read_region(area, room, bounds)
    }
}

/// Failures reported by a [`MemoryReader`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegionError {
    /// The region cannot be read right now, typically mid mode transition.
    #[error("collision region unavailable")]
    Unavailable,
    /// The underlying connection failed.
    #[error("memory read failed: {0}")]
    Io(String),
}

/// Failures while deriving a [`CollisionMap`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MapReadError {
    /// The game mode has no collision regime.
    #[error("game mode {0} is a transition mode without a collision map")]
    ModeTransition(GameMode),
    /// The memory reader refused the region.
    #[error("collision region unavailable")]
    Unavailable,
    /// The memory reader returned fewer or more codes than requested.
    #[error("expected {expected} collision codes but read {actual}")]
    Truncated {
        /// Number of codes covering the requested bounds.
        expected: usize,
        /// Number of codes actually returned.
        actual: usize,
    },
    /// The underlying connection failed.
    #[error("memory read failed: {0}")]
    Io(String),
}

impl MapReadError {
    /// Reports whether retrying on a later planning cycle may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

impl From<RegionError> for MapReadError {
    fn from(error: RegionError) -> Self {
        match error {
            RegionError::Unavailable => Self::Unavailable,
            RegionError::Io(message) => Self::Io(message),
        }
    }
}

/// Live identifiers and endpoints a map must cover.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapRequest {
    /// Game mode sampled together with the player position.
    pub mode: GameMode,
    /// Overworld area the player is in.
    pub area: AreaId,
    /// Dungeon room the player is in.
    pub room: RoomId,
    /// Tile currently occupied by the player.
    pub from: TileCoord,
    /// Tile the player should reach.
    pub to: TileCoord,
}

/// Derives fresh collision maps from memory.
#[derive(Clone, Debug)]
pub struct CollisionMapReader {
    encoding: TileEncoding,
    margin: u32,
}

impl CollisionMapReader {
    /// Creates a reader classifying codes with `encoding` and padding every
    /// requested region by `margin` tiles.
    #[must_use]
    pub fn new(encoding: TileEncoding, margin: u32) -> Self {
        Self { encoding, margin }
    }

    /// Encoding used to classify raw codes.
    #[must_use]
    pub fn encoding(&self) -> &TileEncoding {
        &self.encoding
    }

    /// Tiles of padding added around the endpoints of each request.
    #[must_use]
    pub fn margin(&self) -> u32 {
        self.margin
    }

    /// Reads the map covering both endpoints of `request`.
    ///
    /// Performs exactly one memory read and never writes to memory.
    pub fn read<M>(&self, memory: &mut M, request: &MapRequest) -> Result<CollisionMap, MapReadError>
    where
        M: MemoryReader + ?Sized,
    {
        let regime = request
            .mode
            .regime()
            .ok_or(MapReadError::ModeTransition(request.mode))?;
        let bounds = TileBounds::covering(request.from, request.to, self.margin, regime.extent());
        let codes = memory.read_region(request.area, request.room, bounds)?;
        if codes.len() != bounds.area() {
            return Err(MapReadError::Truncated {
                expected: bounds.area(),
                actual: codes.len(),
            });
        }

        debug!(
            "read {regime} collision map area={:#x} room={:#x} origin={} size={}x{}",
            request.area.get(),
            request.room.get(),
            bounds.origin(),
            bounds.width(),
            bounds.height()
        );

        CollisionMap::from_codes(
            &self.encoding,
            request.mode,
            request.area,
            request.room,
            bounds,
            &codes,
        )
    }
}

impl Default for CollisionMapReader {
    fn default() -> Self {
        Self::new(TileEncoding::default(), DEFAULT_REGION_MARGIN)
    }
}
