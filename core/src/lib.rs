#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the rompilot navigation engine.
//!
//! This crate defines the vocabulary spoken by the collision reader, the path
//! search and the navigation session: tile coordinates in either of the game's
//! two coordinate regimes, cardinal directions and controller buttons, the raw
//! game-mode byte, semantic tile classes and the per-regime walkable sets.
//! Nothing in here performs I/O.

use std::{error::Error, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Location of a single tile expressed in the active regime's tile space.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileCoord {
    x: u32,
    y: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based horizontal tile index.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based vertical tile index.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Tile reached by moving one step in `direction`, if it does not underflow
    /// or overflow the coordinate space.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<TileCoord> {
        match direction {
            Direction::Up => self.y.checked_sub(1).map(|y| Self::new(self.x, y)),
            Direction::Right => self.x.checked_add(1).map(|x| Self::new(x, self.y)),
            Direction::Down => self.y.checked_add(1).map(|y| Self::new(self.x, y)),
            Direction::Left => self.x.checked_sub(1).map(|x| Self::new(x, self.y)),
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned movement directions available to the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Movement toward decreasing `y`.
    Up,
    /// Movement toward increasing `x`.
    Right,
    /// Movement toward increasing `y`.
    Down,
    /// Movement toward decreasing `x`.
    Left,
}

impl Direction {
    /// Every direction in the fixed order used for neighbour expansion.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Cardinal direction leading from `from` to the 4-adjacent tile `to`.
    ///
    /// Returns `None` when the tiles are identical or not adjacent.
    #[must_use]
    pub fn between(from: TileCoord, to: TileCoord) -> Option<Direction> {
        let x_diff = from.x().abs_diff(to.x());
        let y_diff = from.y().abs_diff(to.y());
        if x_diff + y_diff != 1 {
            return None;
        }

        if x_diff == 1 {
            if to.x() > from.x() {
                Some(Direction::Right)
            } else {
                Some(Direction::Left)
            }
        } else if to.y() > from.y() {
            Some(Direction::Down)
        } else {
            Some(Direction::Up)
        }
    }

    /// Controller button that produces movement in this direction.
    #[must_use]
    pub const fn button(self) -> Button {
        match self {
            Self::Up => Button::Up,
            Self::Right => Button::Right,
            Self::Down => Button::Down,
            Self::Left => Button::Left,
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Direction {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.button().name())
    }
}

/// Controller buttons understood by the input player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    /// D-pad up.
    Up,
    /// D-pad down.
    Down,
    /// D-pad left.
    Left,
    /// D-pad right.
    Right,
    /// Face button A.
    A,
    /// Face button B.
    B,
    /// Face button X.
    X,
    /// Face button Y.
    Y,
    /// Left shoulder.
    L,
    /// Right shoulder.
    R,
    /// Start.
    Start,
    /// Select.
    Select,
}

impl Button {
    /// Wire name used by the emulator's input protocol.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::A => "A",
            Self::B => "B",
            Self::X => "X",
            Self::Y => "Y",
            Self::L => "L",
            Self::R => "R",
            Self::Start => "START",
            Self::Select => "SELECT",
        }
    }
}

impl FromStr for Button {
    type Err = UnknownButton;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let button = match value.trim().to_ascii_uppercase().as_str() {
            "UP" => Self::Up,
            "DOWN" => Self::Down,
            "LEFT" => Self::Left,
            "RIGHT" => Self::Right,
            "A" => Self::A,
            "B" => Self::B,
            "X" => Self::X,
            "Y" => Self::Y,
            "L" => Self::L,
            "R" => Self::R,
            "START" => Self::Start,
            "SELECT" => Self::Select,
            _ => return Err(UnknownButton(value.to_owned())),
        };
        Ok(button)
    }
}

/// Error returned when a button name is not part of the input protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownButton(pub String);

impl fmt::Display for UnknownButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown button name '{}'", self.0)
    }
}

impl Error for UnknownButton {}

/// Raw game-mode byte sampled from work RAM.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameMode(u8);

impl GameMode {
    /// Player is inside a dungeon room.
    pub const DUNGEON: GameMode = GameMode(0x07);
    /// Player is walking the overworld.
    pub const OVERWORLD: GameMode = GameMode(0x09);
    /// Player is in one of the special overworld areas.
    pub const SPECIAL_OVERWORLD: GameMode = GameMode(0x0B);

    /// Wraps a raw mode byte.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Raw mode byte.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Coordinate regime active under this mode.
    ///
    /// Every mode other than the dungeon and overworld gameplay modes is a
    /// transition, menu or cutscene mode without a readable collision map.
    #[must_use]
    pub const fn regime(self) -> Option<Regime> {
        match self.0 {
            0x07 => Some(Regime::Dungeon),
            0x09 | 0x0B => Some(Regime::Overworld),
            _ => None,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// One of the two coordinate and tile-semantics systems used by the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Overworld supertile grid.
    Overworld,
    /// Dungeon room-local tile grid.
    Dungeon,
}

impl Regime {
    /// Side length of one tile in screen pixels.
    #[must_use]
    pub const fn cell_size_px(self) -> u32 {
        match self {
            Self::Overworld => 16,
            Self::Dungeon => 8,
        }
    }

    /// Tile dimensions `(width, height)` of one area or room.
    #[must_use]
    pub const fn extent(self) -> (u32, u32) {
        match self {
            Self::Overworld => (64, 64),
            Self::Dungeon => (64, 64),
        }
    }

    /// Reports whether `tile` lies inside one area or room.
    #[must_use]
    pub const fn contains(self, tile: TileCoord) -> bool {
        let (width, height) = self.extent();
        tile.x() < width && tile.y() < height
    }

    /// Tiles that may be walked on under this regime.
    #[must_use]
    pub fn walkable(self) -> &'static WalkableSet {
        match self {
            Self::Overworld => &OVERWORLD_WALKABLE_TILES,
            Self::Dungeon => &WALKABLE_TILES,
        }
    }

    /// Lower-case name used in configuration files and capture strings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Overworld => "overworld",
            Self::Dungeon => "dungeon",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Regime {
    type Err = UnknownRegime;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overworld" => Ok(Self::Overworld),
            "dungeon" => Ok(Self::Dungeon),
            _ => Err(UnknownRegime(value.to_owned())),
        }
    }
}

/// Error returned when a regime name is neither `overworld` nor `dungeon`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownRegime(pub String);

impl fmt::Display for UnknownRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown regime '{}'", self.0)
    }
}

impl Error for UnknownRegime {}

/// Identifier of an overworld area.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AreaId(u16);

impl AreaId {
    /// Creates a new area identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Identifier of a dungeon room.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RoomId(u16);

impl RoomId {
    /// Creates a new room identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Start and length of the span covering `a` and `b` plus `margin` inside
/// `0..extent`.
fn covering_span(a: u32, b: u32, margin: u32, extent: u32) -> (u32, u32) {
    let last = extent.saturating_sub(1);
    let low = a.min(b).min(last).saturating_sub(margin);
    let high = a.max(b).min(last).saturating_add(margin).min(last);
    (low, high.saturating_sub(low).saturating_add(1))
}

/// Axis-aligned rectangle of tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileBounds {
    origin: TileCoord,
    width: u32,
    height: u32,
}

impl TileBounds {
    /// Constructs a rectangle from its upper-left tile and size.
    #[must_use]
    pub const fn new(origin: TileCoord, width: u32, height: u32) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Smallest rectangle covering `a` and `b` grown by `margin` tiles on every
    /// side and clipped to `extent`.
    ///
    /// Endpoints beyond `extent` are clamped onto its last row or column, so
    /// the result never reaches past the extent.
    #[must_use]
    pub fn covering(a: TileCoord, b: TileCoord, margin: u32, extent: (u32, u32)) -> Self {
        let (min_x, width) = covering_span(a.x(), b.x(), margin, extent.0);
        let (min_y, height) = covering_span(a.y(), b.y(), margin, extent.1);

        Self {
            origin: TileCoord::new(min_x, min_y),
            width,
            height,
        }
    }

    /// Upper-left tile of the rectangle.
    #[must_use]
    pub const fn origin(&self) -> TileCoord {
        self.origin
    }

    /// Width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of tiles covered by the rectangle.
    #[must_use]
    pub fn area(&self) -> usize {
        let area = u64::from(self.width) * u64::from(self.height);
        usize::try_from(area).unwrap_or(usize::MAX)
    }

    /// Reports whether the tile lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        tile.x() >= self.origin.x()
            && tile.y() >= self.origin.y()
            && tile.x() - self.origin.x() < self.width
            && tile.y() - self.origin.y() < self.height
    }

    /// Row-major offset of the tile within the rectangle.
    #[must_use]
    pub fn index(&self, tile: TileCoord) -> Option<usize> {
        if !self.contains(tile) {
            return None;
        }

        let column = usize::try_from(tile.x() - self.origin.x()).ok()?;
        let row = usize::try_from(tile.y() - self.origin.y()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

/// Semantic tile classes shared by both regimes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    /// Plain walkable ground.
    Floor,
    /// Solid terrain.
    Wall,
    /// Water the player can wade through on the overworld.
    ShallowWater,
    /// Water that requires swimming.
    DeepWater,
    /// Hole that drops the player to another floor.
    Pit,
    /// Door, stairs or entrance that moves the player elsewhere.
    Warp,
    /// Liftable or collectible object occupying the tile.
    Obstacle,
    /// Code missing from the regime's encoding table.
    Unknown,
}

/// Tile class tagged with the regime whose encoding produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassifiedTile {
    regime: Regime,
    kind: TileType,
}

impl ClassifiedTile {
    /// Tags `kind` with the regime it was classified under.
    #[must_use]
    pub const fn new(regime: Regime, kind: TileType) -> Self {
        Self { regime, kind }
    }

    /// Regime whose encoding produced the class.
    #[must_use]
    pub const fn regime(&self) -> Regime {
        self.regime
    }

    /// Semantic class of the tile.
    #[must_use]
    pub const fn kind(&self) -> TileType {
        self.kind
    }
}

/// Set of tile classes considered passable under one regime.
#[derive(Debug, PartialEq, Eq)]
pub struct WalkableSet {
    regime: Regime,
    tiles: &'static [TileType],
}

impl WalkableSet {
    /// Regime the set applies to.
    #[must_use]
    pub const fn regime(&self) -> Regime {
        self.regime
    }

    /// Tile classes contained in the set.
    #[must_use]
    pub const fn tiles(&self) -> &'static [TileType] {
        self.tiles
    }

    /// Reports whether the classified tile is passable under this set.
    ///
    /// A tile classified under the other regime is never passable.
    #[must_use]
    pub fn permits(&self, tile: ClassifiedTile) -> bool {
        tile.regime() == self.regime && self.tiles.contains(&tile.kind())
    }
}

/// Walkable tile classes inside dungeon rooms.
pub const WALKABLE_TILES: WalkableSet = WalkableSet {
    regime: Regime::Dungeon,
    tiles: &[TileType::Floor, TileType::Warp],
};

/// Walkable tile classes on the overworld.
pub const OVERWORLD_WALKABLE_TILES: WalkableSet = WalkableSet {
    regime: Regime::Overworld,
    tiles: &[TileType::Floor, TileType::ShallowWater, TileType::Warp],
};

/// Reasons a single path search may fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFailure {
    /// The frontier emptied before reaching the goal.
    Unreachable,
    /// The map does not describe the live game state.
    StaleMap,
    /// The start tile is not walkable on the map.
    StartBlocked,
    /// The goal tile is not walkable on the map.
    GoalBlocked,
}

impl SearchFailure {
    /// Reports whether retrying can never fix the failure.
    #[must_use]
    pub const fn is_structural(self) -> bool {
        matches!(self, Self::Unreachable | Self::GoalBlocked)
    }
}

impl fmt::Display for SearchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unreachable => "unreachable",
            Self::StaleMap => "stale-map",
            Self::StartBlocked => "start-blocked",
            Self::GoalBlocked => "goal-blocked",
        };
        f.write_str(label)
    }
}
