//! Rooms and scripted misbehaviour loaded from TOML scenario files.

use rompilot_core::{AreaId, GameMode, RoomId, TileCoord};
use serde::Deserialize;
use thiserror::Error;

use crate::{SimulatedConsole, OUT_OF_ROOM_CODE};

/// Glyphs accepted in room rows and the raw code each one stands for.
pub const GLYPHS: [(char, u8); 9] = [
    ('.', 0x00),
    ('#', 0x01),
    (',', 0x40),
    ('~', 0x09),
    ('W', 0x08),
    ('O', 0x20),
    ('D', 0x80),
    ('S', 0x1d),
    ('b', 0x50),
];

/// Raw collision codes of one room in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Room {
    width: u32,
    height: u32,
    codes: Vec<u8>,
}

impl Room {
    /// Wraps `codes` covering a `width` x `height` grid.
    pub fn new(width: u32, height: u32, codes: Vec<u8>) -> Result<Self, ScenarioError> {
        let expected = width as usize * height as usize;
        if width == 0 || height == 0 {
            return Err(ScenarioError::EmptyRoom);
        }
        if codes.len() != expected {
            return Err(ScenarioError::CodeCount {
                expected,
                actual: codes.len(),
            });
        }
        Ok(Self {
            width,
            height,
            codes,
        })
    }

    /// Parses a room drawn with [`GLYPHS`], one string per row.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, ScenarioError> {
        let first = rows.first().ok_or(ScenarioError::EmptyRoom)?;
        let width = first.as_ref().chars().count();
        let mut codes = Vec::with_capacity(width * rows.len());

        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let actual = line.chars().count();
            if actual != width {
                return Err(ScenarioError::RaggedRow {
                    row,
                    expected: width,
                    actual,
                });
            }
            for (column, glyph) in line.chars().enumerate() {
                let code = GLYPHS
                    .iter()
                    .find_map(|&(candidate, code)| (candidate == glyph).then_some(code))
                    .ok_or(ScenarioError::UnknownGlyph { glyph, row, column })?;
                codes.push(code);
            }
        }

        let width = u32::try_from(width).map_err(|_| ScenarioError::TooLarge)?;
        let height = u32::try_from(rows.len()).map_err(|_| ScenarioError::TooLarge)?;
        Self::new(width, height, codes)
    }

    /// Width in tiles.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw code at `tile`, or [`OUT_OF_ROOM_CODE`] outside the grid.
    #[must_use]
    pub fn code(&self, tile: TileCoord) -> u8 {
        self.index(tile)
            .map_or(OUT_OF_ROOM_CODE, |index| self.codes[index])
    }

    pub(crate) fn set_code(&mut self, tile: TileCoord, code: u8) {
        if let Some(index) = self.index(tile) {
            self.codes[index] = code;
        }
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        if tile.x() >= self.width || tile.y() >= self.height {
            return None;
        }
        Some(tile.y() as usize * self.width as usize + tile.x() as usize)
    }
}

/// Failures while loading a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The TOML document did not match the scenario schema.
    #[error("invalid scenario: {0}")]
    Parse(#[from] toml::de::Error),
    /// The room has no tiles.
    #[error("room has no tiles")]
    EmptyRoom,
    /// The room does not fit tile coordinates.
    #[error("room is too large")]
    TooLarge,
    /// A row is shorter or longer than the first one.
    #[error("row {row} has {actual} tiles, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        actual: usize,
    },
    /// A glyph outside [`GLYPHS`].
    #[error("unknown glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        column: usize,
    },
    /// Raw codes do not cover the declared size.
    #[error("expected {expected} codes, got {actual}")]
    CodeCount {
        /// Width times height.
        expected: usize,
        /// Codes supplied.
        actual: usize,
    },
    /// The scenario starts in a mode without collision data.
    #[error("game mode {0} has no collision regime")]
    NoRegime(GameMode),
}

/// Tile that blocks movement before memory shows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HiddenObstacle {
    /// Tile position `[x, y]`.
    pub at: [u32; 2],
    /// Code written into memory once the player bumps into it.
    pub code: u8,
}

/// One-shot knockback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KnockbackSpec {
    /// Number of steps after which the knockback fires.
    pub after_steps: u32,
    /// Tile position `[x, y]` the player lands on.
    pub to: [u32; 2],
}

/// Complete description of a simulated navigation run.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Raw game mode byte.
    pub mode: u8,
    /// Overworld area identifier.
    #[serde(default)]
    pub area: u16,
    /// Dungeon room identifier.
    #[serde(default)]
    pub room: u16,
    /// Player tile `[x, y]` at power-on.
    pub start: [u32; 2],
    /// Tile `[x, y]` to navigate to.
    pub goal: [u32; 2],
    /// Frames needed to cross one tile.
    #[serde(default)]
    pub frames_per_tile: Option<u32>,
    /// Room drawn with [`GLYPHS`].
    pub rows: Vec<String>,
    /// Obstacles memory does not show yet.
    #[serde(default)]
    pub hidden: Vec<HiddenObstacle>,
    /// Optional knockback.
    #[serde(default)]
    pub knockback: Option<KnockbackSpec>,
    /// Region reads refused before memory becomes readable.
    #[serde(default)]
    pub unavailable_reads: u32,
    /// Whether the player ignores every input.
    #[serde(default)]
    pub frozen: bool,
}

impl Scenario {
    /// Parses a scenario from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(text)?)
    }

    /// Player tile at power-on.
    #[must_use]
    pub fn start(&self) -> TileCoord {
        coord(self.start)
    }

    /// Tile to navigate to.
    #[must_use]
    pub fn goal(&self) -> TileCoord {
        coord(self.goal)
    }

    /// Game mode at power-on.
    #[must_use]
    pub fn game_mode(&self) -> GameMode {
        GameMode::new(self.mode)
    }

    /// Builds a console in the scenario's initial state.
    pub fn console(&self) -> Result<SimulatedConsole, ScenarioError> {
        let mode = self.game_mode();
        if mode.regime().is_none() {
            return Err(ScenarioError::NoRegime(mode));
        }
        let room = Room::from_rows(&self.rows)?;

        let mut console = SimulatedConsole::new(
            mode,
            AreaId::new(self.area),
            RoomId::new(self.room),
            room,
            self.start(),
        )
        .with_unavailable_reads(self.unavailable_reads);
        if let Some(frames) = self.frames_per_tile {
            console = console.with_frames_per_tile(frames);
        }
        for obstacle in &self.hidden {
            console = console.with_hidden_obstacle(coord(obstacle.at), obstacle.code);
        }
        if let Some(knockback) = self.knockback {
            console = console.with_knockback(knockback.after_steps, coord(knockback.to));
        }
        if self.frozen {
            console = console.frozen();
        }
        Ok(console)
    }
}

fn coord([x, y]: [u32; 2]) -> TileCoord {
    TileCoord::new(x, y)
}
