#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame-stepped stand-in for a live emulator connection.
//!
//! [`SimulatedConsole`] answers the same memory reads, step commands and
//! position samples a real emulator socket would, over rooms described as raw
//! collision codes. It can also misbehave on request: hidden obstacles that
//! only show up in memory once bumped into, scripted knockback, regions that
//! stay unreadable for a few reads, a player that never moves, rejected
//! inputs and a connection that drops.

mod scenario;

use std::collections::BTreeMap;

use log::{debug, trace};
use rompilot_collision::{MemoryReader, RegionError, TileEncoding};
use rompilot_core::{AreaId, Button, Direction, GameMode, RoomId, TileBounds, TileCoord};
use rompilot_system_navigation::{BridgeError, ExecutionBridge, PositionSample};

pub use scenario::{HiddenObstacle, KnockbackSpec, Room, Scenario, ScenarioError, GLYPHS};

/// Code reported for tiles outside a room's stored grid.
pub const OUT_OF_ROOM_CODE: u8 = 0x01;

const DEFAULT_FRAMES_PER_TILE: u32 = 8;

/// Position override applied once a trigger count is reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Displacement {
    after: u32,
    to: TileCoord,
}

/// Emulator double driven entirely by explicit inputs.
#[derive(Clone, Debug)]
pub struct SimulatedConsole {
    rooms: BTreeMap<(AreaId, RoomId), Room>,
    encoding: TileEncoding,
    mode: GameMode,
    area: AreaId,
    room: RoomId,
    position: TileCoord,
    frames_per_tile: u32,
    held: Option<(Direction, u32)>,
    hidden: BTreeMap<TileCoord, u8>,
    knockback: Option<Displacement>,
    settle: Option<Displacement>,
    mode_switch: Option<(u32, GameMode)>,
    unavailable_reads: u32,
    frozen: bool,
    rejects_input: bool,
    disconnect_after_drives: Option<u32>,
    disconnected: bool,
    frame: u64,
    steps: u32,
    drives: u32,
    reads: u32,
    inputs: Vec<(Button, u32)>,
}

impl SimulatedConsole {
    /// Places the player on `start` inside `room` under `mode`.
    #[must_use]
    pub fn new(mode: GameMode, area: AreaId, room_id: RoomId, room: Room, start: TileCoord) -> Self {
        let mut rooms = BTreeMap::new();
        let _ = rooms.insert((area, room_id), room);
        Self {
            rooms,
            encoding: TileEncoding::default(),
            mode,
            area,
            room: room_id,
            position: start,
            frames_per_tile: DEFAULT_FRAMES_PER_TILE,
            held: None,
            hidden: BTreeMap::new(),
            knockback: None,
            settle: None,
            mode_switch: None,
            unavailable_reads: 0,
            frozen: false,
            rejects_input: false,
            disconnect_after_drives: None,
            disconnected: false,
            frame: 0,
            steps: 0,
            drives: 0,
            reads: 0,
            inputs: Vec::new(),
        }
    }

    /// Classifies movement with `encoding` instead of the built-in tables.
    #[must_use]
    pub fn with_encoding(mut self, encoding: TileEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Frames a direction must be held to cross one tile.
    #[must_use]
    pub fn with_frames_per_tile(mut self, frames: u32) -> Self {
        self.frames_per_tile = frames.max(1);
        self
    }

    /// Blocks `tile` while memory still reports it as before; bumping into it
    /// writes `code` into the room.
    #[must_use]
    pub fn with_hidden_obstacle(mut self, tile: TileCoord, code: u8) -> Self {
        let _ = self.hidden.insert(tile, code);
        self
    }

    /// Pushes the player to `to` right after its `after_steps`-th step.
    #[must_use]
    pub fn with_knockback(mut self, after_steps: u32, to: TileCoord) -> Self {
        self.knockback = Some(Displacement {
            after: after_steps,
            to,
        });
        self
    }

    /// Moves the player to `to` once `after_reads` region reads were served.
    #[must_use]
    pub fn with_settle(mut self, after_reads: u32, to: TileCoord) -> Self {
        self.settle = Some(Displacement {
            after: after_reads,
            to,
        });
        self
    }

    /// Switches to `mode` right after the `after_reads`-th region read was
    /// served, as when a transition starts while memory is being read.
    #[must_use]
    pub fn with_mode_switch(mut self, after_reads: u32, mode: GameMode) -> Self {
        self.mode_switch = Some((after_reads, mode));
        self
    }

    /// Refuses the next `reads` region reads as if mid transition.
    #[must_use]
    pub fn with_unavailable_reads(mut self, reads: u32) -> Self {
        self.unavailable_reads = reads;
        self
    }

    /// Keeps the player in place whatever is pressed.
    #[must_use]
    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    /// Answers every step command with "not accepted".
    #[must_use]
    pub fn rejecting_input(mut self) -> Self {
        self.rejects_input = true;
        self
    }

    /// Drops the connection on the step command after the first `drives`.
    #[must_use]
    pub fn with_disconnect_after_drives(mut self, drives: u32) -> Self {
        self.disconnect_after_drives = Some(drives);
        self
    }

    /// Tile the player stands on.
    #[must_use]
    pub fn position(&self) -> TileCoord {
        self.position
    }

    /// Active game mode.
    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Switches the game mode, for example to simulate a transition.
    pub fn set_mode(&mut self, mode: GameMode) {
        self.mode = mode;
    }

    /// Frames elapsed since power-on.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Tiles walked so far.
    #[must_use]
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Region reads requested so far, served or not.
    #[must_use]
    pub fn reads(&self) -> u32 {
        self.reads
    }

    /// Room the player is in.
    #[must_use]
    pub fn current_room(&self) -> Option<&Room> {
        self.rooms.get(&(self.area, self.room))
    }

    /// Buttons pressed so far together with how long each was held.
    #[must_use]
    pub fn inputs(&self) -> &[(Button, u32)] {
        &self.inputs
    }

    /// Input log in wire form, e.g. `"UP:8"`.
    #[must_use]
    pub fn input_log(&self) -> Vec<String> {
        self.inputs
            .iter()
            .map(|(button, frames)| format!("{}:{frames}", button.name()))
            .collect()
    }

    fn ensure_connected(&self) -> Result<(), BridgeError> {
        if self.disconnected {
            Err(BridgeError::Disconnected)
        } else {
            Ok(())
        }
    }

    fn can_enter(&self, tile: TileCoord) -> bool {
        let Some(regime) = self.mode.regime() else {
            return false;
        };
        let Some(room) = self.current_room() else {
            return false;
        };
        let classified = self.encoding.classify(room.code(tile), regime);
        regime.walkable().permits(classified)
    }

    /// Moves one tile; returns whether the held input keeps pushing.
    fn try_step(&mut self, direction: Direction) -> bool {
        let Some(target) = self.position.step(direction) else {
            return false;
        };
        if let Some(code) = self.hidden.remove(&target) {
            debug!("bumped into hidden obstacle at {target}");
            if let Some(room) = self.rooms.get_mut(&(self.area, self.room)) {
                room.set_code(target, code);
            }
            return false;
        }
        if !self.can_enter(target) {
            return false;
        }

        self.position = target;
        self.steps += 1;
        trace!("stepped {direction} to {target}");

        if let Some(knockback) = self.knockback.filter(|k| k.after == self.steps) {
            debug!("knocked back from {target} to {}", knockback.to);
            self.position = knockback.to;
            self.knockback = None;
            return false;
        }
        true
    }
}

impl ExecutionBridge for SimulatedConsole {
    fn drive(&mut self, direction: Direction, frames: u32) -> Result<bool, BridgeError> {
        self.ensure_connected()?;
        self.drives += 1;
        if self
            .disconnect_after_drives
            .is_some_and(|limit| self.drives > limit)
        {
            self.disconnected = true;
            return Err(BridgeError::Disconnected);
        }

        self.inputs.push((direction.button(), frames));
        if self.rejects_input {
            return Ok(false);
        }
        self.frame += u64::from(frames);
        if self.frozen {
            return Ok(true);
        }

        let mut held = match self.held {
            Some((current, held)) if current == direction => held + frames,
            _ => frames,
        };
        while held >= self.frames_per_tile {
            held -= self.frames_per_tile;
            if !self.try_step(direction) {
                held = 0;
                break;
            }
        }
        self.held = Some((direction, held));
        Ok(true)
    }

    fn idle(&mut self, frames: u32) -> Result<(), BridgeError> {
        self.ensure_connected()?;
        self.frame += u64::from(frames);
        self.held = None;
        Ok(())
    }

    fn sample(&mut self) -> Result<PositionSample, BridgeError> {
        self.ensure_connected()?;
        Ok(PositionSample {
            tile: self.position,
            mode: self.mode,
            area: self.area,
            room: self.room,
        })
    }
}

impl MemoryReader for SimulatedConsole {
    fn read_region(
        &mut self,
        area: AreaId,
        room: RoomId,
        bounds: TileBounds,
    ) -> Result<Vec<u8>, RegionError> {
        if self.disconnected {
            return Err(RegionError::Io("emulator connection closed".to_owned()));
        }
        self.reads += 1;
        if self.unavailable_reads > 0 {
            self.unavailable_reads -= 1;
            return Err(RegionError::Unavailable);
        }
        if self.mode.regime().is_none() {
            return Err(RegionError::Unavailable);
        }
        let stored = self.rooms.get(&(area, room)).ok_or(RegionError::Unavailable)?;

        let origin = bounds.origin();
        let mut codes = Vec::with_capacity(bounds.area());
        for y in origin.y()..origin.y() + bounds.height() {
            for x in origin.x()..origin.x() + bounds.width() {
                codes.push(stored.code(TileCoord::new(x, y)));
            }
        }

        if let Some(settle) = self.settle.filter(|s| s.after == self.reads) {
            debug!("player settled from {} to {}", self.position, settle.to);
            self.position = settle.to;
            self.settle = None;
        }
        if let Some((_, mode)) = self.mode_switch.filter(|(after, _)| *after == self.reads) {
            debug!("game mode switched from {} to {mode}", self.mode);
            self.mode = mode;
            self.mode_switch = None;
        }
        Ok(codes)
    }
}
