//! Collaborator interfaces consumed by the navigation session.

use std::fmt;

use rompilot_core::{AreaId, Direction, GameMode, RoomId, TileCoord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Live position reported by the game-state reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Tile occupied by the player.
    pub tile: TileCoord,
    /// Game mode active when the sample was taken.
    pub mode: GameMode,
    /// Overworld area the player is in.
    pub area: AreaId,
    /// Dungeon room the player is in.
    pub room: RoomId,
}

/// Input and observation round trips to the emulator.
///
/// Both calls block until the emulator answers and must give up with
/// [`BridgeError::Timeout`] instead of waiting indefinitely.
pub trait ExecutionBridge {
    /// Holds `direction` for `frames` frames.
    ///
    /// Returns whether the input player accepted the step command.
    fn drive(&mut self, direction: Direction, frames: u32) -> Result<bool, BridgeError>;

    /// Samples the player's tile and the current game mode.
    fn sample(&mut self) -> Result<PositionSample, BridgeError>;

    /// Lets `frames` frames pass with no button held.
    ///
    /// Bridges without a way to advance time on their own keep the default,
    /// which returns immediately.
    fn idle(&mut self, frames: u32) -> Result<(), BridgeError> {
        let _ = frames;
        Ok(())
    }
}

impl<T: ExecutionBridge + ?Sized> ExecutionBridge for &mut T {
    fn drive(&mut self, direction: Direction, frames: u32) -> Result<bool, BridgeError> {
        (**self).drive(direction, frames)
    }

    fn sample(&mut self) -> Result<PositionSample, BridgeError> {
        (**self).sample()
    }

    fn idle(&mut self, frames: u32) -> Result<(), BridgeError> {
        (**self).idle(frames)
    }
}

/// Failures crossing the emulator socket.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The emulator did not answer within the frame budget.
    #[error("emulator did not answer within {frames} frames")]
    Timeout {
        /// Frame budget that elapsed.
        frames: u32,
    },
    /// The socket closed.
    #[error("emulator connection closed")]
    Disconnected,
    /// The emulator answered with something unexpected.
    #[error("emulator protocol error: {0}")]
    Protocol(String),
}

impl BridgeError {
    /// Reports whether the failure is a timeout rather than a broken connection.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Anomaly raised by an external watchdog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anomaly {
    /// The screen went black outside of a known transition.
    BlackScreen,
    /// The frame counter stopped advancing.
    FrameStall {
        /// Frames requested without the counter moving.
        frames: u32,
    },
    /// Any other collaborator-defined anomaly.
    Other(String),
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlackScreen => write!(f, "black screen"),
            Self::FrameStall { frames } => write!(f, "frame stall over {frames} frames"),
            Self::Other(reason) => write!(f, "{reason}"),
        }
    }
}

/// Cancellation signal polled between attempts.
pub trait Interrupt {
    /// Returns the anomaly that should abort navigation, if any.
    fn poll(&mut self) -> Option<Anomaly>;
}

impl<F> Interrupt for F
where
    F: FnMut() -> Option<Anomaly>,
{
    fn poll(&mut self) -> Option<Anomaly> {
        self()
    }
}

/// Interrupt that never fires.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInterrupt;

impl Interrupt for NoInterrupt {
    fn poll(&mut self) -> Option<Anomaly> {
        None
    }
}
