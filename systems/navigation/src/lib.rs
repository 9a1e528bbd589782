#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Navigation session that drives a planned path against a live emulator.
//!
//! A [`NavigationSession`] owns the emulator connection for as long as it
//! exists. Each call to [`NavigationSession::navigate`] runs the full
//! plan/execute/replan state machine to a terminal [`NavState`]: the session
//! samples the live position, reads a fresh collision map, searches it, and
//! walks the path one [`NavAttempt`] per segment, replanning a bounded number
//! of times when the live game disagrees with the plan.

mod bridge;
mod config;
mod session;
mod state;

pub use bridge::{Anomaly, BridgeError, ExecutionBridge, Interrupt, NoInterrupt, PositionSample};
pub use config::{ConfigError, NavConfig};
pub use session::NavigationSession;
pub use state::{AttemptOutcome, NavAttempt, NavFailure, NavState, NavStatus, SessionPhase};
