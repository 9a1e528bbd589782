//! Explicit navigation state shared between planning and execution.

use std::fmt;

use rompilot_core::{Direction, SearchFailure, TileCoord};
use serde::{Deserialize, Serialize};

use crate::bridge::Anomaly;

/// How a single attempt along one path segment ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The player reached the segment's target tile.
    Arrived,
    /// The player never left the segment's start tile.
    Blocked,
    /// The player ended up somewhere else, or the game mode changed.
    Diverged,
    /// The step was not accepted or the emulator stopped answering.
    TimedOut,
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Arrived => "arrived",
            Self::Blocked => "blocked",
            Self::Diverged => "diverged",
            Self::TimedOut => "timed-out",
        };
        f.write_str(label)
    }
}

/// One bounded attempt to cross a single path segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NavAttempt {
    /// Tile the segment starts on.
    pub from: TileCoord,
    /// Tile the segment ends on.
    pub to: TileCoord,
    /// Direction held during the attempt.
    pub direction: Direction,
    /// Frames the attempt was allowed.
    pub frame_budget: u32,
    /// Frames actually driven.
    pub frames_used: u32,
    /// Tile sampled when the attempt ended.
    pub observed: TileCoord,
    /// Classification of the attempt.
    pub outcome: AttemptOutcome,
}

/// Step of the navigation state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Waiting for the first plan.
    Planning,
    /// Walking the current plan segment by segment.
    Executing,
    /// Deriving a fresh plan from the live position after a failed attempt.
    Replanning,
    /// Navigation ended; see [`NavState::status`].
    Terminal,
}

/// Externally visible result of a navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavStatus {
    /// Navigation has not reached a terminal phase.
    InProgress,
    /// The player stands on the target tile.
    Arrived,
    /// Navigation gave up after exhausting a retry budget or being cancelled.
    Blocked,
    /// Navigation can never succeed from here.
    Failed,
}

impl fmt::Display for NavStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InProgress => "in-progress",
            Self::Arrived => "arrived",
            Self::Blocked => "blocked",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Terminal cause of a blocked or failed navigation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavFailure {
    /// No walkable route connects the player to the target.
    Unreachable,
    /// The target tile itself is not walkable.
    GoalBlocked,
    /// The player kept standing on a tile the map marks as blocking.
    StartBlocked,
    /// The map kept disagreeing with the live game state.
    StaleMap,
    /// Collision memory stayed unreadable, usually during a transition.
    RegionUnavailable,
    /// Every allowed replan was spent.
    ReplansExhausted {
        /// Outcome of the final attempt.
        last: AttemptOutcome,
    },
    /// An external watchdog aborted navigation.
    Cancelled(Anomaly),
    /// The emulator connection broke.
    Io(String),
}

impl From<SearchFailure> for NavFailure {
    fn from(failure: SearchFailure) -> Self {
        match failure {
            SearchFailure::Unreachable => Self::Unreachable,
            SearchFailure::StaleMap => Self::StaleMap,
            SearchFailure::StartBlocked => Self::StartBlocked,
            SearchFailure::GoalBlocked => Self::GoalBlocked,
        }
    }
}

impl fmt::Display for NavFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => f.write_str("unreachable"),
            Self::GoalBlocked => f.write_str("goal-blocked"),
            Self::StartBlocked => f.write_str("start-blocked"),
            Self::StaleMap => f.write_str("stale-map"),
            Self::RegionUnavailable => f.write_str("region-unavailable"),
            Self::ReplansExhausted { last } => write!(f, "replans-exhausted (last {last})"),
            Self::Cancelled(anomaly) => write!(f, "cancelled ({anomaly})"),
            Self::Io(reason) => write!(f, "io ({reason})"),
        }
    }
}

/// Complete record of one navigation request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavState {
    target: TileCoord,
    plan: Vec<TileCoord>,
    next_waypoint: usize,
    attempts: Vec<NavAttempt>,
    replans: u32,
    planning_retries: u32,
    phase: SessionPhase,
    status: NavStatus,
    failure: Option<NavFailure>,
}

impl NavState {
    /// Fresh state awaiting its first plan towards `target`.
    #[must_use]
    pub fn new(target: TileCoord) -> Self {
        Self {
            target,
            plan: Vec::new(),
            next_waypoint: 0,
            attempts: Vec::new(),
            replans: 0,
            planning_retries: 0,
            phase: SessionPhase::Planning,
            status: NavStatus::InProgress,
            failure: None,
        }
    }

    /// Tile the navigation is heading for.
    #[must_use]
    pub fn target(&self) -> TileCoord {
        self.target
    }

    /// Waypoints of the current plan; empty while (re)planning.
    #[must_use]
    pub fn plan(&self) -> &[TileCoord] {
        &self.plan
    }

    /// Index of the waypoint the next attempt heads for.
    #[must_use]
    pub fn next_waypoint(&self) -> usize {
        self.next_waypoint
    }

    /// Waypoints of the current plan not reached yet.
    #[must_use]
    pub fn remaining(&self) -> &[TileCoord] {
        self.plan.get(self.next_waypoint..).unwrap_or(&[])
    }

    /// Every attempt made so far, across replans.
    #[must_use]
    pub fn attempts(&self) -> &[NavAttempt] {
        &self.attempts
    }

    /// Most recent attempt.
    #[must_use]
    pub fn last_attempt(&self) -> Option<&NavAttempt> {
        self.attempts.last()
    }

    /// Replans consumed so far.
    #[must_use]
    pub fn replans(&self) -> u32 {
        self.replans
    }

    /// Planning cycles that had to be repeated.
    #[must_use]
    pub fn planning_retries(&self) -> u32 {
        self.planning_retries
    }

    /// Current step of the state machine.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Result so far.
    #[must_use]
    pub fn status(&self) -> NavStatus {
        self.status
    }

    /// Cause of a blocked or failed navigation.
    #[must_use]
    pub fn failure(&self) -> Option<&NavFailure> {
        self.failure.as_ref()
    }

    /// Reports whether navigation has ended.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.phase == SessionPhase::Terminal
    }

    /// One-line summary suitable for logs and bug reports.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        let mut line = format!(
            "status={} target={} replans={} planning_retries={} attempts={}",
            self.status,
            self.target,
            self.replans,
            self.planning_retries,
            self.attempts.len()
        );
        if let Some(attempt) = self.last_attempt() {
            line.push_str(&format!(
                " last={} {}->{} observed={} frames={}/{}",
                attempt.outcome,
                attempt.from,
                attempt.to,
                attempt.observed,
                attempt.frames_used,
                attempt.frame_budget
            ));
        }
        if let Some(failure) = &self.failure {
            line.push_str(&format!(" failure={failure}"));
        }
        line
    }

    pub(crate) fn begin_plan(&mut self, waypoints: Vec<TileCoord>) {
        self.plan = waypoints;
        self.next_waypoint = 1;
        self.phase = SessionPhase::Executing;
    }

    /// Segment between the last reached waypoint and the next one.
    pub(crate) fn next_segment(&self) -> Option<(TileCoord, TileCoord)> {
        let from = *self.plan.get(self.next_waypoint.checked_sub(1)?)?;
        let to = *self.plan.get(self.next_waypoint)?;
        Some((from, to))
    }

    pub(crate) fn record(&mut self, attempt: NavAttempt) {
        self.attempts.push(attempt);
    }

    pub(crate) fn advance(&mut self) {
        self.next_waypoint += 1;
    }

    pub(crate) fn begin_replan(&mut self) {
        self.replans += 1;
        self.plan.clear();
        self.next_waypoint = 0;
        self.phase = SessionPhase::Replanning;
    }

    pub(crate) fn count_planning_retry(&mut self) {
        self.planning_retries += 1;
    }

    pub(crate) fn arrive(&mut self) {
        self.finish(NavStatus::Arrived, None);
    }

    pub(crate) fn block(&mut self, failure: NavFailure) {
        self.finish(NavStatus::Blocked, Some(failure));
    }

    pub(crate) fn fail(&mut self, failure: NavFailure) {
        self.finish(NavStatus::Failed, Some(failure));
    }

    fn finish(&mut self, status: NavStatus, failure: Option<NavFailure>) {
        self.phase = SessionPhase::Terminal;
        self.status = status;
        self.failure = failure;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(outcome: AttemptOutcome) -> NavAttempt {
        NavAttempt {
            from: TileCoord::new(1, 1),
            to: TileCoord::new(2, 1),
            direction: Direction::Right,
            frame_budget: 32,
            frames_used: 32,
            observed: TileCoord::new(1, 1),
            outcome,
        }
    }

    #[test]
    fn segments_follow_the_plan() {
        let mut state = NavState::new(TileCoord::new(2, 1));
        assert_eq!(state.next_segment(), None);

        state.begin_plan(vec![
            TileCoord::new(0, 1),
            TileCoord::new(1, 1),
            TileCoord::new(2, 1),
        ]);
        assert_eq!(state.phase(), SessionPhase::Executing);
        assert_eq!(
            state.next_segment(),
            Some((TileCoord::new(0, 1), TileCoord::new(1, 1)))
        );

        state.advance();
        assert_eq!(state.remaining(), &[TileCoord::new(2, 1)]);
        state.advance();
        assert_eq!(state.next_segment(), None);
        assert!(state.remaining().is_empty());
    }

    #[test]
    fn replanning_discards_the_plan() {
        let mut state = NavState::new(TileCoord::new(2, 1));
        state.begin_plan(vec![TileCoord::new(1, 1), TileCoord::new(2, 1)]);
        state.record(attempt(AttemptOutcome::Blocked));

        state.begin_replan();

        assert_eq!(state.replans(), 1);
        assert!(state.plan().is_empty());
        assert_eq!(state.phase(), SessionPhase::Replanning);
        assert_eq!(state.attempts().len(), 1);
    }

    #[test]
    fn diagnostic_names_status_attempt_and_failure() {
        let mut state = NavState::new(TileCoord::new(2, 1));
        state.record(attempt(AttemptOutcome::Blocked));
        state.block(NavFailure::ReplansExhausted {
            last: AttemptOutcome::Blocked,
        });

        let line = state.diagnostic();

        assert!(state.is_terminal());
        assert!(line.starts_with("status=blocked"), "{line}");
        assert!(line.contains("last=blocked (1, 1)->(2, 1)"), "{line}");
        assert!(
            line.contains("failure=replans-exhausted (last blocked)"),
            "{line}"
        );
        assert!(!line.contains('\n'));
    }

    #[test]
    fn search_failures_map_to_navigation_failures() {
        assert_eq!(
            NavFailure::from(SearchFailure::GoalBlocked),
            NavFailure::GoalBlocked
        );
        assert_eq!(
            NavFailure::from(SearchFailure::StaleMap),
            NavFailure::StaleMap
        );
    }
}
