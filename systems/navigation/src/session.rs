//! Planning/execution loop driving one emulator connection.

use log::{debug, info, warn};
use rompilot_collision::{CollisionMapReader, MapRequest, MemoryReader, TileEncoding};
use rompilot_core::{Direction, GameMode, TileCoord};
use rompilot_system_pathfinding::PathSearch;

use crate::{
    bridge::{BridgeError, ExecutionBridge, Interrupt, NoInterrupt, PositionSample},
    config::{ConfigError, NavConfig},
    state::{AttemptOutcome, NavAttempt, NavFailure, NavState, SessionPhase},
};

/// Owns an emulator connection and walks the player to target tiles.
///
/// Every planning cycle samples the live position, reads a fresh collision
/// map around it and searches that map; nothing survives between cycles but
/// the [`NavState`] itself.
#[derive(Debug)]
pub struct NavigationSession<C, I = NoInterrupt> {
    connection: C,
    interrupt: I,
    reader: CollisionMapReader,
    search: PathSearch,
    config: NavConfig,
    state: NavState,
    history: Vec<NavState>,
    plan_mode: Option<GameMode>,
}

impl<C> NavigationSession<C, NoInterrupt>
where
    C: ExecutionBridge + MemoryReader,
{
    /// Creates a session after validating `config`.
    pub fn new(connection: C, encoding: TileEncoding, config: NavConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            connection,
            interrupt: NoInterrupt,
            reader: CollisionMapReader::new(encoding, config.region_margin),
            search: PathSearch::new(),
            config,
            state: NavState::new(TileCoord::default()),
            history: Vec::new(),
            plan_mode: None,
        })
    }
}

impl<C, I> NavigationSession<C, I>
where
    C: ExecutionBridge + MemoryReader,
    I: Interrupt,
{
    /// Replaces the cancellation signal polled between attempts.
    pub fn with_interrupt<J: Interrupt>(self, interrupt: J) -> NavigationSession<C, J> {
        NavigationSession {
            connection: self.connection,
            interrupt,
            reader: self.reader,
            search: self.search,
            config: self.config,
            state: self.state,
            history: self.history,
            plan_mode: self.plan_mode,
        }
    }

    /// State of the running or most recent navigation.
    #[must_use]
    pub fn current_state(&self) -> &NavState {
        &self.state
    }

    /// Terminal states of every finished navigation, oldest first.
    #[must_use]
    pub fn history(&self) -> &[NavState] {
        &self.history
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    /// Borrows the emulator connection.
    #[must_use]
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Mutably borrows the emulator connection.
    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Gives the emulator connection back.
    pub fn into_connection(self) -> C {
        self.connection
    }

    /// Walks the player to `goal`, blocking until navigation ends.
    ///
    /// `start_hint` is only compared against the live sample; a disagreement
    /// is logged and the live tile is used.
    pub fn navigate(&mut self, start_hint: Option<TileCoord>, goal: TileCoord) -> NavState {
        self.state = NavState::new(goal);
        self.plan_mode = None;
        let mut hint = start_hint;
        info!("navigating to {goal}");

        while !self.state.is_terminal() {
            match self.state.phase() {
                SessionPhase::Planning | SessionPhase::Replanning => self.plan(hint.take()),
                SessionPhase::Executing => self.execute_next(),
                SessionPhase::Terminal => break,
            }
        }

        info!("navigation finished: {}", self.state.diagnostic());
        self.history.push(self.state.clone());
        self.state.clone()
    }

    fn plan(&mut self, hint: Option<TileCoord>) {
        if self.cancelled() {
            return;
        }

        let sample = match self.connection.sample() {
            Ok(sample) => sample,
            Err(err) if err.is_timeout() => {
                debug!("position sample timed out while planning: {err}");
                self.retry_planning(NavFailure::RegionUnavailable);
                return;
            }
            Err(err) => {
                self.fail_io(&err);
                return;
            }
        };

        if let Some(hint) = hint.filter(|hint| *hint != sample.tile) {
            warn!("start hint {hint} disagrees with live tile {}; using live tile", sample.tile);
        }

        if let Some(regime) = sample.mode.regime() {
            if !regime.contains(self.state.target()) {
                warn!("goal {} lies outside the {regime} extent", self.state.target());
                self.state.fail(NavFailure::GoalBlocked);
                return;
            }
            if !regime.contains(sample.tile) {
                debug!("live tile {} lies outside the {regime} extent", sample.tile);
                self.retry_planning(NavFailure::StartBlocked);
                return;
            }
        }

        let request = MapRequest {
            mode: sample.mode,
            area: sample.area,
            room: sample.room,
            from: sample.tile,
            to: self.state.target(),
        };
        let map = match self.reader.read(&mut self.connection, &request) {
            Ok(map) => map,
            Err(err) if err.is_transient() => {
                debug!("collision map not readable: {err}");
                self.retry_planning(NavFailure::RegionUnavailable);
                return;
            }
            Err(err) => {
                warn!("collision map read failed: {err}");
                self.state.fail(NavFailure::Io(err.to_string()));
                return;
            }
        };

        // The mode may have flipped while the region was being read.
        let live_mode = match self.connection.sample() {
            Ok(live) => live.mode,
            Err(err) if err.is_timeout() => {
                debug!("position sample timed out after reading the map: {err}");
                self.retry_planning(NavFailure::RegionUnavailable);
                return;
            }
            Err(err) => {
                self.fail_io(&err);
                return;
            }
        };

        match self
            .search
            .search_under(&map, live_mode, sample.tile, self.state.target())
        {
            Ok(path) => {
                debug!(
                    "planned {} -> {}: {} waypoints, {} nodes expanded",
                    sample.tile,
                    self.state.target(),
                    path.len(),
                    self.search.expanded_nodes()
                );
                self.plan_mode = Some(sample.mode);
                self.state.begin_plan(path.into_waypoints());
            }
            Err(failure) if failure.is_structural() => {
                warn!("no route from {} to {}: {failure}", sample.tile, self.state.target());
                self.state.fail(failure.into());
            }
            Err(failure) => {
                debug!("planning from {} failed: {failure}", sample.tile);
                self.retry_planning(failure.into());
            }
        }
    }

    fn execute_next(&mut self) {
        if self.cancelled() {
            return;
        }

        let Some((from, to)) = self.state.next_segment() else {
            self.verify_arrival();
            return;
        };
        let Some(direction) = Direction::between(from, to) else {
            warn!("plan segment {from} -> {to} is not a single step");
            self.request_replan(AttemptOutcome::Diverged);
            return;
        };

        let Some(attempt) = self.attempt(from, to, direction) else {
            return;
        };
        debug!(
            "attempt {from} -> {to} ({direction}): {} after {} frames",
            attempt.outcome, attempt.frames_used
        );
        self.state.record(attempt);

        if attempt.outcome == AttemptOutcome::Arrived {
            self.state.advance();
        } else {
            self.request_replan(attempt.outcome);
        }
    }

    /// Holds `direction` in polled chunks until the tile changes or the
    /// frame budget runs out. Returns `None` once the session has failed.
    fn attempt(&mut self, from: TileCoord, to: TileCoord, direction: Direction) -> Option<NavAttempt> {
        let budget = self.config.frame_budget;
        let mut frames_used = 0;
        let mut observed = from;

        let outcome = loop {
            let chunk = self.config.frames_per_poll.min(budget - frames_used);
            match self.connection.drive(direction, chunk) {
                Ok(true) => {}
                Ok(false) => break AttemptOutcome::TimedOut,
                Err(err) if err.is_timeout() => break AttemptOutcome::TimedOut,
                Err(err) => {
                    self.fail_io(&err);
                    return None;
                }
            }
            frames_used += chunk;

            let sample = match self.connection.sample() {
                Ok(sample) => sample,
                Err(err) if err.is_timeout() => break AttemptOutcome::TimedOut,
                Err(err) => {
                    self.fail_io(&err);
                    return None;
                }
            };
            observed = sample.tile;

            if !self.same_mode(&sample) {
                break AttemptOutcome::Diverged;
            }
            if observed == to {
                break AttemptOutcome::Arrived;
            }
            if observed != from {
                break AttemptOutcome::Diverged;
            }
            if frames_used >= budget {
                break AttemptOutcome::Blocked;
            }
        };

        Some(NavAttempt {
            from,
            to,
            direction,
            frame_budget: budget,
            frames_used,
            observed,
            outcome,
        })
    }

    fn verify_arrival(&mut self) {
        match self.connection.sample() {
            Ok(sample) if sample.tile == self.state.target() && self.same_mode(&sample) => {
                self.state.arrive();
            }
            Ok(sample) => {
                debug!(
                    "plan consumed but player stands on {} instead of {}",
                    sample.tile,
                    self.state.target()
                );
                self.request_replan(AttemptOutcome::Diverged);
            }
            Err(err) if err.is_timeout() => self.request_replan(AttemptOutcome::TimedOut),
            Err(err) => self.fail_io(&err),
        }
    }

    fn same_mode(&self, sample: &PositionSample) -> bool {
        self.plan_mode.map_or(true, |mode| mode == sample.mode)
    }

    fn request_replan(&mut self, outcome: AttemptOutcome) {
        if self.state.replans() < self.config.max_replans {
            self.state.begin_replan();
            info!(
                "replanning after {outcome} ({}/{})",
                self.state.replans(),
                self.config.max_replans
            );
        } else {
            warn!("giving up after {} replans, last attempt {outcome}", self.state.replans());
            self.state.block(NavFailure::ReplansExhausted { last: outcome });
        }
    }

    /// Consumes one planning retry, letting `frames_per_poll` frames pass
    /// first so a player caught mid motion or mid transition can settle.
    fn retry_planning(&mut self, cause: NavFailure) {
        if self.state.planning_retries() < self.config.max_planning_retries {
            self.state.count_planning_retry();
            debug!(
                "retrying planning after {cause} ({}/{})",
                self.state.planning_retries(),
                self.config.max_planning_retries
            );
            match self.connection.idle(self.config.frames_per_poll) {
                Ok(()) => {}
                Err(err) if err.is_timeout() => debug!("idle frames timed out: {err}"),
                Err(err) => self.fail_io(&err),
            }
        } else {
            warn!("planning kept failing: {cause}");
            self.state.block(cause);
        }
    }

    fn cancelled(&mut self) -> bool {
        match self.interrupt.poll() {
            Some(anomaly) => {
                warn!("navigation cancelled: {anomaly}");
                self.state.block(NavFailure::Cancelled(anomaly));
                true
            }
            None => false,
        }
    }

    fn fail_io(&mut self, err: &BridgeError) {
        warn!("emulator connection failed: {err}");
        self.state.fail(NavFailure::Io(err.to_string()));
    }
}
