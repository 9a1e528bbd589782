use rompilot_collision::TileEncoding;
use rompilot_core::{AreaId, GameMode, RoomId, TileCoord};
use rompilot_emulator::{Room, SimulatedConsole};
use rompilot_system_navigation::{
    Anomaly, AttemptOutcome, NavConfig, NavFailure, NavState, NavStatus, NavigationSession,
    SessionPhase,
};
use test_log::test;

const OPEN_ROOM: [&str; 5] = ["#######", "#.....#", "#.....#", "#.....#", "#######"];

fn console(rows: &[&str], start: TileCoord) -> SimulatedConsole {
    SimulatedConsole::new(
        GameMode::DUNGEON,
        AreaId::new(0),
        RoomId::new(0),
        Room::from_rows(rows).expect("valid rows"),
        start,
    )
}

fn session(console: SimulatedConsole) -> NavigationSession<SimulatedConsole> {
    NavigationSession::new(console, TileEncoding::default(), NavConfig::default())
        .expect("default config is valid")
}

fn outcomes(state: &NavState) -> Vec<AttemptOutcome> {
    state.attempts().iter().map(|attempt| attempt.outcome).collect()
}

#[test]
fn ideal_run_takes_one_attempt_per_segment() {
    let mut session = session(console(&OPEN_ROOM, TileCoord::new(1, 1)));
    let goal = TileCoord::new(5, 3);

    let state = session.navigate(None, goal);

    assert_eq!(state.status(), NavStatus::Arrived, "{}", state.diagnostic());
    assert_eq!(state.phase(), SessionPhase::Terminal);
    assert_eq!(state.plan().len(), 7);
    assert_eq!(state.attempts().len(), state.plan().len() - 1);
    assert!(outcomes(&state)
        .iter()
        .all(|outcome| *outcome == AttemptOutcome::Arrived));
    assert_eq!(state.replans(), 0);
    assert_eq!(state.failure(), None);
    assert_eq!(session.connection().position(), goal);
    assert_eq!(session.connection().input_log().len(), 6);
}

#[test]
fn frozen_player_exhausts_replans() {
    let mut session = session(console(&OPEN_ROOM, TileCoord::new(1, 1)).frozen());

    let state = session.navigate(None, TileCoord::new(4, 1));

    let max_replans = NavConfig::default().max_replans;
    assert_eq!(state.status(), NavStatus::Blocked);
    assert_eq!(state.replans(), max_replans);
    assert_eq!(state.attempts().len(), max_replans as usize + 1);
    assert_eq!(
        state.failure(),
        Some(&NavFailure::ReplansExhausted {
            last: AttemptOutcome::Blocked
        })
    );
    let last = state.last_attempt().expect("attempts were made");
    assert_eq!(last.frames_used, NavConfig::default().frame_budget);
    assert_eq!(last.observed, TileCoord::new(1, 1));
}

#[test]
fn standing_on_the_goal_arrives_without_attempts() {
    let mut session = session(console(&OPEN_ROOM, TileCoord::new(2, 2)));

    let state = session.navigate(Some(TileCoord::new(2, 2)), TileCoord::new(2, 2));

    assert_eq!(state.status(), NavStatus::Arrived);
    assert!(state.attempts().is_empty());
    assert_eq!(state.plan(), &[TileCoord::new(2, 2)]);
    assert!(session.connection().inputs().is_empty());
}

#[test]
fn hidden_obstacle_forces_a_detour() {
    let rows = ["#######", "#.....#", "#.###.#", "#.....#", "#######"];
    let console = console(&rows, TileCoord::new(1, 1)).with_hidden_obstacle(TileCoord::new(3, 1), 0x50);
    let mut session = session(console);

    let state = session.navigate(None, TileCoord::new(5, 1));

    assert_eq!(state.status(), NavStatus::Arrived, "{}", state.diagnostic());
    assert_eq!(state.replans(), 1);
    let blocked: Vec<_> = state
        .attempts()
        .iter()
        .filter(|attempt| attempt.outcome == AttemptOutcome::Blocked)
        .collect();
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].to, TileCoord::new(3, 1));
    assert!(!state.plan().contains(&TileCoord::new(3, 1)));
    assert_eq!(session.connection().position(), TileCoord::new(5, 1));
}

#[test]
fn knockback_is_replanned_from_the_live_tile() {
    let rows = ["#######", "#.....#", "#######"];
    let console = console(&rows, TileCoord::new(1, 1)).with_knockback(2, TileCoord::new(1, 1));
    let mut session = session(console);

    let state = session.navigate(None, TileCoord::new(5, 1));

    assert_eq!(state.status(), NavStatus::Arrived);
    assert_eq!(state.replans(), 1);
    assert_eq!(
        outcomes(&state),
        vec![
            AttemptOutcome::Arrived,
            AttemptOutcome::Diverged,
            AttemptOutcome::Arrived,
            AttemptOutcome::Arrived,
            AttemptOutcome::Arrived,
            AttemptOutcome::Arrived,
        ]
    );
    let diverged = state.attempts()[1];
    assert_eq!(diverged.observed, TileCoord::new(1, 1));
    assert_eq!(state.plan().first(), Some(&TileCoord::new(1, 1)));
}

#[test]
fn rejected_inputs_time_out() {
    let mut session = session(console(&OPEN_ROOM, TileCoord::new(1, 1)).rejecting_input());

    let state = session.navigate(None, TileCoord::new(3, 1));

    assert_eq!(state.status(), NavStatus::Blocked);
    assert_eq!(
        state.failure(),
        Some(&NavFailure::ReplansExhausted {
            last: AttemptOutcome::TimedOut
        })
    );
    assert!(state.attempts().iter().all(|attempt| attempt.frames_used == 0));
}

#[test]
fn blocked_start_is_retried_until_the_player_settles() {
    let rows = ["#####", "#b..#", "#####"];
    let console = console(&rows, TileCoord::new(1, 1)).with_settle(1, TileCoord::new(2, 1));
    let mut session = session(console);

    let state = session.navigate(None, TileCoord::new(3, 1));

    assert_eq!(state.status(), NavStatus::Arrived, "{}", state.diagnostic());
    assert_eq!(state.planning_retries(), 1);
    assert_eq!(state.attempts().len(), 1);
}

#[test]
fn permanently_blocked_start_gives_up() {
    let rows = ["#####", "#b..#", "#####"];
    let mut session = session(console(&rows, TileCoord::new(1, 1)));

    let state = session.navigate(None, TileCoord::new(3, 1));

    assert_eq!(state.status(), NavStatus::Blocked);
    assert_eq!(state.failure(), Some(&NavFailure::StartBlocked));
    assert_eq!(
        state.planning_retries(),
        NavConfig::default().max_planning_retries
    );
    assert!(state.attempts().is_empty());
}

#[test]
fn unavailable_regions_are_retried() {
    let console = console(&OPEN_ROOM, TileCoord::new(1, 1)).with_unavailable_reads(2);
    let mut session = session(console);

    let state = session.navigate(None, TileCoord::new(2, 1));

    assert_eq!(state.status(), NavStatus::Arrived);
    assert_eq!(state.planning_retries(), 2);
    assert_eq!(session.connection().reads(), 3);
    // Each retry idles one poll interval before the single step is driven.
    let poll = u64::from(NavConfig::default().frames_per_poll);
    assert_eq!(session.connection().frame(), 3 * poll);
}

#[test]
fn mode_change_during_the_map_read_is_retried_as_stale() {
    let console = console(&OPEN_ROOM, TileCoord::new(1, 1)).with_mode_switch(1, GameMode::OVERWORLD);
    let mut session = session(console);

    let state = session.navigate(None, TileCoord::new(3, 1));

    assert_eq!(state.status(), NavStatus::Arrived, "{}", state.diagnostic());
    assert_eq!(state.planning_retries(), 1);
    assert_eq!(session.connection().reads(), 2);
    assert_eq!(session.connection().mode(), GameMode::OVERWORLD);
}

#[test]
fn stale_map_blocks_once_planning_retries_run_out() {
    let console = console(&OPEN_ROOM, TileCoord::new(1, 1)).with_mode_switch(1, GameMode::OVERWORLD);
    let config = NavConfig {
        max_planning_retries: 0,
        ..NavConfig::default()
    };
    let mut session = NavigationSession::new(console, TileEncoding::default(), config)
        .expect("config is valid");

    let state = session.navigate(None, TileCoord::new(3, 1));

    assert_eq!(state.status(), NavStatus::Blocked);
    assert_eq!(state.failure(), Some(&NavFailure::StaleMap));
    assert!(state.attempts().is_empty());
}

#[test]
fn goal_outside_the_room_extent_fails_without_reading_memory() {
    for goal in [TileCoord::new(3000, 3000), TileCoord::new(u32::MAX, 1)] {
        let mut session = session(console(&OPEN_ROOM, TileCoord::new(1, 1)));

        let state = session.navigate(None, goal);

        assert_eq!(state.status(), NavStatus::Failed, "{}", state.diagnostic());
        assert_eq!(state.failure(), Some(&NavFailure::GoalBlocked));
        assert_eq!(session.connection().reads(), 0);
        assert!(session.connection().inputs().is_empty());
    }
}

#[test]
fn live_tile_outside_the_room_extent_is_retried_then_blocked() {
    let mut session = session(console(&OPEN_ROOM, TileCoord::new(100, 1)));

    let state = session.navigate(None, TileCoord::new(2, 1));

    assert_eq!(state.status(), NavStatus::Blocked);
    assert_eq!(state.failure(), Some(&NavFailure::StartBlocked));
    assert_eq!(
        state.planning_retries(),
        NavConfig::default().max_planning_retries
    );
    assert_eq!(session.connection().reads(), 0);
}

#[test]
fn transition_mode_blocks_after_planning_retries() {
    let mut session = session(console(&OPEN_ROOM, TileCoord::new(1, 1)));
    session.connection_mut().set_mode(GameMode::new(0x0f));

    let state = session.navigate(None, TileCoord::new(2, 1));

    assert_eq!(state.status(), NavStatus::Blocked);
    assert_eq!(state.failure(), Some(&NavFailure::RegionUnavailable));
    assert!(state.attempts().is_empty());
}

#[test]
fn walled_goal_fails_without_moving() {
    let mut session = session(console(&OPEN_ROOM, TileCoord::new(1, 1)));

    let state = session.navigate(None, TileCoord::new(0, 2));

    assert_eq!(state.status(), NavStatus::Failed);
    assert_eq!(state.failure(), Some(&NavFailure::GoalBlocked));
    assert_eq!(state.planning_retries(), 0);
    assert!(session.connection().inputs().is_empty());
}

#[test]
fn sealed_goal_is_unreachable() {
    let rows = ["#######", "#..#..#", "#######"];
    let mut session = session(console(&rows, TileCoord::new(1, 1)));

    let state = session.navigate(None, TileCoord::new(5, 1));

    assert_eq!(state.status(), NavStatus::Failed);
    assert_eq!(state.failure(), Some(&NavFailure::Unreachable));
}

#[test]
fn interrupt_cancels_between_attempts() {
    let mut polls = 0;
    let interrupt = move || {
        polls += 1;
        (polls > 3).then_some(Anomaly::BlackScreen)
    };
    let mut session = session(console(&OPEN_ROOM, TileCoord::new(1, 1))).with_interrupt(interrupt);

    let state = session.navigate(None, TileCoord::new(5, 1));

    assert_eq!(state.status(), NavStatus::Blocked);
    assert_eq!(state.failure(), Some(&NavFailure::Cancelled(Anomaly::BlackScreen)));
    assert_eq!(state.attempts().len(), 2);
    assert_eq!(state.remaining().first(), Some(&TileCoord::new(4, 1)));
    assert_eq!(session.connection().position(), TileCoord::new(3, 1));
}

#[test]
fn dropped_connection_fails_the_session() {
    let console = console(&OPEN_ROOM, TileCoord::new(1, 1)).with_disconnect_after_drives(2);
    let mut session = session(console);

    let state = session.navigate(None, TileCoord::new(5, 1));

    assert_eq!(state.status(), NavStatus::Failed);
    assert!(matches!(state.failure(), Some(NavFailure::Io(_))));
    assert_eq!(state.attempts().len(), 2);
}

#[test]
fn live_tile_wins_over_a_wrong_start_hint() {
    let mut session = session(console(&OPEN_ROOM, TileCoord::new(1, 1)));

    let state = session.navigate(Some(TileCoord::new(4, 3)), TileCoord::new(3, 1));

    assert_eq!(state.status(), NavStatus::Arrived);
    assert_eq!(state.plan().first(), Some(&TileCoord::new(1, 1)));
    assert_eq!(state.attempts()[0].from, TileCoord::new(1, 1));
}

#[test]
fn invalid_config_is_rejected() {
    let config = NavConfig {
        frames_per_poll: 0,
        ..NavConfig::default()
    };

    let result = NavigationSession::new(
        console(&OPEN_ROOM, TileCoord::new(1, 1)),
        TileEncoding::default(),
        config,
    );

    assert!(result.is_err());
}

#[test]
fn history_archives_every_navigation_as_json() {
    let mut session = session(console(&OPEN_ROOM, TileCoord::new(1, 1)));
    let first = session.navigate(None, TileCoord::new(3, 2));
    let second = session.navigate(None, TileCoord::new(0, 0));

    assert_eq!(session.history(), &[first.clone(), second]);
    assert_eq!(session.current_state(), &session.history()[1]);

    let json = serde_json::to_string(session.history()).expect("state serialises");
    let restored: Vec<NavState> = serde_json::from_str(&json).expect("state deserialises");
    assert_eq!(restored, session.history());
    assert_eq!(restored[0].diagnostic(), first.diagnostic());
}
