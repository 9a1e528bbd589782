use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rompilot_collision::CollisionMap;
use rompilot_core::{
    AreaId, Direction, GameMode, RoomId, SearchFailure, TileBounds, TileCoord, TileType,
};
use rompilot_system_pathfinding::{search, PathSearch};
use test_log::test;

fn grid(mode: GameMode, rows: &[&str]) -> CollisionMap {
    let height = u32::try_from(rows.len()).expect("row count fits u32");
    let width = u32::try_from(rows[0].len()).expect("column count fits u32");
    let tiles = rows
        .iter()
        .flat_map(|row| row.chars())
        .map(|glyph| match glyph {
            '.' => TileType::Floor,
            '#' => TileType::Wall,
            '~' => TileType::ShallowWater,
            'O' => TileType::Pit,
            'D' => TileType::Warp,
            other => panic!("unsupported glyph {other}"),
        })
        .collect();

    CollisionMap::from_tiles(
        mode,
        AreaId::new(0),
        RoomId::new(0),
        TileBounds::new(TileCoord::new(0, 0), width, height),
        tiles,
    )
    .expect("rows describe a rectangular map")
}

fn bfs_distance(map: &CollisionMap, start: TileCoord, goal: TileCoord) -> Option<usize> {
    let bounds = map.bounds();
    let mut distances = vec![usize::MAX; bounds.area()];
    let mut queue = VecDeque::new();
    distances[bounds.index(start)?] = 0;
    queue.push_back(start);

    while let Some(tile) = queue.pop_front() {
        let distance = distances[bounds.index(tile)?];
        if tile == goal {
            return Some(distance);
        }
        for direction in Direction::ALL {
            let Some(neighbor) = tile.step(direction) else {
                continue;
            };
            if !map.is_walkable(neighbor) {
                continue;
            }
            let Some(index) = bounds.index(neighbor) else {
                continue;
            };
            if distances[index] == usize::MAX {
                distances[index] = distance + 1;
                queue.push_back(neighbor);
            }
        }
    }

    None
}

#[test]
fn single_wall_detour_is_manhattan_optimal() {
    let map = grid(
        GameMode::DUNGEON,
        &[".....", ".....", "..#..", ".....", "....."],
    );

    let path = search(&map, TileCoord::new(0, 0), TileCoord::new(4, 4)).expect("path exists");

    assert_eq!(path.len(), 9);
    assert_eq!(path.start(), Some(TileCoord::new(0, 0)));
    assert_eq!(path.goal(), Some(TileCoord::new(4, 4)));
    assert!(!path.waypoints().contains(&TileCoord::new(2, 2)));
    assert_eq!(path.directions().count(), 8);
}

#[test]
fn goal_on_wall_fails_immediately() {
    let map = grid(GameMode::DUNGEON, &["...", ".#.", "..."]);
    let mut search = PathSearch::new();

    let result = search.search(&map, TileCoord::new(0, 0), TileCoord::new(1, 1));

    assert_eq!(result, Err(SearchFailure::GoalBlocked));
    assert_eq!(search.expanded_nodes(), 0);
}

#[test]
fn blocked_start_fails_without_expanding() {
    let map = grid(GameMode::DUNGEON, &["#..", "...", "..."]);
    let mut search = PathSearch::new();

    let result = search.search(&map, TileCoord::new(0, 0), TileCoord::new(2, 2));

    assert_eq!(result, Err(SearchFailure::StartBlocked));
    assert_eq!(search.expanded_nodes(), 0);
}

#[test]
fn identical_start_and_goal_yield_single_waypoint() {
    let map = grid(GameMode::DUNGEON, &["...", "...", "..."]);

    let path = search(&map, TileCoord::new(1, 1), TileCoord::new(1, 1)).expect("trivial path");

    assert_eq!(path.waypoints(), &[TileCoord::new(1, 1)]);
    assert_eq!(path.segments().count(), 0);
}

#[test]
fn walled_off_goal_is_unreachable() {
    let map = grid(GameMode::DUNGEON, &["..#..", "..#..", "..#.."]);

    let result = search(&map, TileCoord::new(0, 1), TileCoord::new(4, 1));

    assert_eq!(result, Err(SearchFailure::Unreachable));
}

#[test]
fn endpoints_outside_the_map_report_stale_map() {
    let map = grid(GameMode::DUNGEON, &["...", "..."]);

    assert_eq!(
        search(&map, TileCoord::new(5, 0), TileCoord::new(0, 0)),
        Err(SearchFailure::StaleMap)
    );
    assert_eq!(
        search(&map, TileCoord::new(0, 0), TileCoord::new(0, 7)),
        Err(SearchFailure::StaleMap)
    );
}

#[test]
fn mode_change_invalidates_map() {
    let map = grid(GameMode::DUNGEON, &["...", "..."]);
    let mut search = PathSearch::new();

    let result = search.search_under(
        &map,
        GameMode::OVERWORLD,
        TileCoord::new(0, 0),
        TileCoord::new(2, 1),
    );

    assert_eq!(result, Err(SearchFailure::StaleMap));
    assert_eq!(search.expanded_nodes(), 0);
    assert!(search
        .search_under(&map, GameMode::DUNGEON, TileCoord::new(0, 0), TileCoord::new(2, 1))
        .is_ok());
}

#[test]
fn equal_cost_ties_follow_insertion_order() {
    let map = grid(GameMode::DUNGEON, &["...", "...", "..."]);

    let path = search(&map, TileCoord::new(0, 0), TileCoord::new(2, 2)).expect("path exists");

    assert_eq!(
        path.waypoints(),
        &[
            TileCoord::new(0, 0),
            TileCoord::new(1, 0),
            TileCoord::new(2, 0),
            TileCoord::new(2, 1),
            TileCoord::new(2, 2),
        ]
    );
}

#[test]
fn repeated_searches_return_identical_paths() {
    let map = grid(
        GameMode::OVERWORLD,
        &[
            "........", ".##.##..", ".#....#.", ".#.##.#.", "...#....", ".#...#..",
        ],
    );
    let mut reused = PathSearch::new();

    let first = reused.search(&map, TileCoord::new(0, 0), TileCoord::new(7, 5));
    let second = reused.search(&map, TileCoord::new(0, 0), TileCoord::new(7, 5));
    let fresh = search(&map, TileCoord::new(0, 0), TileCoord::new(7, 5));

    assert!(first.is_ok());
    assert_eq!(first, second);
    assert_eq!(first, fresh);
}

#[test]
fn shallow_water_is_walkable_only_on_the_overworld() {
    let rows = ["~~~", "~#~", "~~~"];
    let overworld = grid(GameMode::OVERWORLD, &rows);
    let dungeon = grid(GameMode::DUNGEON, &rows);

    assert!(search(&overworld, TileCoord::new(0, 0), TileCoord::new(2, 2)).is_ok());
    assert_eq!(
        search(&dungeon, TileCoord::new(0, 0), TileCoord::new(2, 2)),
        Err(SearchFailure::StartBlocked)
    );
}

#[test]
fn paths_cross_warps_but_not_pits() {
    let map = grid(GameMode::DUNGEON, &["...", "O#D", "..."]);

    let path = search(&map, TileCoord::new(0, 0), TileCoord::new(0, 2)).expect("door is open");

    assert_eq!(path.len(), 7);
    assert!(path.waypoints().contains(&TileCoord::new(2, 1)));
    assert!(!path.waypoints().contains(&TileCoord::new(0, 1)));
}

#[test]
fn path_lengths_match_breadth_first_search_on_random_grids() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed_a57a);
    let mut search = PathSearch::new();
    let mut compared = 0;

    for _ in 0..200 {
        let width = rng.gen_range(2..=9);
        let height = rng.gen_range(2..=9);
        let tiles: Vec<TileType> = (0..width * height)
            .map(|_| {
                if rng.gen_bool(0.3) {
                    TileType::Wall
                } else {
                    TileType::Floor
                }
            })
            .collect();
        let map = CollisionMap::from_tiles(
            GameMode::DUNGEON,
            AreaId::new(0),
            RoomId::new(0),
            TileBounds::new(TileCoord::new(0, 0), width, height),
            tiles,
        )
        .expect("generated tiles cover bounds");

        let start = TileCoord::new(rng.gen_range(0..width), rng.gen_range(0..height));
        let goal = TileCoord::new(rng.gen_range(0..width), rng.gen_range(0..height));
        if !map.is_walkable(start) || !map.is_walkable(goal) {
            continue;
        }

        let expected = bfs_distance(&map, start, goal);
        match search.search(&map, start, goal) {
            Ok(path) => {
                assert_eq!(Some(path.len() - 1), expected, "{start} -> {goal}");
                for (from, to) in path.segments() {
                    assert!(Direction::between(from, to).is_some());
                    assert!(map.is_walkable(to));
                }
            }
            Err(failure) => {
                assert_eq!(failure, SearchFailure::Unreachable);
                assert_eq!(expected, None, "{start} -> {goal}");
            }
        }
        compared += 1;
    }

    assert!(compared > 50, "too few walkable endpoint pairs: {compared}");
}
