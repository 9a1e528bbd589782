#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic A* search over live collision maps.
//!
//! Movement is 4-directional with a uniform step cost and a Manhattan
//! heuristic. Frontier entries with equal `f` are popped in the order they
//! were pushed, and neighbours are always generated in the order of
//! [`Direction::ALL`], so identical inputs always yield identical paths.

use std::{cmp::Ordering, collections::BinaryHeap};

use log::trace;
use rompilot_collision::CollisionMap;
use rompilot_core::{Direction, GameMode, SearchFailure, TileCoord};

/// Outcome of a single path search.
pub type NavigationResult = Result<Path, SearchFailure>;

/// Ordered waypoints from the start tile to the goal tile, both inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    waypoints: Vec<TileCoord>,
}

impl Path {
    /// Waypoints in travel order.
    #[must_use]
    pub fn waypoints(&self) -> &[TileCoord] {
        &self.waypoints
    }

    /// Number of waypoints, including the start tile.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always `false`; a path holds at least its start tile.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Tile the path starts from.
    #[must_use]
    pub fn start(&self) -> Option<TileCoord> {
        self.waypoints.first().copied()
    }

    /// Tile the path ends on.
    #[must_use]
    pub fn goal(&self) -> Option<TileCoord> {
        self.waypoints.last().copied()
    }

    /// Adjacent waypoint pairs in travel order.
    pub fn segments(&self) -> impl Iterator<Item = (TileCoord, TileCoord)> + '_ {
        self.waypoints.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Cardinal direction of every segment in travel order.
    pub fn directions(&self) -> impl Iterator<Item = Direction> + '_ {
        self.segments()
            .filter_map(|(from, to)| Direction::between(from, to))
    }

    /// Consumes the path, yielding its waypoints.
    #[must_use]
    pub fn into_waypoints(self) -> Vec<TileCoord> {
        self.waypoints
    }
}

/// Searches `map` for a shortest path from `start` to `goal`.
pub fn search(map: &CollisionMap, start: TileCoord, goal: TileCoord) -> NavigationResult {
    PathSearch::default().search(map, start, goal)
}

/// A* search with scratch buffers reused between invocations.
#[derive(Debug, Default)]
pub struct PathSearch {
    nodes: Vec<PathNode>,
    frontier: BinaryHeap<FrontierEntry>,
    best_cost: Vec<u32>,
    closed: Vec<bool>,
    sequence: u64,
    expanded: usize,
}

impl PathSearch {
    /// Creates a search with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frontier nodes expanded by the most recent search.
    #[must_use]
    pub fn expanded_nodes(&self) -> usize {
        self.expanded
    }

    /// Searches after confirming the map still matches the live game mode.
    pub fn search_under(
        &mut self,
        map: &CollisionMap,
        live_mode: GameMode,
        start: TileCoord,
        goal: TileCoord,
    ) -> NavigationResult {
        self.reset(0);
        map.ensure_mode(live_mode)?;
        self.search(map, start, goal)
    }

    /// Searches `map` for a shortest path from `start` to `goal`.
    ///
    /// Endpoints outside the map report [`SearchFailure::StaleMap`]; blocked
    /// endpoints fail before any node is expanded.
    pub fn search(
        &mut self,
        map: &CollisionMap,
        start: TileCoord,
        goal: TileCoord,
    ) -> NavigationResult {
        let bounds = map.bounds();
        self.reset(bounds.area());

        if !bounds.contains(start) || !bounds.contains(goal) {
            return Err(SearchFailure::StaleMap);
        }
        if !map.is_walkable(start) {
            return Err(SearchFailure::StartBlocked);
        }
        if !map.is_walkable(goal) {
            return Err(SearchFailure::GoalBlocked);
        }

        self.push(start, 0, start.manhattan_distance(goal), None, map);

        while let Some(entry) = self.frontier.pop() {
            let node = self.nodes[entry.node];
            let Some(index) = bounds.index(node.tile) else {
                continue;
            };
            if self.closed[index] {
                continue;
            }
            self.closed[index] = true;
            self.expanded += 1;

            if node.tile == goal {
                let path = self.reconstruct(entry.node);
                trace!(
                    "path {start} -> {goal}: {} waypoints, {} expanded",
                    path.len(),
                    self.expanded
                );
                return Ok(path);
            }

            let next_cost = node.cost + 1;
            for direction in Direction::ALL {
                let Some(neighbor) = node.tile.step(direction) else {
                    continue;
                };
                if !map.is_walkable(neighbor) {
                    continue;
                }
                let Some(neighbor_index) = bounds.index(neighbor) else {
                    continue;
                };
                if self.closed[neighbor_index] || self.best_cost[neighbor_index] <= next_cost {
                    continue;
                }

                self.push(
                    neighbor,
                    next_cost,
                    neighbor.manhattan_distance(goal),
                    Some(entry.node),
                    map,
                );
            }
        }

        trace!(
            "path {start} -> {goal}: unreachable after {} expanded",
            self.expanded
        );
        Err(SearchFailure::Unreachable)
    }

    fn reset(&mut self, cell_count: usize) {
        self.nodes.clear();
        self.frontier.clear();
        self.best_cost.clear();
        self.best_cost.resize(cell_count, u32::MAX);
        self.closed.clear();
        self.closed.resize(cell_count, false);
        self.sequence = 0;
        self.expanded = 0;
    }

    fn push(
        &mut self,
        tile: TileCoord,
        cost: u32,
        heuristic: u32,
        parent: Option<usize>,
        map: &CollisionMap,
    ) {
        if let Some(index) = map.bounds().index(tile) {
            self.best_cost[index] = cost;
        }

        let node = PathNode {
            tile,
            cost,
            heuristic,
            parent,
        };
        self.frontier.push(FrontierEntry {
            estimate: node.estimate(),
            sequence: self.sequence,
            node: self.nodes.len(),
        });
        self.nodes.push(node);
        self.sequence += 1;
    }

    fn reconstruct(&self, goal_node: usize) -> Path {
        let mut waypoints = Vec::new();
        let mut cursor = Some(goal_node);
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            waypoints.push(node.tile);
            cursor = node.parent;
        }
        waypoints.reverse();
        Path { waypoints }
    }
}

/// Search node owned by the arena; `parent` indexes its single predecessor.
#[derive(Clone, Copy, Debug)]
struct PathNode {
    tile: TileCoord,
    cost: u32,
    heuristic: u32,
    parent: Option<usize>,
}

impl PathNode {
    fn estimate(&self) -> u32 {
        self.cost.saturating_add(self.heuristic)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FrontierEntry {
    estimate: u32,
    sequence: u64,
    node: usize,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: lower estimate, then earlier push, ranks higher.
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontier_pops_lowest_estimate_then_oldest() {
        let mut heap = BinaryHeap::new();
        heap.push(FrontierEntry {
            estimate: 5,
            sequence: 0,
            node: 0,
        });
        heap.push(FrontierEntry {
            estimate: 4,
            sequence: 2,
            node: 1,
        });
        heap.push(FrontierEntry {
            estimate: 4,
            sequence: 1,
            node: 2,
        });

        let order: Vec<usize> =
            std::iter::from_fn(|| heap.pop().map(|entry| entry.node)).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }
}
