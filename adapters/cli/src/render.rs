//! ASCII rendering of collision maps.

use rompilot_collision::CollisionMap;
use rompilot_core::{TileCoord, TileType};

/// Glyph drawn for a tile class.
pub(crate) fn glyph(kind: TileType) -> char {
    match kind {
        TileType::Floor => '.',
        TileType::Wall => '#',
        TileType::ShallowWater => '~',
        TileType::DeepWater => 'W',
        TileType::Pit => 'O',
        TileType::Warp => 'D',
        TileType::Obstacle => 'b',
        TileType::Unknown => '?',
    }
}

/// Draws `map` row by row, overlaying `path` with `*` and its endpoints with
/// `@` (start) and `X` (goal).
pub(crate) fn render(map: &CollisionMap, path: &[TileCoord]) -> String {
    let bounds = map.bounds();
    let origin = bounds.origin();
    let mut out = String::with_capacity(bounds.area() + bounds.height() as usize);

    for y in origin.y()..origin.y() + bounds.height() {
        for x in origin.x()..origin.x() + bounds.width() {
            let tile = TileCoord::new(x, y);
            let symbol = if path.first() == Some(&tile) {
                '@'
            } else if path.last() == Some(&tile) {
                'X'
            } else if path.contains(&tile) {
                '*'
            } else {
                map.tile(tile).map_or(' ', glyph)
            };
            out.push(symbol);
        }
        out.push('\n');
    }

    out
}
