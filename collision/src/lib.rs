#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Live collision maps for the overworld and dungeon regimes.
//!
//! A [`CollisionMapReader`] pulls raw collision codes for the region around
//! the player through a [`MemoryReader`], runs them through the
//! [`TileEncoding`] of the active regime and hands back an immutable
//! [`CollisionMap`]. Maps are tagged with the game mode they were captured
//! under and refuse to answer for any other mode.

mod classify;
mod map;
mod reader;

pub use classify::{classify, CodeTable, TileEncoding};
pub use map::CollisionMap;
pub use reader::{CollisionMapReader, MapReadError, MapRequest, MemoryReader, RegionError};
