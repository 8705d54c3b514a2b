//! World management - grid, ticking, brushes and snapshots

mod brush;
pub mod grid;
mod neighbor_queries;
pub mod persistence;
pub mod rng_trait;
pub mod stats;
#[allow(clippy::module_inception)]
mod world;

pub use grid::{BYTES_PER_PIXEL, Grid};
pub use neighbor_queries::{NeighborQueries, Neighbors};
pub use persistence::{Snapshot, SnapshotError, SnapshotStore};
pub use rng_trait::WorldRng;
pub use stats::{SimStats, TickStats};
pub use world::{DEFAULT_SEED, World};
