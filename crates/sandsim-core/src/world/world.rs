//! World - owns the grid and drives the tick scheduler

use glam::IVec2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use sandsim_materials::{Cell, MaterialKind, Materials, cell_flags};

use super::grid::Grid;
use super::stats::TickStats;
use crate::simulation::{CellFactory, MovementSystem, ReactionSystem, StepContext};

/// Seed used by [`World::new`]
pub const DEFAULT_SEED: u64 = 42;

/// A fixed-size falling-sand world
///
/// All randomness in a tick comes from the world's own generator, so two
/// worlds built with the same seed and fed the same calls stay identical.
pub struct World {
    pub(super) grid: Grid,

    /// Material definitions
    pub(super) materials: Materials,

    /// Ticks run so far (wraps on overflow)
    pub(super) frame_counter: u32,

    pub(super) rng: Xoshiro256StarStar,
    seed: u64,

    /// Counters for the most recent tick
    stats: TickStats,
}

impl World {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_seed(width, height, DEFAULT_SEED)
    }

    /// Create an empty world whose randomness replays from `seed`
    pub fn with_seed(width: usize, height: usize, seed: u64) -> Self {
        log::debug!("Creating {}x{} world (seed {})", width, height, seed);
        Self {
            grid: Grid::new(width, height),
            materials: Materials::new(),
            frame_counter: 0,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            seed,
            stats: TickStats::default(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Direct grid access for callers that build their own cells
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn materials(&self) -> &Materials {
        &self.materials
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Row-major RGBA8 view of every cell
    pub fn color_buffer(&self) -> &[u8] {
        self.grid.color_buffer()
    }

    pub fn last_tick_stats(&self) -> TickStats {
        self.stats
    }

    pub fn get_cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.grid.get(x, y)
    }

    pub fn kind_at(&self, x: i32, y: i32) -> Option<MaterialKind> {
        self.grid.kind_at(x, y)
    }

    /// A fresh cell of `kind` with a jittered color from the world's generator
    pub fn create_cell(&mut self, kind: MaterialKind) -> Cell {
        CellFactory::spawn(self.materials.get(kind), &mut self.rng)
    }

    /// Put a fresh cell of `kind` at (x, y); no-op out of bounds
    pub fn place(&mut self, x: i32, y: i32, kind: MaterialKind) {
        if !self.grid.in_bounds(x, y) {
            return;
        }
        let cell = self.create_cell(kind);
        self.grid.set(x, y, cell);
    }

    /// Empty every cell; the frame counter keeps running
    pub fn clear(&mut self) {
        self.grid.clear();
        log::info!("World cleared at frame {}", self.frame_counter);
    }

    /// Advance the simulation by one tick covering `dt` seconds
    ///
    /// Rows are scanned bottom to top. The horizontal direction alternates
    /// with the frame counter: left to right on even frames.
    pub fn update(&mut self, dt: f32) {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        self.frame_counter = self.frame_counter.wrapping_add(1);
        self.stats = TickStats::default();
        self.grid.clear_updated_flags();

        let width = self.grid.width() as i32;
        let height = self.grid.height() as i32;
        let left_to_right = self.frame_counter % 2 == 0;

        for y in (0..height).rev() {
            if left_to_right {
                for x in 0..width {
                    self.step_cell(x, y, dt);
                }
            } else {
                for x in (0..width).rev() {
                    self.step_cell(x, y, dt);
                }
            }
        }

        log::trace!("Frame {}: {:?}", self.frame_counter, self.stats);
    }

    fn step_cell(&mut self, x: i32, y: i32, dt: f32) {
        let Some(cell) = self.grid.get(x, y).copied() else {
            return;
        };
        if cell.is_empty() || cell.updated_this_tick() {
            return;
        }

        self.grid.modify(x, y, |c| {
            c.set_flag(cell_flags::UPDATED, true);
            c.lifetime += dt;
        });

        let mut ctx = StepContext {
            grid: &mut self.grid,
            materials: &self.materials,
            rng: &mut self.rng,
            stats: &mut self.stats,
            dt,
        };
        let pos = MovementSystem::step(&mut ctx, IVec2::new(x, y));
        ReactionSystem::react(&mut ctx, pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::movement::MAX_CELLS_PER_TICK;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_new_world_is_empty() {
        let world = World::new(10, 20);
        assert_eq!(world.width(), 10);
        assert_eq!(world.height(), 20);
        assert_eq!(world.frame_counter(), 0);
        assert_eq!(world.seed(), DEFAULT_SEED);
        assert_eq!(world.grid().count_non_empty(), 0);
        assert_eq!(world.color_buffer().len(), 10 * 20 * 4);
    }

    #[test]
    fn test_update_increments_frame_counter() {
        let mut world = World::new(4, 4);
        world.update(DT);
        world.update(DT);
        assert_eq!(world.frame_counter(), 2);
    }

    #[test]
    fn test_frame_counter_wraps() {
        let mut world = World::new(2, 2);
        world.frame_counter = u32::MAX;
        world.update(DT);
        assert_eq!(world.frame_counter(), 0);
    }

    #[test]
    fn test_update_advances_lifetime_once_per_tick() {
        let mut world = World::new(3, 3);
        world.place(1, 1, MaterialKind::Stone);
        world.update(DT);
        world.update(DT);
        let cell = world.get_cell(1, 1).copied().unwrap_or_default();
        assert!((cell.lifetime - 2.0 * DT).abs() < 1e-6);
    }

    #[test]
    fn test_cell_moved_this_tick_is_not_stepped_again() {
        let mut world = World::new(1, 30);
        world.place(0, 0, MaterialKind::Sand);
        world.update(DT);

        let (_, y) = world.grid().find(MaterialKind::Sand).unwrap_or((0, 0));
        assert!(y >= 1);
        // A single displacement per tick is capped
        assert!(y <= MAX_CELLS_PER_TICK);
        let cell = world.get_cell(0, y).copied().unwrap_or_default();
        assert!((cell.lifetime - DT).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_dt_is_treated_as_zero() {
        let mut world = World::new(3, 3);
        world.place(1, 1, MaterialKind::Stone);
        world.update(f32::NAN);
        world.update(-1.0);
        let cell = world.get_cell(1, 1).copied().unwrap_or_default();
        assert_eq!(cell.lifetime, 0.0);
        assert_eq!(world.frame_counter(), 2);
    }

    #[test]
    fn test_place_out_of_bounds_is_noop() {
        let mut world = World::new(3, 3);
        world.place(-1, 0, MaterialKind::Sand);
        world.place(3, 3, MaterialKind::Sand);
        assert_eq!(world.grid().count_non_empty(), 0);
    }

    #[test]
    fn test_clear_keeps_frame_counter() {
        let mut world = World::new(5, 5);
        world.place(2, 2, MaterialKind::Stone);
        world.update(DT);
        world.clear();
        assert_eq!(world.grid().count_non_empty(), 0);
        assert!(world.color_buffer().iter().all(|b| *b == 0));
        assert_eq!(world.frame_counter(), 1);
    }

    #[test]
    fn test_same_seed_replays_identically() {
        let run = || {
            let mut world = World::with_seed(16, 16, 7);
            for x in 2..14 {
                world.place(x, 0, MaterialKind::Sand);
                world.place(x, 3, MaterialKind::Water);
            }
            world.place(8, 8, MaterialKind::Fire);
            world.place(8, 9, MaterialKind::Wood);
            for _ in 0..40 {
                world.update(DT);
            }
            world.grid().cells().to_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_stats_reset_each_tick() {
        let mut world = World::new(1, 10);
        world.place(0, 0, MaterialKind::Sand);
        world.update(DT);
        assert!(world.last_tick_stats().cells_moved > 0);

        for _ in 0..60 {
            world.update(DT);
        }
        assert_eq!(world.last_tick_stats().cells_moved, 0);
    }
}
