//! Shared fixtures for system-level unit tests

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use sandsim_materials::{Cell, MaterialKind, Materials};

use super::context::StepContext;
use super::spawn::CellFactory;
use crate::world::{Grid, TickStats, WorldRng};

pub const TEST_DT: f32 = 1.0 / 60.0;

/// Rng that always rolls the same value
pub struct FixedRng(pub f32);

impl WorldRng for FixedRng {
    fn gen_bool(&mut self) -> bool {
        self.0 < 0.5
    }

    fn gen_f32(&mut self) -> f32 {
        self.0
    }
}

/// A grid plus everything a `StepContext` borrows
pub struct Harness<R: WorldRng> {
    pub grid: Grid,
    pub materials: Materials,
    pub rng: R,
    pub stats: TickStats,
}

impl Harness<Xoshiro256StarStar> {
    pub fn seeded(width: usize, height: usize, seed: u64) -> Self {
        Harness::with_rng(width, height, Xoshiro256StarStar::seed_from_u64(seed))
    }
}

impl<R: WorldRng> Harness<R> {
    pub fn with_rng(width: usize, height: usize, rng: R) -> Self {
        Self {
            grid: Grid::new(width, height),
            materials: Materials::new(),
            rng,
            stats: TickStats::default(),
        }
    }

    pub fn put(&mut self, x: i32, y: i32, kind: MaterialKind) {
        let cell = CellFactory::spawn(self.materials.get(kind), &mut self.rng);
        self.grid.set(x, y, cell);
    }

    pub fn kind(&self, x: i32, y: i32) -> Option<MaterialKind> {
        self.grid.kind_at(x, y)
    }

    pub fn cell(&self, x: i32, y: i32) -> Cell {
        self.grid.get(x, y).copied().unwrap_or_default()
    }

    /// Run `f` with a context over this harness
    pub fn with_ctx<T>(&mut self, f: impl FnOnce(&mut StepContext<'_, R>) -> T) -> T {
        let mut ctx = StepContext {
            grid: &mut self.grid,
            materials: &self.materials,
            rng: &mut self.rng,
            stats: &mut self.stats,
            dt: TEST_DT,
        };
        f(&mut ctx)
    }
}
