//! Per-tick state shared by the movement and reaction systems

use glam::IVec2;
use sandsim_materials::{Cell, MaterialDef, MaterialKind, Materials, cell_flags};

use super::spawn::CellFactory;
use crate::world::{Grid, SimStats, WorldRng};

/// Borrowed view of a world while one cell is being stepped
pub struct StepContext<'a, R: WorldRng> {
    pub grid: &'a mut Grid,
    pub materials: &'a Materials,
    pub rng: &'a mut R,
    pub stats: &'a mut dyn SimStats,
    /// Seconds covered by the current tick
    pub dt: f32,
}

impl<R: WorldRng> StepContext<'_, R> {
    pub fn cell_at(&self, pos: IVec2) -> Option<Cell> {
        self.grid.get(pos.x, pos.y).copied()
    }

    pub fn kind_at(&self, pos: IVec2) -> Option<MaterialKind> {
        self.grid.kind_at(pos.x, pos.y)
    }

    pub fn def(&self, kind: MaterialKind) -> &MaterialDef {
        self.materials.get(kind)
    }

    /// Replace the cell at `pos` with a fresh cell of another kind
    ///
    /// The new cell counts as already updated so the change spreads one hop per tick.
    pub fn replace(&mut self, pos: IVec2, kind: MaterialKind) {
        let mut cell = CellFactory::spawn(self.materials.get(kind), &mut *self.rng);
        cell.set_flag(cell_flags::UPDATED, true);
        self.grid.set(pos.x, pos.y, cell);
    }

    /// Replace the cell at `pos` with Empty
    pub fn die(&mut self, pos: IVec2) {
        self.grid.set(pos.x, pos.y, Cell::EMPTY);
    }
}
