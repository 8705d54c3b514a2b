//! Cell type and flag constants
//!
//! A cell is a plain value: grids store them in a flat `Vec<Cell>` and move
//! them around by copy.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::MaterialKind;

/// A single cell of the grid
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub kind: MaterialKind,
    /// Velocity in cells per second, +y points down
    pub velocity: Vec2,
    /// Seconds since this cell was created
    pub lifetime: f32,
    /// Display color (RGBA)
    pub color: [u8; 4],
    /// State flags (updated this tick, free falling)
    pub flags: u8,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        kind: MaterialKind::Empty,
        velocity: Vec2::ZERO,
        lifetime: 0.0,
        color: [0, 0, 0, 0],
        flags: 0,
    };

    /// Fresh cell at rest with zero lifetime
    pub fn new(kind: MaterialKind, color: [u8; 4]) -> Self {
        if kind == MaterialKind::Empty {
            return Self::EMPTY;
        }
        Self {
            kind,
            velocity: Vec2::ZERO,
            lifetime: 0.0,
            color,
            flags: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind == MaterialKind::Empty
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    pub fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Whether the scheduler already advanced this cell in the current tick
    pub fn updated_this_tick(&self) -> bool {
        self.has_flag(cell_flags::UPDATED)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Flag bits for cell state
pub mod cell_flags {
    pub const UPDATED: u8 = 1 << 0; // Already updated this tick
    pub const FREE_FALLING: u8 = 1 << 1; // Moved last tick, may slide diagonally
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_empty_is_canonical() {
        let cell = Cell::new(MaterialKind::Empty, [9, 9, 9, 9]);
        assert_eq!(cell, Cell::EMPTY);
        assert!(cell.is_empty());
    }

    #[test]
    fn test_new_cell_at_rest() {
        let cell = Cell::new(MaterialKind::Sand, [150, 100, 50, 255]);
        assert_eq!(cell.kind, MaterialKind::Sand);
        assert_eq!(cell.velocity, Vec2::ZERO);
        assert_eq!(cell.lifetime, 0.0);
        assert!(!cell.updated_this_tick());
    }

    #[test]
    fn test_flags() {
        let mut cell = Cell::new(MaterialKind::Sand, [0, 0, 0, 255]);
        cell.set_flag(cell_flags::UPDATED, true);
        cell.set_flag(cell_flags::FREE_FALLING, true);
        assert!(cell.updated_this_tick());
        assert!(cell.has_flag(cell_flags::FREE_FALLING));

        cell.set_flag(cell_flags::UPDATED, false);
        assert!(!cell.updated_this_tick());
        assert!(cell.has_flag(cell_flags::FREE_FALLING));
    }
}
