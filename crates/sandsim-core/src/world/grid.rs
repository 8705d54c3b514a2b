//! Fixed-size cell grid with a mirrored RGBA buffer
//!
//! Cells live in a flat row-major `Vec<Cell>`. Every write goes through this
//! type so the color buffer never drifts from the cells. Out-of-bounds
//! coordinates are ignored by every mutator and yield `None` from readers.

use sandsim_materials::{Cell, MaterialKind, cell_flags};

/// Bytes per pixel in the color buffer
pub const BYTES_PER_PIXEL: usize = 4;

pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    color_buffer: Vec<u8>,
}

impl Grid {
    /// Create a grid filled with Empty cells
    pub fn new(width: usize, height: usize) -> Self {
        let area = width * height;
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; area],
            color_buffer: vec![0; area * BYTES_PER_PIXEL],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|idx| &self.cells[idx])
    }

    pub fn kind_at(&self, x: i32, y: i32) -> Option<MaterialKind> {
        self.get(x, y).map(|cell| cell.kind)
    }

    /// True only for in-bounds Empty cells
    pub fn is_empty_at(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(Cell::is_empty)
    }

    /// Overwrite a cell; Empty cells are stored in canonical form
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        let Some(idx) = self.index(x, y) else {
            return;
        };
        self.cells[idx] = if cell.is_empty() { Cell::EMPTY } else { cell };
        self.write_color(idx);
    }

    /// Exchange two cells; a no-op unless both positions are in bounds
    pub fn swap(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let (Some(a), Some(b)) = (self.index(x1, y1), self.index(x2, y2)) else {
            return;
        };
        if a == b {
            return;
        }
        self.cells.swap(a, b);
        self.write_color(a);
        self.write_color(b);
    }

    /// Mutate a cell in place; returns false when out of bounds
    pub fn modify(&mut self, x: i32, y: i32, f: impl FnOnce(&mut Cell)) -> bool {
        let Some(idx) = self.index(x, y) else {
            return false;
        };
        f(&mut self.cells[idx]);
        if self.cells[idx].is_empty() {
            self.cells[idx] = Cell::EMPTY;
        }
        self.write_color(idx);
        true
    }

    /// Reset every cell to Empty
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
        self.color_buffer.fill(0);
    }

    pub fn clear_updated_flags(&mut self) {
        for cell in &mut self.cells {
            cell.flags &= !cell_flags::UPDATED;
        }
    }

    /// Row-major cells
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Row-major RGBA8 bytes, `width * height * 4` long
    pub fn color_buffer(&self) -> &[u8] {
        &self.color_buffer
    }

    pub fn count_kind(&self, kind: MaterialKind) -> usize {
        self.cells.iter().filter(|cell| cell.kind == kind).count()
    }

    pub fn count_non_empty(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_empty()).count()
    }

    /// First position holding `kind` in row-major order
    pub fn find(&self, kind: MaterialKind) -> Option<(i32, i32)> {
        self.cells
            .iter()
            .position(|cell| cell.kind == kind)
            .map(|idx| ((idx % self.width) as i32, (idx / self.width) as i32))
    }

    /// Replace every cell at once; ignored unless `cells` covers the grid exactly
    pub(crate) fn replace_all(&mut self, cells: Vec<Cell>) -> bool {
        if cells.len() != self.cells.len() {
            return false;
        }
        self.cells = cells;
        for idx in 0..self.cells.len() {
            if self.cells[idx].is_empty() {
                self.cells[idx] = Cell::EMPTY;
            }
            self.write_color(idx);
        }
        true
    }

    fn write_color(&mut self, idx: usize) {
        let start = idx * BYTES_PER_PIXEL;
        self.color_buffer[start..start + BYTES_PER_PIXEL].copy_from_slice(&self.cells[idx].color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn sand() -> Cell {
        Cell::new(MaterialKind::Sand, [150, 100, 50, 255])
    }

    fn water() -> Cell {
        Cell::new(MaterialKind::Water, [20, 100, 170, 200])
    }

    fn buffer_at(grid: &Grid, x: usize, y: usize) -> [u8; 4] {
        let start = (y * grid.width() + x) * BYTES_PER_PIXEL;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&grid.color_buffer()[start..start + 4]);
        rgba
    }

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new(8, 4);
        assert_eq!(grid.cells().len(), 32);
        assert_eq!(grid.color_buffer().len(), 32 * 4);
        assert_eq!(grid.count_non_empty(), 0);
        assert!(grid.color_buffer().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_in_bounds() {
        let grid = Grid::new(3, 2);
        assert!(grid.in_bounds(0, 0));
        assert!(grid.in_bounds(2, 1));
        assert!(!grid.in_bounds(3, 0));
        assert!(!grid.in_bounds(0, 2));
        assert!(!grid.in_bounds(-1, 0));
        assert!(!grid.in_bounds(0, -1));
    }

    #[test]
    fn test_set_updates_color_buffer() {
        let mut grid = Grid::new(4, 4);
        grid.set(2, 1, sand());
        assert_eq!(grid.kind_at(2, 1), Some(MaterialKind::Sand));
        assert_eq!(buffer_at(&grid, 2, 1), [150, 100, 50, 255]);

        grid.set(2, 1, Cell::EMPTY);
        assert_eq!(buffer_at(&grid, 2, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn test_set_empty_is_canonical() {
        let mut grid = Grid::new(2, 2);
        let mut junk = Cell::EMPTY;
        junk.color = [1, 2, 3, 4];
        junk.velocity = Vec2::new(5.0, 5.0);
        grid.set(0, 0, junk);
        assert_eq!(grid.get(0, 0), Some(&Cell::EMPTY));
        assert_eq!(buffer_at(&grid, 0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_out_of_bounds_is_noop() {
        let mut grid = Grid::new(4, 4);
        grid.set(1, 1, sand());
        let cells_before = grid.cells().to_vec();
        let buffer_before = grid.color_buffer().to_vec();

        grid.set(-1, 0, water());
        grid.set(4, 0, water());
        grid.set(0, 99, water());
        grid.swap(1, 1, 7, 7);
        grid.swap(-3, 0, 1, 1);
        assert!(!grid.modify(10, 10, |cell| cell.lifetime = 3.0));

        assert!(grid.get(-1, 0).is_none());
        assert!(grid.kind_at(4, 4).is_none());
        assert_eq!(grid.cells(), cells_before.as_slice());
        assert_eq!(grid.color_buffer(), buffer_before.as_slice());
    }

    #[test]
    fn test_swap_conserves_cells() {
        let mut grid = Grid::new(5, 5);
        let mut a = sand();
        a.velocity = Vec2::new(1.0, 2.0);
        a.lifetime = 0.5;
        let b = water();
        grid.set(1, 1, a);
        grid.set(3, 4, b);

        grid.swap(1, 1, 3, 4);

        assert_eq!(grid.get(3, 4), Some(&a));
        assert_eq!(grid.get(1, 1), Some(&b));
        assert_eq!(grid.count_kind(MaterialKind::Sand), 1);
        assert_eq!(grid.count_kind(MaterialKind::Water), 1);
        assert_eq!(buffer_at(&grid, 3, 4), a.color);
        assert_eq!(buffer_at(&grid, 1, 1), b.color);
    }

    #[test]
    fn test_swap_with_empty_moves_cell() {
        let mut grid = Grid::new(3, 3);
        grid.set(0, 0, sand());
        grid.swap(0, 0, 2, 2);
        assert!(grid.is_empty_at(0, 0));
        assert_eq!(grid.kind_at(2, 2), Some(MaterialKind::Sand));
        assert_eq!(buffer_at(&grid, 0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_modify_refreshes_color() {
        let mut grid = Grid::new(2, 2);
        grid.set(1, 0, sand());
        assert!(grid.modify(1, 0, |cell| cell.color[3] = 10));
        assert_eq!(buffer_at(&grid, 1, 0)[3], 10);

        assert!(grid.modify(1, 0, |cell| cell.kind = MaterialKind::Empty));
        assert_eq!(grid.get(1, 0), Some(&Cell::EMPTY));
    }

    #[test]
    fn test_clear_updated_flags() {
        let mut grid = Grid::new(2, 1);
        let mut cell = sand();
        cell.set_flag(cell_flags::UPDATED, true);
        cell.set_flag(cell_flags::FREE_FALLING, true);
        grid.set(0, 0, cell);

        grid.clear_updated_flags();

        let cell = grid.get(0, 0).copied().unwrap_or_default();
        assert!(!cell.updated_this_tick());
        assert!(cell.has_flag(cell_flags::FREE_FALLING));
    }

    #[test]
    fn test_find_and_clear() {
        let mut grid = Grid::new(4, 3);
        grid.set(3, 2, water());
        assert_eq!(grid.find(MaterialKind::Water), Some((3, 2)));
        assert_eq!(grid.find(MaterialKind::Sand), None);

        grid.clear();
        assert_eq!(grid.count_non_empty(), 0);
        assert!(grid.color_buffer().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_replace_all_requires_exact_size() {
        let mut grid = Grid::new(2, 2);
        assert!(!grid.replace_all(vec![sand(); 3]));
        assert_eq!(grid.count_non_empty(), 0);

        assert!(grid.replace_all(vec![sand(); 4]));
        assert_eq!(grid.count_kind(MaterialKind::Sand), 4);
        assert_eq!(buffer_at(&grid, 1, 1), [150, 100, 50, 255]);
    }
}
