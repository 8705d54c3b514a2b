//! Neighbor cell collection utilities

use sandsim_materials::MaterialKind;
use smallvec::SmallVec;

use super::grid::Grid;

/// Any disc wider than this already covers every grid an `i32` can address
const MAX_DISC_REACH: i64 = 1 << 33;

/// In-bounds neighbors as `(x, y, kind)`
pub type Neighbors = SmallVec<[(i32, i32, MaterialKind); 8]>;

/// Neighbor collection utilities - stateless methods for querying neighboring cells
pub struct NeighborQueries;

impl NeighborQueries {
    /// Order: NW, N, NE, W, E, SW, S, SE
    pub const OFFSETS_8: [(i32, i32); 8] = [
        (-1, -1), // NW
        (0, -1),  // N
        (1, -1),  // NE
        (-1, 0),  // W
        (1, 0),   // E
        (-1, 1),  // SW
        (0, 1),   // S
        (1, 1),   // SE
    ];

    /// Collect all in-bounds 8-neighbors (cardinal + diagonal), Empty included
    pub fn get_8_neighbors(grid: &Grid, center_x: i32, center_y: i32) -> Neighbors {
        let mut neighbors = Neighbors::new();
        for (dx, dy) in Self::OFFSETS_8 {
            let x = center_x + dx;
            let y = center_y + dy;
            if let Some(kind) = grid.kind_at(x, y) {
                neighbors.push((x, y, kind));
            }
        }
        neighbors
    }

    /// Whether any 8-neighbor matches the predicate
    pub fn any_neighbor(
        grid: &Grid,
        center_x: i32,
        center_y: i32,
        predicate: impl Fn(MaterialKind) -> bool,
    ) -> bool {
        Self::OFFSETS_8.iter().any(|(dx, dy)| {
            grid.kind_at(center_x + dx, center_y + dy)
                .is_some_and(&predicate)
        })
    }

    /// Closest Empty cell by expanding square rings around the center
    ///
    /// Rings are scanned top row first, left to right, so upward spots win ties.
    pub fn nearest_empty(grid: &Grid, center_x: i32, center_y: i32, radius: i32) -> Option<(i32, i32)> {
        for ring in 1..=radius {
            for dy in -ring..=ring {
                for dx in -ring..=ring {
                    if dx.abs() != ring && dy.abs() != ring {
                        continue;
                    }
                    let (x, y) = (center_x + dx, center_y + dy);
                    if grid.is_empty_at(x, y) {
                        return Some((x, y));
                    }
                }
            }
        }
        None
    }

    /// In-bounds positions with `dx² + dy² <= radius²` around the center
    ///
    /// The scan is clipped to the grid first, so the cost never exceeds the grid
    /// area and any center or radius is accepted.
    pub fn disc(
        grid: &Grid,
        center_x: i32,
        center_y: i32,
        radius: f32,
    ) -> impl Iterator<Item = (i32, i32)> + use<> {
        let reach = if radius >= 0.0 {
            (radius.floor() as i64).min(MAX_DISC_REACH)
        } else {
            -1
        };
        let radius_sq = f64::from(radius) * f64::from(radius);
        let (cx, cy) = (i64::from(center_x), i64::from(center_y));
        let x_range = (cx - reach).max(0)..=(cx + reach).min(grid.width() as i64 - 1);
        let y_range = (cy - reach).max(0)..=(cy + reach).min(grid.height() as i64 - 1);

        y_range.flat_map(move |y| {
            x_range.clone().filter_map(move |x| {
                let (dx, dy) = ((x - cx) as f64, (y - cy) as f64);
                (dx * dx + dy * dy <= radius_sq).then_some((x as i32, y as i32))
            })
        })
    }
}
