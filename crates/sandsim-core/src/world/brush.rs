//! Brush operations - painting and erasing discs of material

use glam::{DVec2, Vec2};
use sandsim_materials::{Cell, MaterialKind};

use super::neighbor_queries::NeighborQueries;
use super::rng_trait::WorldRng;
use super::world::World;

/// Largest initial speed (cells/s per axis) of a freshly painted cell
const BRUSH_JITTER: f32 = 20.0;

impl World {
    /// Fill every Empty cell within `radius` of the center with fresh `kind` cells
    ///
    /// Occupied cells are left alone; positions outside the grid are skipped one by one.
    pub fn insert_circle(&mut self, center_x: i32, center_y: i32, radius: f32, kind: MaterialKind) {
        if kind == MaterialKind::Empty {
            return;
        }
        for (x, y) in NeighborQueries::disc(&self.grid, center_x, center_y, radius) {
            if !self.grid.is_empty_at(x, y) {
                continue;
            }
            let mut cell = self.create_cell(kind);
            cell.velocity = Vec2::new(
                self.rng.gen_range_f32(-BRUSH_JITTER, BRUSH_JITTER),
                self.rng.gen_range_f32(-BRUSH_JITTER, BRUSH_JITTER),
            );
            self.grid.set(x, y, cell);
        }
    }

    /// Empty every cell within `radius` of the center
    pub fn erase_circle(&mut self, center_x: i32, center_y: i32, radius: f32) {
        for (x, y) in NeighborQueries::disc(&self.grid, center_x, center_y, radius) {
            self.grid.set(x, y, Cell::EMPTY);
        }
    }

    /// Stamp [`insert_circle`](Self::insert_circle) along a segment
    pub fn stroke_line(&mut self, from: Vec2, to: Vec2, radius: f32, kind: MaterialKind) {
        for (x, y) in stroke_points(from, to, radius, self.width(), self.height()) {
            self.insert_circle(x, y, radius, kind);
        }
    }

    /// Stamp [`erase_circle`](Self::erase_circle) along a segment
    pub fn erase_line(&mut self, from: Vec2, to: Vec2, radius: f32) {
        for (x, y) in stroke_points(from, to, radius, self.width(), self.height()) {
            self.erase_circle(x, y, radius);
        }
    }
}

/// Stamp centers every `max(1, radius / 2)` cells from `from` to `to`, both ends included,
/// rounded to the nearest cell
///
/// The segment is first clipped to the part whose stamps can reach a
/// `width` x `height` grid. Segments shorter than one cell stamp once, at `to`.
fn stroke_points(from: Vec2, to: Vec2, radius: f32, width: usize, height: usize) -> Vec<(i32, i32)> {
    if !(from.is_finite() && to.is_finite()) {
        return Vec::new();
    }
    let reach = f64::from(radius.max(0.0)).min(width.max(height) as f64) + 1.0;
    let min = DVec2::splat(-reach);
    let max = DVec2::new(width as f64 - 1.0, height as f64 - 1.0) + reach;
    let Some((from, to)) = clip_segment(from.as_dvec2(), to.as_dvec2(), min, max) else {
        return Vec::new();
    };
    // Huge endpoints lose precision in the clip
    let (from, to) = (from.clamp(min, max), to.clamp(min, max));

    let distance = from.distance(to);
    if distance < 1.0 {
        return vec![nearest_cell(to.as_vec2())];
    }

    let step = f64::from(radius * 0.5).max(1.0);
    let steps = ((distance / step).ceil() as u32).max(1);
    (0..=steps)
        .map(|i| {
            let t = f64::from(i) / f64::from(steps);
            nearest_cell((from + (to - from) * t).as_vec2())
        })
        .collect()
}

/// Liang-Barsky clip of a segment against an axis-aligned box
fn clip_segment(from: DVec2, to: DVec2, min: DVec2, max: DVec2) -> Option<(DVec2, DVec2)> {
    let delta = to - from;
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [
        (-delta.x, from.x - min.x),
        (delta.x, max.x - from.x),
        (-delta.y, from.y - min.y),
        (delta.y, max.y - from.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((from + delta * t0, from + delta * t1))
}

fn nearest_cell(point: Vec2) -> (i32, i32) {
    (point.x.round() as i32, point.y.round() as i32)
}
