//! Fresh cell construction with per-cell color variation

use sandsim_materials::{Cell, MaterialDef, MaterialKind};

use crate::world::WorldRng;

/// Builds new cells from the materials table
pub struct CellFactory;

impl CellFactory {
    /// New cell at rest; colors are jittered or picked from the palette
    pub fn spawn<R: WorldRng>(def: &MaterialDef, rng: &mut R) -> Cell {
        if def.kind == MaterialKind::Empty {
            return Cell::EMPTY;
        }
        Cell::new(def.kind, Self::spawn_color(def, rng))
    }

    pub fn spawn_color<R: WorldRng>(def: &MaterialDef, rng: &mut R) -> [u8; 4] {
        if !def.palette.is_empty() {
            let pick = rng.gen_range_i32(0, def.palette.len() as i32 - 1);
            return def.palette[pick as usize];
        }

        let mut color = def.color;
        for (channel, variation) in def.color_variation.iter().enumerate() {
            if *variation == 0 {
                continue;
            }
            let v = *variation as i32;
            let shifted = color[channel] as i32 + rng.gen_range_i32(-v, v);
            color[channel] = shifted.clamp(0, 255) as u8;
        }
        color
    }
}
