//! State change system
//!
//! Handles lifetime- and contact-driven transitions:
//! - Cooling (lava → stone once its temperature counter runs out)
//! - Condensing (steam → water)
//! - Dissolving (salt next to a liquid disappears)
//! - Fading (smoke and steam turn transparent, then vanish)

use glam::IVec2;
use sandsim_materials::{Cell, MaterialKind};

use super::context::StepContext;
use crate::world::{NeighborQueries, WorldRng};

/// Seconds a lava cell stays molten without water contact
pub const LAVA_COOL_SECONDS: f32 = 8.0;
/// Seconds of cooling each tick of water contact costs a lava cell
pub const LAVA_QUENCH_SECONDS: f32 = 0.5;
/// Steam younger than this never condenses
pub const STEAM_CONDENSE_AFTER: f32 = 2.0;
const STEAM_CONDENSE_CHANCE: f32 = 0.01;
const SALT_DISSOLVE_CHANCE: f32 = 0.01;
/// Crust color lava blends toward while it cools
const CRUST_COLOR: [u8; 4] = [90, 40, 30, 255];

/// Remaining heat of a lava cell in seconds; cools to stone at zero
pub fn lava_temperature(cell: &Cell) -> f32 {
    LAVA_COOL_SECONDS - cell.lifetime
}

/// System for checking and applying state changes
pub struct StateChangeSystem;

impl StateChangeSystem {
    /// Lava hardens to stone once its temperature reaches zero and darkens on the way
    pub fn cool_lava<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2) {
        let Some(cell) = ctx.cell_at(pos) else {
            return;
        };
        let temperature = lava_temperature(&cell);
        if temperature <= 0.0 {
            ctx.replace(pos, MaterialKind::Stone);
            ctx.stats.record_phase_change();
            return;
        }

        let heat = temperature / LAVA_COOL_SECONDS;
        if heat < 0.5 {
            let base = ctx.def(MaterialKind::Lava).color;
            let crust = (0.5 - heat) * 2.0;
            let mut color = base;
            for channel in 0..3 {
                let from = base[channel] as f32;
                let to = CRUST_COLOR[channel] as f32;
                color[channel] = (from + (to - from) * crust).round() as u8;
            }
            ctx.grid.modify(pos.x, pos.y, |c| c.color = color);
        }
    }

    /// Old steam may condense back to water; otherwise it fades like smoke
    pub fn update_steam<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2) {
        let Some(cell) = ctx.cell_at(pos) else {
            return;
        };
        if cell.lifetime >= STEAM_CONDENSE_AFTER && ctx.rng.check_probability(STEAM_CONDENSE_CHANCE)
        {
            ctx.replace(pos, MaterialKind::Water);
            ctx.stats.record_phase_change();
            return;
        }
        Self::fade_out(ctx, pos);
    }

    /// Alpha follows the remaining lifetime; the cell vanishes when it runs out
    pub fn fade_out<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2) {
        let Some(cell) = ctx.cell_at(pos) else {
            return;
        };
        let def = ctx.def(cell.kind);
        let Some(max_lifetime) = def.max_lifetime else {
            return;
        };
        if cell.lifetime >= max_lifetime {
            ctx.die(pos);
            ctx.stats.record_phase_change();
            return;
        }

        let remaining = 1.0 - cell.lifetime / max_lifetime;
        let alpha = (def.color[3] as f32 * remaining).round() as u8;
        ctx.grid.modify(pos.x, pos.y, |c| c.color[3] = alpha);
    }

    /// Salt touching any liquid slowly dissolves
    pub fn dissolve_salt<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2) {
        let materials = ctx.materials;
        let wet = NeighborQueries::any_neighbor(ctx.grid, pos.x, pos.y, |kind| {
            kind != MaterialKind::Empty && materials.get(kind).is_liquid()
        });
        if wet && ctx.rng.check_probability(SALT_DISSOLVE_CHANCE) {
            ctx.die(pos);
            ctx.stats.record_phase_change();
        }
    }
}
