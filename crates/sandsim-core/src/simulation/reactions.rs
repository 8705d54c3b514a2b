//! Reaction rules: fire, heat, ignition, corrosion and explosions
//!
//! Every rule looks only at the 8 neighbors of the reacting cell, so effects
//! travel at most one cell per tick.

use glam::IVec2;
use sandsim_materials::MaterialKind;

use super::context::StepContext;
use super::spawn::CellFactory;
use super::state_changes::{LAVA_QUENCH_SECONDS, StateChangeSystem};
use crate::world::{NeighborQueries, WorldRng};

/// Ignition strength of each heat source (scales flammability)
pub const FIRE_HEAT: f32 = 1.0;
pub const LAVA_HEAT: f32 = 0.5;
pub const EMBER_HEAT: f32 = 0.25;

/// Chance per tick that a flame dies early
const FIRE_EXTINGUISH_CHANCE: f32 = 0.03;
const FIRE_FLICKER_CHANCE: f32 = 0.5;
const SPARK_CHANCE: f32 = 0.05;
/// Chance that water dousing a flame boils off
const DOUSE_STEAM_CHANCE: f32 = 0.2;
/// Chance per tick at full heat that neighboring water boils
const WATER_BOIL_CHANCE: f32 = 0.2;
const BURN_OUT_SMOKE: f32 = 0.6;
const BURN_OUT_EMBER: f32 = 0.75;
const EMBER_SMOKE_CHANCE: f32 = 0.3;
const ACID_CORROSION_CHANCE: f32 = 0.05;
/// Chance that acid is used up by a successful corrosion
const ACID_CONSUMED_CHANCE: f32 = 0.1;
pub const EXPLOSION_RADIUS: f32 = 4.0;
/// Chance a blast converts a cell with zero explosion resistance
const EXPLOSION_ACCEPT_CHANCE: f32 = 0.7;

/// Handles chemistry simulation: fire, burning, ignition and reactions
pub struct ReactionSystem;

impl ReactionSystem {
    /// Apply the reaction rules of the cell at `pos`
    pub fn react<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2) {
        let Some(kind) = ctx.kind_at(pos) else {
            return;
        };
        match kind {
            MaterialKind::Fire => Self::update_fire(ctx, pos),
            MaterialKind::Ember => Self::update_ember(ctx, pos),
            MaterialKind::Lava => Self::update_lava(ctx, pos),
            MaterialKind::Acid => Self::update_acid(ctx, pos),
            MaterialKind::Gunpowder => Self::update_gunpowder(ctx, pos),
            MaterialKind::Salt => StateChangeSystem::dissolve_salt(ctx, pos),
            MaterialKind::Steam => StateChangeSystem::update_steam(ctx, pos),
            MaterialKind::Smoke => StateChangeSystem::fade_out(ctx, pos),
            _ => {}
        }
    }

    /// Update fire cell behavior
    pub fn update_fire<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2) {
        let Some(cell) = ctx.cell_at(pos) else {
            return;
        };
        let materials = ctx.materials;
        let def = materials.get(MaterialKind::Fire);

        // 1. Bounded lifetime, plus a chance to die early
        let expired = def.max_lifetime.is_some_and(|max| cell.lifetime >= max);
        if expired || ctx.rng.check_probability(FIRE_EXTINGUISH_CHANCE) {
            Self::burn_out(ctx, pos);
            return;
        }

        // 2. Water puts the flame out and may boil
        let neighbors = NeighborQueries::get_8_neighbors(ctx.grid, pos.x, pos.y);
        if let Some(&(x, y, _)) = neighbors
            .iter()
            .find(|(_, _, kind)| *kind == MaterialKind::Water)
        {
            ctx.replace(pos, MaterialKind::Smoke);
            if ctx.rng.check_probability(DOUSE_STEAM_CHANCE) {
                ctx.replace(IVec2::new(x, y), MaterialKind::Steam);
            }
            ctx.stats.record_reaction();
            return;
        }

        // 3. Heat the neighborhood
        Self::emit_heat(ctx, pos, FIRE_HEAT);

        // 4. Sparks drift up as smoke
        let above = pos - IVec2::Y;
        if ctx.grid.is_empty_at(above.x, above.y) && ctx.rng.check_probability(SPARK_CHANCE) {
            ctx.replace(above, MaterialKind::Smoke);
        }

        // 5. Flicker
        if ctx.rng.check_probability(FIRE_FLICKER_CHANCE) {
            let color = CellFactory::spawn_color(def, &mut *ctx.rng);
            ctx.grid.modify(pos.x, pos.y, |c| c.color = color);
        }
    }

    /// Glowing remains: heat neighbors weakly until they expire
    pub fn update_ember<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2) {
        let Some(cell) = ctx.cell_at(pos) else {
            return;
        };
        let expired = ctx
            .def(MaterialKind::Ember)
            .max_lifetime
            .is_some_and(|max| cell.lifetime >= max);
        if expired {
            if ctx.rng.check_probability(EMBER_SMOKE_CHANCE) {
                ctx.replace(pos, MaterialKind::Smoke);
            } else {
                ctx.die(pos);
            }
            ctx.stats.record_phase_change();
            return;
        }

        if NeighborQueries::any_neighbor(ctx.grid, pos.x, pos.y, |k| k == MaterialKind::Water) {
            ctx.replace(pos, MaterialKind::Smoke);
            ctx.stats.record_reaction();
            return;
        }

        Self::emit_heat(ctx, pos, EMBER_HEAT);
    }

    /// Lava heats its neighbors, is quenched by water and cools to stone
    pub fn update_lava<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2) {
        let wet = NeighborQueries::get_8_neighbors(ctx.grid, pos.x, pos.y)
            .iter()
            .filter(|(_, _, kind)| *kind == MaterialKind::Water)
            .count();
        if wet > 0 {
            ctx.grid.modify(pos.x, pos.y, |c| {
                c.lifetime += LAVA_QUENCH_SECONDS * wet as f32;
            });
        }

        Self::emit_heat(ctx, pos, LAVA_HEAT);
        StateChangeSystem::cool_lava(ctx, pos);
    }

    /// Acid deletes neighbors except stone and other acid
    pub fn update_acid<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2) {
        for (x, y, kind) in NeighborQueries::get_8_neighbors(ctx.grid, pos.x, pos.y) {
            if matches!(
                kind,
                MaterialKind::Empty | MaterialKind::Stone | MaterialKind::Acid
            ) {
                continue;
            }
            if ctx.rng.check_probability(ACID_CORROSION_CHANCE) {
                ctx.die(IVec2::new(x, y));
                ctx.stats.record_reaction();
                if ctx.rng.check_probability(ACID_CONSUMED_CHANCE) {
                    ctx.die(pos);
                    return;
                }
            }
        }
    }

    /// Gunpowder touching a flame detonates
    pub fn update_gunpowder<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2) {
        if NeighborQueries::any_neighbor(ctx.grid, pos.x, pos.y, |k| k == MaterialKind::Fire) {
            Self::explode(ctx, pos);
        }
    }

    /// Turn a disc around `center` into fire; each cell resists by its explosion resistance
    pub fn explode<R: WorldRng>(ctx: &mut StepContext<'_, R>, center: IVec2) {
        let materials = ctx.materials;
        let mut converted = 0u32;
        for (x, y) in NeighborQueries::disc(ctx.grid, center.x, center.y, EXPLOSION_RADIUS) {
            let target = IVec2::new(x, y);
            let Some(kind) = ctx.kind_at(target) else {
                continue;
            };
            let accept = if target == center {
                1.0
            } else {
                EXPLOSION_ACCEPT_CHANCE * (1.0 - materials.get(kind).explosion_resistance)
            };
            if ctx.rng.check_probability(accept) {
                ctx.replace(target, MaterialKind::Fire);
                converted += 1;
            }
        }
        ctx.stats.record_explosion();
        log::debug!(
            "Explosion at ({}, {}) converted {} cells",
            center.x,
            center.y,
            converted
        );
    }

    /// Push neighbors toward ignition or boiling; `heat` scales the chances
    fn emit_heat<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2, heat: f32) {
        let materials = ctx.materials;
        for (x, y, kind) in NeighborQueries::get_8_neighbors(ctx.grid, pos.x, pos.y) {
            let target = IVec2::new(x, y);
            let def = materials.get(kind);
            if def.is_flammable() {
                if ctx.rng.check_probability(def.flammability * heat) {
                    ctx.replace(target, MaterialKind::Fire);
                    ctx.stats.record_reaction();
                }
            } else if kind == MaterialKind::Water
                && ctx.rng.check_probability(WATER_BOIL_CHANCE * heat)
            {
                ctx.replace(target, MaterialKind::Steam);
                ctx.stats.record_phase_change();
            }
        }
    }

    fn burn_out<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2) {
        let roll = ctx.rng.gen_f32();
        if roll < BURN_OUT_SMOKE {
            ctx.replace(pos, MaterialKind::Smoke);
        } else if roll < BURN_OUT_EMBER {
            ctx.replace(pos, MaterialKind::Ember);
        } else {
            ctx.die(pos);
        }
        ctx.stats.record_phase_change();
    }
}
