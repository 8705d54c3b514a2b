//! Cell movement physics
//!
//! Every moving family runs the same pipeline: integrate velocity, rasterize
//! the path to the rounded target, stop at the first cell the mover cannot
//! enter, then fall back to family moves when the direct path failed.
//! - Powders fall, slide diagonally while free falling and sink through liquids
//! - Liquids fall, flow sideways and layer by density
//! - Gases rise, jitter sideways and bubble up through water and oil

use bresenham::Bresenham;
use glam::{IVec2, Vec2};
use sandsim_materials::{MaterialDef, MaterialKind, MaterialType, Materials, cell_flags};
use smallvec::SmallVec;

use super::context::StepContext;
use crate::world::{NeighborQueries, WorldRng};

/// Downward acceleration in cells/s² (10 cells/s per tick at 60 Hz)
pub const GRAVITY: f32 = 600.0;
/// Terminal speed of powders and liquids in cells/s
pub const MAX_FALL_SPEED: f32 = 480.0;
/// Upward acceleration of gases in cells/s²
pub const BUOYANCY: f32 = 300.0;
pub const MAX_RISE_SPEED: f32 = 240.0;
/// Cells travelled per axis in one tick, at most
pub const MAX_CELLS_PER_TICK: i32 = 8;

/// Landing speed above which a falling cell spreads sideways
const IMPACT_SPEED: f32 = 60.0;
const IMPACT_SPREAD: f32 = 0.25;
/// Chance per tick that a resting powder sinks into the liquid under it
const SINK_CHANCE: f32 = 0.3;
const SPLASH_RADIUS: i32 = 3;
const SPLASH_SPEED: f32 = 120.0;
/// Upward speed of a lighter liquid pushed up by a denser one
const DENSITY_KICK: f32 = 62.0;
const DENSITY_FLIP_CHANCE: f32 = 0.2;
const FLOW_SPEED: f32 = 60.0;
/// Sideways speed at which flow keeps its direction 75% of the time
const FLOW_BIAS_SPEED: f32 = 30.0;
const GAS_JITTER: f32 = 60.0;
const GAS_DAMPING: f32 = 0.9;
const MAX_GAS_DRIFT: f32 = 90.0;
/// Below this sideways speed a cell has no preferred direction
const DIRECTION_EPSILON: f32 = 0.5;

/// How a mover treats one cell on its path
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Passage {
    Open,
    /// Enterable, but the mover stops there (displacing a liquid)
    Stop,
    Blocked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Walk {
    reached: IVec2,
    blocked: bool,
}

/// Material movement - stateless methods over a step context
pub struct MovementSystem;

impl MovementSystem {
    /// Move the cell at `pos` according to its family and return where it ended up
    pub fn step<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2) -> IVec2 {
        let Some(kind) = ctx.kind_at(pos) else {
            return pos;
        };
        // Flames flicker in place
        if kind == MaterialKind::Fire {
            return pos;
        }
        match ctx.def(kind).material_type {
            MaterialType::Solid => pos,
            MaterialType::Powder => Self::step_powder(ctx, pos),
            MaterialType::Liquid => Self::step_liquid(ctx, pos),
            MaterialType::Gas => Self::step_gas(ctx, pos),
        }
    }

    fn step_powder<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2) -> IVec2 {
        let Some(cell) = ctx.cell_at(pos) else {
            return pos;
        };
        let materials = ctx.materials;
        let def = materials.get(cell.kind);
        let free_falling = cell.has_flag(cell_flags::FREE_FALLING);

        let mut velocity = cell.velocity;
        velocity.y = (velocity.y + GRAVITY * ctx.dt).clamp(-MAX_FALL_SPEED, MAX_FALL_SPEED);

        let mut delta = Self::displacement(velocity, ctx.dt);
        if velocity.y >= 0.0 {
            delta.y = delta.y.max(1);
        }

        let walk = Self::walk(pos, pos + delta, |p| {
            Self::powder_passage(materials, def, free_falling, ctx.kind_at(p))
        });
        let mut current = pos;
        if walk.reached != pos {
            Self::relocate(ctx, pos, walk.reached);
            current = walk.reached;
        }
        if walk.blocked {
            Self::absorb_impact(ctx.rng, &mut velocity);
        }

        // Only grains that were moving slide off their support
        if current == pos && free_falling {
            let dir = Self::direction(ctx.rng, velocity.x);
            let candidates = [pos + IVec2::new(dir, 1), pos + IVec2::new(-dir, 1)];
            let slide = Self::first_open(&candidates, |p| {
                Self::powder_passage(materials, def, true, ctx.kind_at(p))
            });
            if let Some(target) = slide {
                Self::relocate(ctx, pos, target);
                current = target;
            }
        }

        if current == pos {
            let below = pos + IVec2::Y;
            if Self::resting_on_liquid(ctx, def, below) && ctx.rng.check_probability(SINK_CHANCE) {
                ctx.grid.swap(pos.x, pos.y, below.x, below.y);
                ctx.grid
                    .modify(pos.x, pos.y, |c| c.set_flag(cell_flags::UPDATED, true));
                ctx.stats.record_cell_moved();
                current = below;
            }
        }

        let moved = current != pos;
        if !moved {
            velocity.x *= 1.0 - def.friction;
            velocity.y = 0.0;
        }
        ctx.grid.modify(current.x, current.y, |c| {
            c.velocity = velocity;
            c.set_flag(cell_flags::FREE_FALLING, moved);
        });
        if moved {
            Self::wake_neighbors(ctx, pos);
        }
        current
    }

    fn step_liquid<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2) -> IVec2 {
        let Some(cell) = ctx.cell_at(pos) else {
            return pos;
        };
        let materials = ctx.materials;
        let def = materials.get(cell.kind);

        let mut velocity = cell.velocity;
        velocity.y = (velocity.y + GRAVITY * ctx.dt).clamp(-MAX_FALL_SPEED, MAX_FALL_SPEED);

        let mut delta = Self::displacement(velocity, ctx.dt);
        if velocity.y >= 0.0 {
            delta.y = delta.y.max(1);
        }

        let walk = Self::walk(pos, pos + delta, |p| {
            Self::liquid_passage(materials, def, pos, p, ctx.kind_at(p))
        });
        let mut current = pos;
        if walk.reached != pos {
            Self::relocate(ctx, pos, walk.reached);
            current = walk.reached;
        }
        if walk.blocked {
            Self::absorb_impact(ctx.rng, &mut velocity);
        }

        if current == pos {
            let dir = Self::direction(ctx.rng, velocity.x);
            let candidates = [pos + IVec2::new(dir, 1), pos + IVec2::new(-dir, 1)];
            let diagonal = Self::first_open(&candidates, |p| {
                Self::liquid_passage(materials, def, pos, p, ctx.kind_at(p))
            });
            if let Some(target) = diagonal {
                Self::relocate(ctx, pos, target);
                current = target;
            } else if let Some((target, flow_dir)) = Self::flow_sideways(ctx, pos, def, velocity.x)
            {
                Self::relocate(ctx, pos, target);
                current = target;
                velocity.x = flow_dir as f32 * velocity.x.abs().max(FLOW_SPEED);
            }
        }

        let moved = current != pos;
        if !moved {
            velocity.x *= 1.0 - def.friction;
            velocity.y = velocity.y.min(0.0);
        }
        ctx.grid.modify(current.x, current.y, |c| {
            c.velocity = velocity;
            c.set_flag(cell_flags::FREE_FALLING, moved);
        });
        current
    }

    fn step_gas<R: WorldRng>(ctx: &mut StepContext<'_, R>, pos: IVec2) -> IVec2 {
        let Some(cell) = ctx.cell_at(pos) else {
            return pos;
        };
        let materials = ctx.materials;
        let def = materials.get(cell.kind);

        let mut velocity = cell.velocity;
        velocity.y = (velocity.y - BUOYANCY * ctx.dt).clamp(-MAX_RISE_SPEED, MAX_RISE_SPEED);
        let jitter = ctx.rng.gen_range_f32(-GAS_JITTER, GAS_JITTER);
        velocity.x = ((velocity.x + jitter) * GAS_DAMPING).clamp(-MAX_GAS_DRIFT, MAX_GAS_DRIFT);

        let mut delta = Self::displacement(velocity, ctx.dt);
        if velocity.y <= 0.0 {
            delta.y = delta.y.min(-1);
        }

        let walk = Self::walk(pos, pos + delta, |p| Self::gas_passage(ctx.kind_at(p)));
        let mut current = pos;
        if walk.reached != pos {
            Self::relocate(ctx, pos, walk.reached);
            current = walk.reached;
        }
        if walk.blocked {
            velocity.y = velocity.y.max(0.0);
        }

        if current == pos {
            let dir = Self::direction(ctx.rng, velocity.x);
            let candidates = [
                pos - IVec2::Y,
                pos + IVec2::new(dir, 0),
                pos + IVec2::new(-dir, 0),
                pos + IVec2::new(dir, -1),
                pos + IVec2::new(-dir, -1),
            ];
            if let Some(target) = Self::first_open(&candidates, |p| Self::gas_passage(ctx.kind_at(p)))
            {
                Self::relocate(ctx, pos, target);
                current = target;
            }
        }

        if current == pos {
            velocity.x *= 1.0 - def.friction;
        }
        ctx.grid
            .modify(current.x, current.y, |c| c.velocity = velocity);
        current
    }

    /// Liquids flow up to `dispersion` cells sideways, biased toward their velocity
    fn flow_sideways<R: WorldRng>(
        ctx: &mut StepContext<'_, R>,
        pos: IVec2,
        def: &MaterialDef,
        velocity_x: f32,
    ) -> Option<(IVec2, i32)> {
        if !ctx.rng.check_probability(def.flow_chance) {
            return None;
        }

        let speed = velocity_x.abs();
        let first = if speed < DIRECTION_EPSILON {
            ctx.rng.gen_sign()
        } else {
            let toward = if velocity_x > 0.0 { 1 } else { -1 };
            let keep = 0.5 + 0.5 * speed / (speed + FLOW_BIAS_SPEED);
            if ctx.rng.check_probability(keep) { toward } else { -toward }
        };

        let materials = ctx.materials;
        let reach = i32::from(def.dispersion.max(1));
        for dir in [first, -first] {
            let mut reached = pos;
            for step in 1..=reach {
                let target = pos + IVec2::new(dir * step, 0);
                match Self::liquid_passage(materials, def, pos, target, ctx.kind_at(target)) {
                    Passage::Open => reached = target,
                    Passage::Stop => {
                        reached = target;
                        break;
                    }
                    Passage::Blocked => break,
                }
                // Stop above a drop; the liquid falls from there next tick
                if ctx.grid.is_empty_at(target.x, target.y + 1) {
                    break;
                }
            }
            if reached != pos {
                return Some((reached, dir));
            }
        }
        None
    }

    /// Move the cell at `from` into `to`, resolving whatever occupies `to`
    fn relocate<R: WorldRng>(ctx: &mut StepContext<'_, R>, from: IVec2, to: IVec2) {
        if from == to {
            return;
        }
        let (Some(mover), Some(target)) = (ctx.cell_at(from), ctx.cell_at(to)) else {
            return;
        };
        let materials = ctx.materials;
        let mover_def = materials.get(mover.kind);
        let target_def = materials.get(target.kind);

        if !target.is_empty() && target_def.is_liquid() {
            match mover_def.material_type {
                MaterialType::Powder => {
                    Self::displace_liquid(ctx, from, to, mover_def, target_def);
                    ctx.stats.record_cell_moved();
                    return;
                }
                MaterialType::Liquid => {
                    let flip = ctx.rng.check_probability(DENSITY_FLIP_CHANCE);
                    ctx.grid.swap(from.x, from.y, to.x, to.y);
                    ctx.grid.modify(from.x, from.y, |c| {
                        c.velocity.y = -DENSITY_KICK;
                        if flip {
                            c.velocity.x = -c.velocity.x;
                        }
                        c.set_flag(cell_flags::UPDATED, true);
                    });
                    ctx.stats.record_cell_moved();
                    return;
                }
                _ => {}
            }
        }

        ctx.grid.swap(from.x, from.y, to.x, to.y);
        if !target.is_empty() {
            ctx.grid
                .modify(from.x, from.y, |c| c.set_flag(cell_flags::UPDATED, true));
        }
        ctx.stats.record_cell_moved();
    }

    /// A powder takes the liquid's cell; the liquid splashes to the nearest free spot
    fn displace_liquid<R: WorldRng>(
        ctx: &mut StepContext<'_, R>,
        from: IVec2,
        to: IVec2,
        mover: &MaterialDef,
        liquid: &MaterialDef,
    ) {
        ctx.grid.swap(from.x, from.y, to.x, to.y);

        let mut landing = from;
        if let Some((x, y)) = NeighborQueries::nearest_empty(ctx.grid, to.x, to.y, SPLASH_RADIUS) {
            ctx.grid.swap(from.x, from.y, x, y);
            landing = IVec2::new(x, y);
        }

        let total_mass = mover.mass + liquid.mass;
        let strength = if total_mass > 0.0 {
            SPLASH_SPEED * mover.mass / total_mass
        } else {
            0.0
        };
        let splash = Vec2::new(
            ctx.rng.gen_range_f32(-1.0, 1.0) * strength,
            -ctx.rng.gen_range_f32(0.5, 1.0) * strength,
        );
        ctx.grid.modify(landing.x, landing.y, |c| {
            c.velocity = splash;
            c.set_flag(cell_flags::UPDATED, true);
        });
    }

    /// Knock resting powders beside a moved grain loose, unless their inertia holds them
    fn wake_neighbors<R: WorldRng>(ctx: &mut StepContext<'_, R>, origin: IVec2) {
        let materials = ctx.materials;
        for dx in [-1, 1] {
            let p = origin + IVec2::new(dx, 0);
            let Some(cell) = ctx.cell_at(p) else {
                continue;
            };
            let def = materials.get(cell.kind);
            if def.material_type != MaterialType::Powder || cell.has_flag(cell_flags::FREE_FALLING) {
                continue;
            }
            if ctx.rng.check_probability(1.0 - def.inertia) {
                ctx.grid
                    .modify(p.x, p.y, |c| c.set_flag(cell_flags::FREE_FALLING, true));
            }
        }
    }

    fn resting_on_liquid<R: WorldRng>(
        ctx: &StepContext<'_, R>,
        def: &MaterialDef,
        below: IVec2,
    ) -> bool {
        ctx.kind_at(below).is_some_and(|kind| {
            let under = ctx.def(kind);
            kind != MaterialKind::Empty && under.is_liquid() && def.density > under.density
        })
    }

    /// Landing turns fall speed into sideways spread
    fn absorb_impact<R: WorldRng>(rng: &mut R, velocity: &mut Vec2) {
        if velocity.y > IMPACT_SPEED {
            let dir = Self::direction(rng, velocity.x) as f32;
            velocity.x = dir * velocity.x.abs().max(velocity.y * IMPACT_SPREAD);
        }
        velocity.y = 0.0;
    }

    fn powder_passage(
        materials: &Materials,
        mover: &MaterialDef,
        free_falling: bool,
        target: Option<MaterialKind>,
    ) -> Passage {
        let Some(kind) = target else {
            return Passage::Blocked;
        };
        if kind == MaterialKind::Empty {
            return Passage::Open;
        }
        let def = materials.get(kind);
        match def.material_type {
            MaterialType::Gas => Passage::Open,
            MaterialType::Liquid if free_falling && mover.density > def.density => Passage::Stop,
            _ => Passage::Blocked,
        }
    }

    /// A denser liquid only displaces a lighter one level with or below it
    fn liquid_passage(
        materials: &Materials,
        mover: &MaterialDef,
        from: IVec2,
        to: IVec2,
        target: Option<MaterialKind>,
    ) -> Passage {
        let Some(kind) = target else {
            return Passage::Blocked;
        };
        if kind == MaterialKind::Empty {
            return Passage::Open;
        }
        let def = materials.get(kind);
        match def.material_type {
            MaterialType::Gas => Passage::Open,
            MaterialType::Liquid
                if kind != mover.kind && mover.density > def.density && to.y >= from.y =>
            {
                Passage::Stop
            }
            _ => Passage::Blocked,
        }
    }

    fn gas_passage(target: Option<MaterialKind>) -> Passage {
        match target {
            Some(MaterialKind::Empty) => Passage::Open,
            Some(MaterialKind::Water | MaterialKind::Oil) => Passage::Stop,
            _ => Passage::Blocked,
        }
    }

    fn walk(from: IVec2, to: IVec2, mut passage: impl FnMut(IVec2) -> Passage) -> Walk {
        let mut reached = from;
        for point in Self::rasterize(from, to) {
            match passage(point) {
                Passage::Open => reached = point,
                Passage::Stop => {
                    return Walk {
                        reached: point,
                        blocked: point != to,
                    };
                }
                Passage::Blocked => {
                    return Walk {
                        reached,
                        blocked: true,
                    };
                }
            }
        }
        Walk {
            reached,
            blocked: false,
        }
    }

    /// Cells on the line from `from` to `to`, excluding `from` and ending at `to`
    fn rasterize(from: IVec2, to: IVec2) -> SmallVec<[IVec2; 16]> {
        if from == to {
            return SmallVec::new();
        }
        let mut points: SmallVec<[IVec2; 16]> = Bresenham::new(
            (from.x as isize, from.y as isize),
            (to.x as isize, to.y as isize),
        )
        .map(|(x, y)| IVec2::new(x as i32, y as i32))
        .collect();
        points.push(to);
        points.dedup();
        points.retain(|p| *p != from);
        points
    }

    fn first_open(
        candidates: &[IVec2],
        mut passage: impl FnMut(IVec2) -> Passage,
    ) -> Option<IVec2> {
        candidates
            .iter()
            .copied()
            .find(|p| passage(*p) != Passage::Blocked)
    }

    fn displacement(velocity: Vec2, dt: f32) -> IVec2 {
        let travel = velocity * dt;
        IVec2::new(
            (travel.x.round() as i32).clamp(-MAX_CELLS_PER_TICK, MAX_CELLS_PER_TICK),
            (travel.y.round() as i32).clamp(-MAX_CELLS_PER_TICK, MAX_CELLS_PER_TICK),
        )
    }

    fn direction<R: WorldRng>(rng: &mut R, velocity_x: f32) -> i32 {
        if velocity_x > DIRECTION_EPSILON {
            1
        } else if velocity_x < -DIRECTION_EPSILON {
            -1
        } else {
            rng.gen_sign()
        }
    }
}
