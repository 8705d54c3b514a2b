//! Demo scenes painted onto a fresh world with brush operations

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use sandsim_core::World;
use sandsim_materials::MaterialKind;

/// Starting layouts for new worlds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scene {
    /// Nothing at all
    Empty,
    /// A bit of everything: dunes, a pond, an oil slick, a bonfire, a lava pocket and acid
    Sandbox,
    /// Layered liquids poured into a stone basin
    Layers,
    /// A wooden hut with a gunpowder cellar next to a fire
    Bonfire,
}

impl Scene {
    pub const ALL: [Scene; 4] = [Scene::Empty, Scene::Sandbox, Scene::Layers, Scene::Bonfire];

    pub fn name(self) -> &'static str {
        match self {
            Scene::Empty => "empty",
            Scene::Sandbox => "sandbox",
            Scene::Layers => "layers",
            Scene::Bonfire => "bonfire",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Scene::Empty => "An empty world",
            Scene::Sandbox => "Sand dunes, water, oil, wood, fire, lava, stone and acid",
            Scene::Layers => "Water, oil and acid settling in a stone basin",
            Scene::Bonfire => "A wooden hut over a gunpowder cellar, next to a fire",
        }
    }

    /// Paint this scene onto `world`, scaled to its size
    pub fn paint(self, world: &mut World) {
        let canvas = Canvas::new(world.width(), world.height());
        match self {
            Scene::Empty => {}
            Scene::Sandbox => paint_sandbox(world, &canvas),
            Scene::Layers => paint_layers(world, &canvas),
            Scene::Bonfire => paint_bonfire(world, &canvas),
        }
        log::info!(
            "Painted scene '{}' ({} cells)",
            self.name(),
            world.grid().count_non_empty()
        );
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scene {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Scene::ALL
            .into_iter()
            .find(|scene| scene.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Scene::ALL.iter().map(|scene| scene.name()).collect();
                anyhow::anyhow!("Unknown scene '{}'. Valid: {}", s, names.join(", "))
            })
    }
}

/// Maps fractions of the world size to cell coordinates
struct Canvas {
    width: f32,
    height: f32,
}

impl Canvas {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
        }
    }

    fn point(&self, fx: f32, fy: f32) -> Vec2 {
        Vec2::new(fx * (self.width - 1.0).max(0.0), fy * (self.height - 1.0).max(0.0))
    }

    fn cell(&self, fx: f32, fy: f32) -> (i32, i32) {
        let p = self.point(fx, fy);
        (p.x.round() as i32, p.y.round() as i32)
    }

    /// Brush radius as a fraction of the smaller side, at least one cell
    fn radius(&self, fraction: f32) -> f32 {
        (self.width.min(self.height) * fraction).max(1.0)
    }
}

fn paint_sandbox(world: &mut World, canvas: &Canvas) {
    // Stone floor and a ledge
    let floor = canvas.radius(0.02);
    world.stroke_line(canvas.point(0.0, 1.0), canvas.point(1.0, 1.0), floor, MaterialKind::Stone);
    world.stroke_line(canvas.point(0.55, 0.6), canvas.point(0.8, 0.6), floor, MaterialKind::Stone);

    // Dunes
    let (x, y) = canvas.cell(0.15, 0.85);
    world.insert_circle(x, y, canvas.radius(0.12), MaterialKind::Sand);
    let (x, y) = canvas.cell(0.3, 0.2);
    world.insert_circle(x, y, canvas.radius(0.06), MaterialKind::Salt);

    // Pond with an oil slick above it
    let (x, y) = canvas.cell(0.45, 0.8);
    world.insert_circle(x, y, canvas.radius(0.1), MaterialKind::Water);
    let (x, y) = canvas.cell(0.45, 0.55);
    world.insert_circle(x, y, canvas.radius(0.05), MaterialKind::Oil);

    // Bonfire on the ledge
    let (x, y) = canvas.cell(0.7, 0.5);
    world.insert_circle(x, y, canvas.radius(0.05), MaterialKind::Wood);
    let (x, y) = canvas.cell(0.62, 0.5);
    world.insert_circle(x, y, canvas.radius(0.02), MaterialKind::Gunpowder);
    let (x, y) = canvas.cell(0.7, 0.4);
    world.insert_circle(x, y, canvas.radius(0.02), MaterialKind::Fire);

    // Lava pocket and an acid drop
    let (x, y) = canvas.cell(0.9, 0.9);
    world.insert_circle(x, y, canvas.radius(0.06), MaterialKind::Lava);
    let (x, y) = canvas.cell(0.15, 0.3);
    world.insert_circle(x, y, canvas.radius(0.03), MaterialKind::Acid);
}

fn paint_layers(world: &mut World, canvas: &Canvas) {
    let wall = canvas.radius(0.02);
    world.stroke_line(canvas.point(0.1, 0.3), canvas.point(0.1, 1.0), wall, MaterialKind::Stone);
    world.stroke_line(canvas.point(0.9, 0.3), canvas.point(0.9, 1.0), wall, MaterialKind::Stone);
    world.stroke_line(canvas.point(0.1, 1.0), canvas.point(0.9, 1.0), wall, MaterialKind::Stone);

    // Lightest first so everything has to sort itself out
    let blob = canvas.radius(0.1);
    let (x, y) = canvas.cell(0.5, 0.8);
    world.insert_circle(x, y, blob, MaterialKind::Oil);
    let (x, y) = canvas.cell(0.35, 0.4);
    world.insert_circle(x, y, blob, MaterialKind::Water);
    let (x, y) = canvas.cell(0.65, 0.4);
    world.insert_circle(x, y, blob * 0.5, MaterialKind::Acid);
}

fn paint_bonfire(world: &mut World, canvas: &Canvas) {
    let thick = canvas.radius(0.02);
    world.stroke_line(canvas.point(0.0, 1.0), canvas.point(1.0, 1.0), thick, MaterialKind::Stone);

    // Cellar
    let (x, y) = canvas.cell(0.5, 0.92);
    world.insert_circle(x, y, canvas.radius(0.06), MaterialKind::Gunpowder);

    // Hut walls and roof
    world.stroke_line(canvas.point(0.35, 0.55), canvas.point(0.35, 0.85), thick, MaterialKind::Wood);
    world.stroke_line(canvas.point(0.65, 0.55), canvas.point(0.65, 0.85), thick, MaterialKind::Wood);
    world.stroke_line(canvas.point(0.3, 0.55), canvas.point(0.7, 0.55), thick, MaterialKind::Wood);

    // Fire right next to the wall
    let (x, y) = canvas.cell(0.3, 0.8);
    world.insert_circle(x, y, canvas.radius(0.02), MaterialKind::Fire);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scene_names() {
        for scene in Scene::ALL {
            assert_eq!(scene.name().parse::<Scene>().unwrap(), scene);
        }
        assert_eq!(" SandBox ".parse::<Scene>().unwrap(), Scene::Sandbox);
        assert!("volcano".parse::<Scene>().is_err());
    }

    #[test]
    fn test_empty_scene_paints_nothing() {
        let mut world = World::new(50, 40);
        Scene::Empty.paint(&mut world);
        assert_eq!(world.grid().count_non_empty(), 0);
    }

    #[test]
    fn test_sandbox_uses_every_brush_material() {
        let mut world = World::new(160, 120);
        Scene::Sandbox.paint(&mut world);

        for kind in [
            MaterialKind::Sand,
            MaterialKind::Water,
            MaterialKind::Oil,
            MaterialKind::Wood,
            MaterialKind::Gunpowder,
            MaterialKind::Lava,
            MaterialKind::Stone,
            MaterialKind::Acid,
            MaterialKind::Fire,
        ] {
            assert!(world.grid().count_kind(kind) > 0, "{kind} missing");
        }
    }

    #[test]
    fn test_scenes_fit_tiny_worlds() {
        for scene in Scene::ALL {
            let mut world = World::new(3, 2);
            scene.paint(&mut world);
            assert!(world.grid().count_non_empty() <= 6);
        }
    }

    #[test]
    fn test_layers_scene_has_a_basin() {
        let mut world = World::new(100, 80);
        Scene::Layers.paint(&mut world);
        assert!(world.grid().count_kind(MaterialKind::Stone) > 0);
        assert!(world.grid().count_kind(MaterialKind::Oil) > 0);
    }
}
