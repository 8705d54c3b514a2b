//! Material definitions and registry

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of materials a cell can hold
///
/// The discriminants are the on-disk kind bytes of a snapshot.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    #[default]
    Empty = 0,
    Sand = 1,
    Water = 2,
    Salt = 3,
    Wood = 4,
    Fire = 5,
    Smoke = 6,
    Ember = 7,
    Steam = 8,
    Gunpowder = 9,
    Oil = 10,
    Lava = 11,
    Stone = 12,
    Acid = 13,
}

/// A kind byte that names no material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid material byte {0}")]
pub struct InvalidMaterialByte(pub u8);

/// A material name that names no material
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown material '{0}'")]
pub struct UnknownMaterialName(pub String);

impl MaterialKind {
    pub const COUNT: usize = 14;

    pub const ALL: [MaterialKind; Self::COUNT] = [
        MaterialKind::Empty,
        MaterialKind::Sand,
        MaterialKind::Water,
        MaterialKind::Salt,
        MaterialKind::Wood,
        MaterialKind::Fire,
        MaterialKind::Smoke,
        MaterialKind::Ember,
        MaterialKind::Steam,
        MaterialKind::Gunpowder,
        MaterialKind::Oil,
        MaterialKind::Lava,
        MaterialKind::Stone,
        MaterialKind::Acid,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            MaterialKind::Empty => "empty",
            MaterialKind::Sand => "sand",
            MaterialKind::Water => "water",
            MaterialKind::Salt => "salt",
            MaterialKind::Wood => "wood",
            MaterialKind::Fire => "fire",
            MaterialKind::Smoke => "smoke",
            MaterialKind::Ember => "ember",
            MaterialKind::Steam => "steam",
            MaterialKind::Gunpowder => "gunpowder",
            MaterialKind::Oil => "oil",
            MaterialKind::Lava => "lava",
            MaterialKind::Stone => "stone",
            MaterialKind::Acid => "acid",
        }
    }
}

impl TryFrom<u8> for MaterialKind {
    type Error = InvalidMaterialByte;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        MaterialKind::ALL
            .get(value as usize)
            .copied()
            .ok_or(InvalidMaterialByte(value))
    }
}

impl FromStr for MaterialKind {
    type Err = UnknownMaterialName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        MaterialKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| UnknownMaterialName(s.to_string()))
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a material behaves physically
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialType {
    /// Doesn't move (stone, wood)
    Solid,
    /// Falls, piles up (sand, salt, gunpowder, ember)
    Powder,
    /// Flows, seeks level (water, oil, lava, acid)
    Liquid,
    /// Rises, disperses (steam, smoke, fire)
    Gas,
}

/// Definition of a material's properties
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaterialDef {
    pub kind: MaterialKind,
    pub name: String,
    pub material_type: MaterialType,

    /// Base color (RGBA)
    pub color: [u8; 4],
    /// Per-channel random offset range (RGB) applied at creation
    pub color_variation: [u8; 3],
    /// Alternative colors; when non-empty a new cell picks one of these
    pub palette: Vec<[u8; 4]>,

    /// Density (g/cm³) - decides sinking and liquid layering
    pub density: f32,
    /// Horizontal velocity lost per blocked tick (0.0 - 1.0)
    pub friction: f32,
    /// Resistance to being knocked into free fall by a moving neighbor (0.0 - 1.0)
    pub inertia: f32,
    /// Relative mass, scales splash strength when displacing liquid
    pub mass: f32,

    /// Cells a liquid may flow sideways in one tick
    pub dispersion: u8,
    /// Probability per tick that a blocked liquid flows sideways (inverse viscosity)
    pub flow_chance: f32,

    /// Per-tick ignition probability next to full heat (0.0 - 1.0)
    pub flammability: f32,
    /// Probability of resisting conversion inside a blast (0.0 - 1.0)
    pub explosion_resistance: f32,
    /// Seconds after which the cell expires
    pub max_lifetime: Option<f32>,
}

impl MaterialDef {
    pub fn is_flammable(&self) -> bool {
        self.flammability > 0.0
    }

    pub fn is_liquid(&self) -> bool {
        self.material_type == MaterialType::Liquid
    }
}

impl Default for MaterialDef {
    fn default() -> Self {
        Self {
            kind: MaterialKind::Empty,
            name: "unknown".to_string(),
            material_type: MaterialType::Solid,
            color: [255, 0, 255, 255], // Magenta for missing materials
            color_variation: [0, 0, 0],
            palette: Vec::new(),
            density: 1.0,
            friction: 0.5,
            inertia: 0.0,
            mass: 1.0,
            dispersion: 0,
            flow_chance: 0.0,
            flammability: 0.0,
            explosion_resistance: 0.0,
            max_lifetime: None,
        }
    }
}

/// Registry of all materials
pub struct Materials {
    materials: Vec<MaterialDef>,
}

impl Materials {
    pub fn new() -> Self {
        let mut materials = Self {
            materials: Vec::with_capacity(MaterialKind::COUNT),
        };
        materials.register_defaults();
        log::debug!("Registered {} materials", materials.materials.len());
        materials
    }

    fn register_defaults(&mut self) {
        self.register(MaterialDef {
            kind: MaterialKind::Empty,
            name: "empty".to_string(),
            material_type: MaterialType::Gas,
            color: [0, 0, 0, 0],
            density: 0.0,
            friction: 0.0,
            mass: 0.0,
            ..Default::default()
        });

        self.register(MaterialDef {
            kind: MaterialKind::Sand,
            name: "sand".to_string(),
            material_type: MaterialType::Powder,
            color: [150, 100, 50, 255],
            color_variation: [20, 20, 20],
            density: 1.5,
            friction: 0.3,
            inertia: 0.1,
            explosion_resistance: 0.2,
            ..Default::default()
        });

        self.register(MaterialDef {
            kind: MaterialKind::Water,
            name: "water".to_string(),
            material_type: MaterialType::Liquid,
            color: [20, 100, 170, 200],
            color_variation: [0, 0, 30],
            density: 1.0,
            friction: 0.05,
            dispersion: 5,
            flow_chance: 0.9,
            explosion_resistance: 0.5,
            ..Default::default()
        });

        self.register(MaterialDef {
            kind: MaterialKind::Salt,
            name: "salt".to_string(),
            material_type: MaterialType::Powder,
            color: [200, 180, 190, 255],
            color_variation: [10, 10, 10],
            density: 2.0,
            friction: 0.4,
            inertia: 0.3,
            explosion_resistance: 0.2,
            ..Default::default()
        });

        self.register(MaterialDef {
            kind: MaterialKind::Wood,
            name: "wood".to_string(),
            material_type: MaterialType::Solid,
            color: [60, 40, 20, 255],
            color_variation: [10, 10, 0],
            density: 0.6,
            mass: 0.6,
            flammability: 0.1,
            explosion_resistance: 0.3,
            ..Default::default()
        });

        self.register(MaterialDef {
            kind: MaterialKind::Fire,
            name: "fire".to_string(),
            material_type: MaterialType::Gas,
            color: [150, 20, 0, 255],
            palette: vec![
                [255, 80, 20, 255],
                [250, 150, 10, 255],
                [200, 150, 0, 255],
                [100, 50, 2, 255],
            ],
            density: 0.0001,
            friction: 0.0,
            mass: 0.0,
            max_lifetime: Some(1.0),
            ..Default::default()
        });

        self.register(MaterialDef {
            kind: MaterialKind::Smoke,
            name: "smoke".to_string(),
            material_type: MaterialType::Gas,
            color: [50, 50, 50, 255],
            color_variation: [8, 8, 8],
            density: 0.001,
            friction: 0.1,
            mass: 0.01,
            max_lifetime: Some(3.0),
            ..Default::default()
        });

        self.register(MaterialDef {
            kind: MaterialKind::Ember,
            name: "ember".to_string(),
            material_type: MaterialType::Powder,
            color: [200, 120, 20, 255],
            color_variation: [20, 20, 0],
            density: 1.2,
            friction: 0.5,
            inertia: 0.5,
            mass: 0.5,
            max_lifetime: Some(2.5),
            ..Default::default()
        });

        self.register(MaterialDef {
            kind: MaterialKind::Steam,
            name: "steam".to_string(),
            material_type: MaterialType::Gas,
            color: [220, 220, 250, 255],
            density: 0.0006,
            friction: 0.1,
            mass: 0.01,
            max_lifetime: Some(5.0),
            ..Default::default()
        });

        self.register(MaterialDef {
            kind: MaterialKind::Gunpowder,
            name: "gunpowder".to_string(),
            material_type: MaterialType::Powder,
            color: [60, 60, 60, 255],
            color_variation: [10, 10, 10],
            density: 1.7,
            friction: 0.2,
            inertia: 0.1,
            flammability: 0.8,
            ..Default::default()
        });

        self.register(MaterialDef {
            kind: MaterialKind::Oil,
            name: "oil".to_string(),
            material_type: MaterialType::Liquid,
            color: [80, 70, 60, 255],
            color_variation: [5, 5, 5],
            density: 0.8,
            friction: 0.1,
            mass: 0.8,
            dispersion: 4,
            flow_chance: 0.7,
            flammability: 0.3,
            explosion_resistance: 0.3,
            ..Default::default()
        });

        self.register(MaterialDef {
            kind: MaterialKind::Lava,
            name: "lava".to_string(),
            material_type: MaterialType::Liquid,
            color: [200, 50, 0, 255],
            color_variation: [30, 10, 0],
            density: 3.0,
            friction: 0.4,
            mass: 3.0,
            dispersion: 1,
            flow_chance: 0.25,
            explosion_resistance: 0.8,
            ..Default::default()
        });

        self.register(MaterialDef {
            kind: MaterialKind::Stone,
            name: "stone".to_string(),
            material_type: MaterialType::Solid,
            color: [120, 110, 120, 255],
            color_variation: [20, 20, 20],
            density: 2.5,
            mass: 2.5,
            explosion_resistance: 0.95,
            ..Default::default()
        });

        self.register(MaterialDef {
            kind: MaterialKind::Acid,
            name: "acid".to_string(),
            material_type: MaterialType::Liquid,
            color: [90, 200, 60, 255],
            color_variation: [0, 30, 0],
            density: 1.1,
            friction: 0.08,
            dispersion: 3,
            flow_chance: 0.8,
            explosion_resistance: 0.4,
            ..Default::default()
        });
    }

    fn register(&mut self, material: MaterialDef) {
        let id = material.kind.index();

        // Ensure vec is large enough
        if self.materials.len() <= id {
            self.materials.resize(id + 1, MaterialDef::default());
        }

        self.materials[id] = material;
    }

    /// Get material definition by kind
    pub fn get(&self, kind: MaterialKind) -> &MaterialDef {
        self.materials
            .get(kind.index())
            .unwrap_or(&self.materials[0])
    }

    /// All definitions in kind order
    pub fn iter(&self) -> impl Iterator<Item = &MaterialDef> {
        self.materials.iter()
    }
}

impl Default for Materials {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_registered_in_order() {
        let materials = Materials::new();
        for kind in MaterialKind::ALL {
            assert_eq!(materials.get(kind).kind, kind);
            assert_eq!(materials.get(kind).name, kind.name());
        }
        assert_eq!(materials.iter().count(), MaterialKind::COUNT);
    }

    #[test]
    fn test_kind_byte_roundtrip() {
        for kind in MaterialKind::ALL {
            assert_eq!(MaterialKind::try_from(kind.as_u8()), Ok(kind));
        }
        assert_eq!(MaterialKind::try_from(14), Err(InvalidMaterialByte(14)));
        assert_eq!(MaterialKind::try_from(255), Err(InvalidMaterialByte(255)));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Sand".parse::<MaterialKind>(), Ok(MaterialKind::Sand));
        assert_eq!(" gunpowder ".parse::<MaterialKind>(), Ok(MaterialKind::Gunpowder));
        assert!("plasma".parse::<MaterialKind>().is_err());
    }

    #[test]
    fn test_density_ordering() {
        let materials = Materials::new();
        let water = materials.get(MaterialKind::Water).density;
        let oil = materials.get(MaterialKind::Oil).density;
        assert!(water > oil, "oil must float on water");
        assert!(materials.get(MaterialKind::Sand).density > water);
    }

    #[test]
    fn test_empty_is_transparent() {
        let materials = Materials::new();
        assert_eq!(materials.get(MaterialKind::Empty).color, [0, 0, 0, 0]);
    }

    #[test]
    fn test_flammable_set() {
        let materials = Materials::new();
        let flammable: Vec<MaterialKind> = MaterialKind::ALL
            .into_iter()
            .filter(|kind| materials.get(*kind).is_flammable())
            .collect();
        assert_eq!(
            flammable,
            vec![MaterialKind::Wood, MaterialKind::Gunpowder, MaterialKind::Oil]
        );
    }
}
