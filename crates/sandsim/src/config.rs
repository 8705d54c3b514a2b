//! Simulation configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `sandsim.ron` file (if exists)
//! 3. Environment variables prefixed with `SANDSIM_`
//!
//! Example environment variable: `SANDSIM_WORLD__WIDTH=320`

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "sandsim.ron";

/// Main simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SimConfig {
    #[serde(default)]
    pub world: WorldConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub render: RenderConfig,
}

/// Size and randomness of new worlds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldConfig {
    pub width: usize,
    pub height: usize,
    /// Seed for the world's random generator
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 629,
            height: 424,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    /// Seconds per tick
    pub delta_time: f32,
    /// Ticks per `run`
    pub ticks: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            delta_time: 1.0 / 60.0,
            ticks: 600,
        }
    }
}

/// Where snapshots live and how new ones are named (`<base_name><N>.<extension>`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    pub directory: String,
    pub base_name: String,
    pub extension: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: "worlds".to_string(),
            base_name: "world".to_string(),
            extension: "rrr".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderConfig {
    /// Integer upscale factor for thumbnails
    pub scale: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { scale: 1 }
    }
}

impl SimConfig {
    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. `sandsim.ron` file (if exists)
    /// 3. Environment variables prefixed with `SANDSIM_` (highest priority)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Same layering as [`SimConfig::load`] with an explicit config file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = SimConfig::default();
        let builder = Config::builder()
            // Layer 1: Compiled defaults
            .set_default("world.width", defaults.world.width as i64)?
            .set_default("world.height", defaults.world.height as i64)?
            .set_default("world.seed", defaults.world.seed as i64)?
            .set_default("simulation.delta_time", f64::from(defaults.simulation.delta_time))?
            .set_default("simulation.ticks", defaults.simulation.ticks as i64)?
            .set_default("storage.directory", defaults.storage.directory)?
            .set_default("storage.base_name", defaults.storage.base_name)?
            .set_default("storage.extension", defaults.storage.extension)?
            .set_default("render.scale", i64::from(defaults.render.scale))?
            // Layer 2: Config file (optional, won't error if missing)
            .add_source(
                File::from(path)
                    .format(FileFormat::Ron)
                    .required(false),
            )
            // Layer 3: Environment variables (SANDSIM_WORLD__WIDTH, etc.)
            .add_source(
                Environment::with_prefix("SANDSIM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build().context("Failed to build configuration")?;

        let loaded: SimConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        loaded.validate()?;
        log::debug!("Loaded configuration: {:?}", loaded);
        Ok(loaded)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.simulation.delta_time.is_finite() && self.simulation.delta_time >= 0.0) {
            anyhow::bail!(
                "simulation.delta_time must be a non-negative number, got {}",
                self.simulation.delta_time
            );
        }
        if self.render.scale == 0 {
            anyhow::bail!("render.scale must be at least 1");
        }
        if self.storage.extension.is_empty() || self.storage.extension.contains('.') {
            anyhow::bail!(
                "storage.extension must be a bare extension, got {:?}",
                self.storage.extension
            );
        }
        Ok(())
    }
}
