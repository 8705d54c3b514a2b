use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sandsim::{Scene, SimConfig, render};
use sandsim_core::World;
use sandsim_core::world::{SnapshotStore, TickStats};
use sandsim_materials::Materials;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Snapshot directory (overrides storage.directory)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Seed for the world's random generator (overrides world.seed)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new world from a demo scene and save it
    New {
        /// Scene to paint: empty, sandbox, layers, bonfire
        #[arg(long, default_value = "sandbox")]
        scene: String,

        #[arg(long)]
        width: Option<usize>,

        #[arg(long)]
        height: Option<usize>,
    },

    /// Load a snapshot, run ticks and save the result as a new snapshot
    Run {
        snapshot: PathBuf,

        /// Number of ticks (overrides simulation.ticks)
        #[arg(long)]
        ticks: Option<usize>,

        /// Seconds per tick (overrides simulation.delta_time)
        #[arg(long)]
        dt: Option<f32>,
    },

    /// Render a snapshot to PNG
    Render {
        snapshot: PathBuf,

        /// Output path (default: snapshot path with a .png extension)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Integer upscale (overrides render.scale)
        #[arg(long)]
        scale: Option<u32>,
    },

    /// List saved snapshots
    List,

    /// Print the material catalog as RON
    Materials,

    /// List available demo scenes
    Scenes,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = SimConfig::load()?;
    if let Some(dir) = &args.dir {
        config.storage.directory = dir.to_string_lossy().into_owned();
    }
    if let Some(seed) = args.seed {
        config.world.seed = seed;
    }

    let store = SnapshotStore::new(
        &config.storage.directory,
        &config.storage.base_name,
        &config.storage.extension,
    );

    match args.command {
        Command::New {
            scene,
            width,
            height,
        } => {
            let scene: Scene = scene.parse()?;
            let width = width.unwrap_or(config.world.width);
            let height = height.unwrap_or(config.world.height);
            let mut world = World::with_seed(width, height, config.world.seed);
            scene.paint(&mut world);
            let path = store.save(&world)?;
            println!("{}", path.display());
        }
        Command::Run {
            snapshot,
            ticks,
            dt,
        } => {
            let ticks = ticks.unwrap_or(config.simulation.ticks);
            let dt = dt.unwrap_or(config.simulation.delta_time);
            let path = run_snapshot(&store, &snapshot, ticks, dt, config.world.seed)?;
            println!("{}", path.display());
        }
        Command::Render {
            snapshot,
            output,
            scale,
        } => {
            let data = store.read(&snapshot)?;
            let output = output.unwrap_or_else(|| snapshot.with_extension("png"));
            render::save_thumbnail(&data, scale.unwrap_or(config.render.scale), &output)?;
            println!("{}", output.display());
        }
        Command::List => {
            for path in store.list()? {
                match store.read(&path) {
                    Ok(snapshot) => println!(
                        "{}\t{}x{}\tframe {}",
                        path.display(),
                        snapshot.width,
                        snapshot.height,
                        snapshot.frame_counter
                    ),
                    Err(e) => {
                        log::warn!("Skipping {}: {:#}", path.display(), e);
                    }
                }
            }
        }
        Command::Materials => {
            let materials = Materials::new();
            let defs: Vec<_> = materials.iter().collect();
            let text = ron::ser::to_string_pretty(&defs, ron::ser::PrettyConfig::default())
                .context("Failed to serialize material catalog")?;
            println!("{}", text);
        }
        Command::Scenes => {
            for scene in Scene::ALL {
                println!("{:<10} {}", scene.name(), scene.description());
            }
        }
    }

    Ok(())
}

fn run_snapshot(
    store: &SnapshotStore,
    snapshot: &Path,
    ticks: usize,
    dt: f32,
    seed: u64,
) -> Result<PathBuf> {
    let bytes = std::fs::read(snapshot)
        .with_context(|| format!("Failed to read {}", snapshot.display()))?;
    let mut world = World::from_snapshot(&bytes, seed)
        .with_context(|| format!("Failed to load {}", snapshot.display()))?;
    log::info!(
        "Running {} ticks on {}x{} world from frame {}",
        ticks,
        world.width(),
        world.height(),
        world.frame_counter()
    );

    let pb = ProgressBar::new(ticks as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("█▓░"),
    );

    let mut totals = TickStats::default();
    for _ in 0..ticks {
        world.update(dt);
        totals.accumulate(&world.last_tick_stats());
        pb.inc(1);
    }
    pb.finish_with_message(format!("frame {}", world.frame_counter()));

    log::info!(
        "Moved {} cells, {} reactions, {} phase changes, {} explosions",
        totals.cells_moved,
        totals.reactions,
        totals.phase_changes,
        totals.explosions
    );
    store.save(&world)
}
