//! World snapshots - fixed little-endian binary layout
//!
//! Layout: a 12-byte header (`width: i32`, `height: i32`, `frame_counter: u32`)
//! followed by one 17-byte record per cell in row-major order (`kind: u8`,
//! `velocity.x: f32`, `velocity.y: f32`, `lifetime: f32`, `rgba: [u8; 4]`).
//! No magic number and no version field.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bincode_next::config::{Config, legacy};
use bincode_next::error::{DecodeError, EncodeError};
use glam::Vec2;
use sandsim_materials::{Cell, MaterialKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::world::World;

pub const HEADER_SIZE: usize = 12;
pub const RECORD_SIZE: usize = 17;

/// Errors raised while encoding, decoding or applying a snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] EncodeError),

    #[error("failed to decode snapshot: {0}")]
    Decode(#[from] DecodeError),

    #[error("invalid snapshot dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    #[error("snapshot is {}x{}, world is {}x{}", .found.0, .found.1, .expected.0, .expected.1)]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("snapshot is {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },

    #[error("unknown material byte {value} in cell {index}")]
    UnknownMaterial { index: usize, value: u8 },

    #[error("no free snapshot name left in {}", .dir.display())]
    NamesExhausted { dir: PathBuf },
}

#[derive(Serialize, Deserialize)]
struct SnapshotHeader {
    width: i32,
    height: i32,
    frame_counter: u32,
}

#[derive(Serialize, Deserialize)]
struct CellRecord {
    kind: u8,
    velocity_x: f32,
    velocity_y: f32,
    lifetime: f32,
    color: [u8; 4],
}

impl From<&Cell> for CellRecord {
    fn from(cell: &Cell) -> Self {
        Self {
            kind: cell.kind.as_u8(),
            velocity_x: cell.velocity.x,
            velocity_y: cell.velocity.y,
            lifetime: cell.lifetime,
            color: cell.color,
        }
    }
}

/// Fixed-width little-endian integers, no length prefixes
fn wire_config() -> impl Config {
    legacy()
}

/// A decoded snapshot, independent of any world
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub width: usize,
    pub height: usize,
    pub frame_counter: u32,
    /// Row-major cells with per-tick flags cleared
    pub cells: Vec<Cell>,
}

impl Snapshot {
    /// Copy the current state of a world
    pub fn capture(world: &World) -> Self {
        Self {
            width: world.width(),
            height: world.height(),
            frame_counter: world.frame_counter(),
            cells: world
                .grid()
                .cells()
                .iter()
                .map(|cell| Cell { flags: 0, ..*cell })
                .collect(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        encode_cells(self.width, self.height, self.frame_counter, &self.cells)
    }

    /// Read only the header: `(width, height, frame_counter)`
    pub fn read_header(bytes: &[u8]) -> Result<(usize, usize, u32), SnapshotError> {
        if bytes.len() < HEADER_SIZE {
            return Err(SnapshotError::Length {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        let (header, _): (SnapshotHeader, usize) =
            bincode_next::serde::decode_from_slice(&bytes[..HEADER_SIZE], wire_config())?;
        let (Ok(width), Ok(height)) = (usize::try_from(header.width), usize::try_from(header.height))
        else {
            return Err(SnapshotError::InvalidDimensions {
                width: header.width.into(),
                height: header.height.into(),
            });
        };
        Ok((width, height, header.frame_counter))
    }

    /// Decode a whole snapshot
    ///
    /// The byte count must match the header exactly and every kind byte must
    /// name a known material.
    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let (width, height, frame_counter) = Self::read_header(bytes)?;
        let invalid = || SnapshotError::InvalidDimensions {
            width: width as i64,
            height: height as i64,
        };
        let area = width.checked_mul(height).ok_or_else(invalid)?;
        let expected = area
            .checked_mul(RECORD_SIZE)
            .and_then(|body| body.checked_add(HEADER_SIZE))
            .ok_or_else(invalid)?;
        if bytes.len() != expected {
            return Err(SnapshotError::Length {
                expected,
                actual: bytes.len(),
            });
        }

        let mut cells = Vec::with_capacity(area);
        for (index, chunk) in bytes[HEADER_SIZE..].chunks_exact(RECORD_SIZE).enumerate() {
            let (record, _): (CellRecord, usize) =
                bincode_next::serde::decode_from_slice(chunk, wire_config())?;
            let kind = MaterialKind::try_from(record.kind).map_err(|_| {
                SnapshotError::UnknownMaterial {
                    index,
                    value: record.kind,
                }
            })?;
            let cell = if kind == MaterialKind::Empty {
                Cell::EMPTY
            } else {
                Cell {
                    kind,
                    velocity: Vec2::new(record.velocity_x, record.velocity_y),
                    lifetime: record.lifetime,
                    color: record.color,
                    flags: 0,
                }
            };
            cells.push(cell);
        }

        Ok(Self {
            width,
            height,
            frame_counter,
            cells,
        })
    }

    /// Row-major RGBA8 bytes of the stored cells
    pub fn color_buffer(&self) -> Vec<u8> {
        self.cells.iter().flat_map(|cell| cell.color).collect()
    }
}

fn encode_cells(
    width: usize,
    height: usize,
    frame_counter: u32,
    cells: &[Cell],
) -> Result<Vec<u8>, SnapshotError> {
    let invalid = || SnapshotError::InvalidDimensions {
        width: width as i64,
        height: height as i64,
    };
    let header = SnapshotHeader {
        width: i32::try_from(width).map_err(|_| invalid())?,
        height: i32::try_from(height).map_err(|_| invalid())?,
        frame_counter,
    };

    let mut bytes = Vec::with_capacity(HEADER_SIZE + cells.len() * RECORD_SIZE);
    bytes.extend(bincode_next::serde::encode_to_vec(&header, wire_config())?);
    for cell in cells {
        let record = CellRecord::from(cell);
        bytes.extend(bincode_next::serde::encode_to_vec(&record, wire_config())?);
    }
    Ok(bytes)
}

impl World {
    /// Encode the whole world
    pub fn save_snapshot(&self) -> Result<Vec<u8>, SnapshotError> {
        encode_cells(
            self.width(),
            self.height(),
            self.frame_counter,
            self.grid.cells(),
        )
    }

    /// Replace the world's cells and frame counter from a snapshot
    ///
    /// On any error the world is left exactly as it was.
    pub fn load_snapshot(&mut self, bytes: &[u8]) -> Result<(), SnapshotError> {
        let result = self.try_load_snapshot(bytes);
        if let Err(e) = &result {
            log::warn!("Rejected snapshot: {}", e);
        }
        result
    }

    fn try_load_snapshot(&mut self, bytes: &[u8]) -> Result<(), SnapshotError> {
        let expected = (self.width(), self.height());
        let (width, height, _) = Snapshot::read_header(bytes)?;
        if (width, height) != expected {
            return Err(SnapshotError::DimensionMismatch {
                expected,
                found: (width, height),
            });
        }

        let snapshot = Snapshot::decode(bytes)?;
        self.apply_snapshot(snapshot)
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) -> Result<(), SnapshotError> {
        let expected = (self.width(), self.height());
        let found = (snapshot.width, snapshot.height);
        if found != expected || !self.grid.replace_all(snapshot.cells) {
            return Err(SnapshotError::DimensionMismatch { expected, found });
        }
        self.frame_counter = snapshot.frame_counter;
        log::info!(
            "Loaded {}x{} snapshot at frame {}",
            found.0,
            found.1,
            self.frame_counter
        );
        Ok(())
    }

    /// Build a world sized to fit a snapshot
    pub fn from_snapshot(bytes: &[u8], seed: u64) -> Result<Self, SnapshotError> {
        let snapshot = Snapshot::decode(bytes)?;
        let mut world = World::with_seed(snapshot.width, snapshot.height, seed);
        world.apply_snapshot(snapshot)?;
        Ok(world)
    }
}

/// First `<base><N>.<ext>` in `dir` that does not exist yet, counting from 0
pub fn next_free_path(
    dir: &Path,
    base_name: &str,
    extension: &str,
) -> Result<PathBuf, SnapshotError> {
    (0..=u32::MAX)
        .map(|n| dir.join(format!("{}{}.{}", base_name, n, extension)))
        .find(|path| !path.exists())
        .ok_or_else(|| SnapshotError::NamesExhausted {
            dir: dir.to_path_buf(),
        })
}

/// Sorted snapshot files in `dir` with the given extension
pub fn list_snapshots(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, SnapshotError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Snapshot files in one directory, named `<base><N>.<ext>`
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
    base_name: String,
    extension: String,
}

impl SnapshotStore {
    pub fn new(
        dir: impl Into<PathBuf>,
        base_name: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            base_name: base_name.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the world to the first free file name and return its path
    ///
    /// Data goes to a temporary file first and is renamed into place, so a
    /// failed save never leaves a truncated snapshot behind.
    pub fn save(&self, world: &World) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create snapshot directory {}", self.dir.display())
        })?;
        let bytes = world
            .save_snapshot()
            .context("Failed to encode world snapshot")?;

        let path = next_free_path(&self.dir, &self.base_name, &self.extension)?;
        let temp_path = path.with_extension(format!("{}.tmp", self.extension));
        fs::write(&temp_path, &bytes)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to move snapshot into {}", path.display()))?;

        log::info!(
            "Saved snapshot to {} ({} bytes, frame {})",
            path.display(),
            bytes.len(),
            world.frame_counter()
        );
        Ok(path)
    }

    /// Load a snapshot file into an existing world of the same size
    pub fn load_into(&self, world: &mut World, path: &Path) -> Result<()> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        log::debug!("Read {} bytes from {}", bytes.len(), path.display());
        world
            .load_snapshot(&bytes)
            .with_context(|| format!("Failed to load {}", path.display()))
    }

    /// Decode a snapshot file without a target world
    pub fn read(&self, path: &Path) -> Result<Snapshot> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Snapshot::decode(&bytes).with_context(|| format!("Failed to decode {}", path.display()))
    }

    /// Snapshot files in the store directory, sorted by path
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        list_snapshots(&self.dir, &self.extension)
            .with_context(|| format!("Failed to list {}", self.dir.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_world() -> World {
        let mut world = World::with_seed(6, 4, 3);
        world.place(0, 0, MaterialKind::Sand);
        world.place(5, 3, MaterialKind::Lava);
        world.place(2, 1, MaterialKind::Acid);
        world
            .grid_mut()
            .modify(0, 0, |c| c.velocity = Vec2::new(-1.5, 2.25));
        world
    }

    #[test]
    fn test_encoded_size_and_header() {
        let mut world = sample_world();
        world.update(1.0 / 60.0);
        let bytes = world.save_snapshot().unwrap();

        assert_eq!(bytes.len(), HEADER_SIZE + 6 * 4 * RECORD_SIZE);
        assert_eq!(&bytes[0..4], &6i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &4i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &1u32.to_le_bytes());
    }

    #[test]
    fn test_record_layout() {
        let world = sample_world();
        let bytes = world.save_snapshot().unwrap();
        let record = &bytes[HEADER_SIZE..HEADER_SIZE + RECORD_SIZE];
        let cell = world.get_cell(0, 0).copied().unwrap();

        assert_eq!(record[0], MaterialKind::Sand.as_u8());
        assert_eq!(&record[1..5], &(-1.5f32).to_le_bytes());
        assert_eq!(&record[5..9], &2.25f32.to_le_bytes());
        assert_eq!(&record[9..13], &0.0f32.to_le_bytes());
        assert_eq!(&record[13..17], &cell.color);
    }

    #[test]
    fn test_round_trip() {
        let mut world = sample_world();
        for _ in 0..5 {
            world.update(1.0 / 60.0);
        }
        let bytes = world.save_snapshot().unwrap();

        let mut restored = World::new(6, 4);
        restored.load_snapshot(&bytes).unwrap();

        assert_eq!(restored.frame_counter(), world.frame_counter());
        assert_eq!(restored.color_buffer(), world.color_buffer());
        for (a, b) in restored.grid().cells().iter().zip(world.grid().cells()) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.velocity, b.velocity);
            assert_eq!(a.lifetime, b.lifetime);
            assert_eq!(a.color, b.color);
            assert!(!a.updated_this_tick());
        }
    }

    #[test]
    fn test_dimension_mismatch_leaves_world_untouched() {
        let bytes = sample_world().save_snapshot().unwrap();
        let mut other = World::new(4, 6);
        other.place(1, 1, MaterialKind::Stone);
        let before = other.grid().cells().to_vec();

        let err = other.load_snapshot(&bytes).unwrap_err();

        assert!(matches!(
            err,
            SnapshotError::DimensionMismatch {
                expected: (4, 6),
                found: (6, 4)
            }
        ));
        assert_eq!(other.grid().cells(), before.as_slice());
    }

    #[test]
    fn test_truncated_snapshot_is_rejected() {
        let bytes = sample_world().save_snapshot().unwrap();
        let mut world = World::new(6, 4);

        let err = world.load_snapshot(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, SnapshotError::Length { .. }));

        let err = world.load_snapshot(&bytes[..5]).unwrap_err();
        assert!(matches!(err, SnapshotError::Length { expected: HEADER_SIZE, actual: 5 }));
    }

    #[test]
    fn test_unknown_material_rejects_whole_load() {
        let mut bytes = sample_world().save_snapshot().unwrap();
        bytes[HEADER_SIZE + 3 * RECORD_SIZE] = 200;
        let mut world = World::new(6, 4);
        world.place(3, 3, MaterialKind::Wood);
        let before = world.grid().cells().to_vec();

        let err = world.load_snapshot(&bytes).unwrap_err();

        assert!(matches!(
            err,
            SnapshotError::UnknownMaterial { index: 3, value: 200 }
        ));
        assert_eq!(world.grid().cells(), before.as_slice());
    }

    #[test]
    fn test_negative_dimensions_are_invalid() {
        let mut bytes = Vec::new();
        bytes.extend((-1i32).to_le_bytes());
        bytes.extend(2i32.to_le_bytes());
        bytes.extend(0u32.to_le_bytes());

        let err = Snapshot::decode(&bytes).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidDimensions { width: -1, height: 2 }));
    }

    #[test]
    fn test_from_snapshot_sizes_world() {
        let world = sample_world();
        let bytes = world.save_snapshot().unwrap();

        let copy = World::from_snapshot(&bytes, 9).unwrap();

        assert_eq!((copy.width(), copy.height()), (6, 4));
        assert_eq!(copy.seed(), 9);
        assert_eq!(copy.kind_at(5, 3), Some(MaterialKind::Lava));
    }

    #[test]
    fn test_snapshot_color_buffer_matches_world() {
        let world = sample_world();
        let snapshot = Snapshot::capture(&world);
        assert_eq!(snapshot.color_buffer(), world.color_buffer());
        assert_eq!(Snapshot::decode(&snapshot.encode().unwrap()).unwrap(), snapshot);
    }

    #[test]
    fn test_empty_grid_snapshot() {
        let world = World::new(0, 0);
        let bytes = world.save_snapshot().unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);
        let snapshot = Snapshot::decode(&bytes).unwrap();
        assert!(snapshot.cells.is_empty());
    }
}
