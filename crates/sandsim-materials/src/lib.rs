//! Material data for the sandsim falling-sand engine
//!
//! This crate provides the foundational data types for the simulation:
//! - Material kinds and their constants table (MaterialKind, MaterialDef, Materials)
//! - Behavior families (MaterialType)
//! - The per-cell value type (Cell, cell_flags)

mod cell;
mod materials;

pub use cell::{Cell, cell_flags};
pub use materials::{
    InvalidMaterialByte, MaterialDef, MaterialKind, MaterialType, Materials, UnknownMaterialName,
};
