//! Per-cell simulation systems: movement, reactions and state changes

pub mod context;
pub mod movement;
pub mod reactions;
pub mod spawn;
pub mod state_changes;
#[cfg(test)]
pub(crate) mod test_support;

pub use context::StepContext;
pub use movement::MovementSystem;
pub use reactions::ReactionSystem;
pub use spawn::CellFactory;
pub use state_changes::StateChangeSystem;

// Re-export material types for convenience
pub use sandsim_materials::{
    Cell, MaterialDef, MaterialKind, MaterialType, Materials, cell_flags,
};
