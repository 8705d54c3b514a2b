//! Headless front end for the sandsim engine
//!
//! - `config`: layered settings (defaults, `sandsim.ron`, `SANDSIM_*` env vars)
//! - `scenes`: demo worlds painted with brush strokes
//! - `render`: PNG thumbnails of snapshots

pub mod config;
pub mod render;
pub mod scenes;

pub use config::SimConfig;
pub use scenes::Scene;
