//! Falling-sand cellular automaton
//!
//! A [`World`](world::World) owns a fixed grid of material cells and advances
//! it one tick per [`World::update`](world::World::update) call.

pub mod simulation;
pub mod world;

pub use world::World;
