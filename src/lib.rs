pub mod constants;
pub mod engine;
pub mod levels;
pub mod maze;
pub mod pathfinding;
pub mod persistence;
pub mod rng;
pub mod store;
pub mod types;
