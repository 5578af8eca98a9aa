//! Core types and utilities

pub mod cell_state;
pub mod rng;

pub use cell_state::CellState;
pub use rng::{RandomSource, RandomStream, StreamPool};
