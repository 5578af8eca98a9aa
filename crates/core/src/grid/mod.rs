//! Grid state, block decomposition and ghost regions

pub mod epidemic_grid;
pub mod ghost;
pub mod partition;

// Re-export main types
pub use epidemic_grid::{moore_neighbors, CellSource, EpidemicGrid};
pub use ghost::GhostWindow;
pub use partition::{partition, Block, BlockPartitioner};
