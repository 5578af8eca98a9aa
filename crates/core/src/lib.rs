//! Epidemic Simulation Core Library
//!
//! A stochastic SIR-D cellular automaton on a square grid of individuals.
//! Each day every cell moves between Susceptible, Infected, Recovered and
//! Dead according to its Moore neighborhood and three probabilities.
//!
//! ## Parallel Engine
//!
//! - Block decomposition of the grid into near-square tiles
//! - Double-buffered day step with disjoint per-block write regions
//! - One reproducible random stream per worker slot
//! - Parallel reduction of population counts

// Core types and utilities
pub mod core_types;

// Grid storage and decomposition
pub mod grid;

// Day-step solver
pub mod solver;

// Models, run loop and output
pub mod simulation;

// Re-export core types
pub use core_types::{CellState, RandomStream, StreamPool};

// Re-export grid types
pub use grid::{Block, BlockPartitioner, EpidemicGrid};

// Re-export solver types
pub use solver::{ParallelStepEngine, PopulationCounts, StatsReducer, TransitionRule};

// Re-export simulation types
pub use simulation::{
    ConfigError, EpidemicModel, EpidemicSimulation, ModelPhase, NeighborMode, SequentialModel,
    SimulationConfig, StatisticsHistory,
};
