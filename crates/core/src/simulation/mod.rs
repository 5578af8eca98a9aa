//! Epidemic simulation built on the parallel step engine
//!
//! - [`EpidemicModel`]: block-parallel model, one random stream per worker slot
//! - [`SequentialModel`]: single-threaded reference with the same rule
//! - [`EpidemicSimulation`]: interface the run loop and the driver use
//! - [`run_simulation`]: day loop with early stop on extinction
//!
//! Output files (statistics, snapshots, timings) are written by
//! [`persistence`], never by the models themselves.

pub mod config;
pub mod history;
mod model;
pub mod persistence;
pub mod runner;
mod sequential;
#[allow(clippy::module_name_repetitions)]
mod r#trait;
pub mod visualizer;

pub use config::{ConfigError, NeighborMode, SimulationConfig};
pub use history::{DayStatistics, StatisticsHistory};
pub use model::{EpidemicModel, ModelPhase};
pub use persistence::{
    save_execution_time, save_grid_snapshot, save_scaling_results, PersistenceError,
};
pub use r#trait::EpidemicSimulation;
pub use runner::{measure_scaling, run_simulation, RunSummary, ScalingResult};
pub use sequential::SequentialModel;
pub use visualizer::Visualizer;
