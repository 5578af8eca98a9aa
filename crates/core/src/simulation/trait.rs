//! Epidemic simulation trait definition
//!
//! This module defines the `EpidemicSimulation` trait, which provides a
//! backend-agnostic interface over the parallel [`EpidemicModel`](super::EpidemicModel)
//! and the single-threaded [`SequentialModel`](super::SequentialModel). The
//! driver and the run loop only talk to this trait.

use crate::grid::EpidemicGrid;
use crate::solver::PopulationCounts;

/// Backend-agnostic interface for a day-stepped epidemic simulation
pub trait EpidemicSimulation {
    /// Advance the simulation by one day
    fn step(&mut self);

    /// Current population counts
    ///
    /// The four compartments always sum to `grid_size²`.
    fn statistics(&self) -> PopulationCounts;

    /// Cumulative attack ratio reported as "R0" for `day`
    ///
    /// Recomputes the population counts from the live grid.
    fn r0(&self, day: u32) -> f64;

    /// Defensive copy of the live grid
    fn grid(&self) -> EpidemicGrid;

    /// Side length of the grid
    fn grid_size(&self) -> usize;

    /// Worker slots used to advance the simulation
    fn worker_count(&self) -> usize;

    /// Days simulated so far
    fn day(&self) -> u32;

    /// Short name for logs and reports
    fn label(&self) -> &'static str;

    /// True once no individual is infected
    fn is_extinguished(&self) -> bool {
        self.statistics().is_extinguished()
    }
}
