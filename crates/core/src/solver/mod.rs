//! Day-step solver
//!
//! - [`TransitionRule`]: stochastic per-cell infection, recovery and death
//! - [`ParallelStepEngine`]: one day over the block-decomposed grid on a
//!   dedicated Rayon pool
//! - [`StatsReducer`]: parallel population counts and the R0 proxy
//! - [`profiler`]: step timing

pub mod parallel;
pub mod profiler;
pub mod rule;
pub mod stats;

pub use parallel::ParallelStepEngine;
pub use profiler::{ProfilerScope, StepTimer};
pub use rule::TransitionRule;
pub use stats::{PopulationCounts, StatsReducer};
