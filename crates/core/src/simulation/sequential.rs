//! Single-threaded reference model
//!
//! Applies the same [`TransitionRule`] as the parallel engine with one random
//! stream and a plain row-major scan. It is the baseline of the performance
//! comparison and a statistical oracle for the parallel model. Individual
//! trajectories differ from the parallel model because the draw order differs.

use super::config::{ConfigError, SimulationConfig};
use super::model::{phase_of, seeded_grid, ModelPhase};
use super::r#trait::EpidemicSimulation;
use crate::core_types::{CellState, RandomStream};
use crate::grid::EpidemicGrid;
use crate::solver::{PopulationCounts, ProfilerScope, StatsReducer, StepTimer, TransitionRule};
use tracing::{debug, info};

/// Epidemic model advanced on the calling thread
pub struct SequentialModel {
    config: SimulationConfig,
    grid: EpidemicGrid,
    rule: TransitionRule,
    stream: RandomStream,
    initial_infected: usize,
    counts: PopulationCounts,
    phase: ModelPhase,
    day: u32,
    timer: StepTimer,
}

impl SequentialModel {
    /// Create a model with `initial_infected` cells chosen uniformly at random
    ///
    /// One stream seeded with the base seed places the initial infections and
    /// then drives every transition. The configured worker count is ignored.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let size = config.grid_size;
        let mut grid = EpidemicGrid::new(size);
        let mut stream = RandomStream::from_seed(config.seed);
        for index in
            rand::seq::index::sample(stream.rng_mut(), grid.cell_count(), config.initial_infected)
        {
            grid.set(index / size, index % size, CellState::Infected);
        }

        Ok(Self::from_parts(config, grid, stream))
    }

    /// Create a model with infections at explicit `(row, col)` positions
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InitialInfectedOutOfBounds`] for a position
    /// outside the grid, or any other configuration error
    pub fn with_initial_infected(
        config: SimulationConfig,
        positions: &[(usize, usize)],
    ) -> Result<Self, ConfigError> {
        let (config, grid) = seeded_grid(config, positions)?;
        let stream = RandomStream::from_seed(config.seed);
        Ok(Self::from_parts(config, grid, stream))
    }

    fn from_parts(config: SimulationConfig, grid: EpidemicGrid, stream: RandomStream) -> Self {
        let counts = StatsReducer::count_sequential(&grid);
        info!(
            "Sequential model initialized: {}x{} grid, seed={}, infected={}",
            config.grid_size, config.grid_size, config.seed, counts.infected
        );

        Self {
            grid,
            rule: TransitionRule::new(
                config.infection_prob,
                config.recovery_prob,
                config.death_prob,
            ),
            stream,
            initial_infected: config.initial_infected,
            config,
            phase: phase_of(&counts),
            counts,
            day: 0,
            timer: StepTimer::new(),
        }
    }

    /// Advance the grid by one day
    pub fn step(&mut self) {
        self.day += 1;
        if self.phase == ModelPhase::Extinguished {
            return;
        }

        let scope = ProfilerScope::new("sequential_step");
        let size = self.grid.size();
        let mut next = self.grid.clone();
        for (index, cell) in next.as_mut_slice().iter_mut().enumerate() {
            self.rule
                .apply(&self.grid, index / size, index % size, cell, &mut self.stream);
        }
        self.grid = next;
        self.counts = StatsReducer::count_sequential(&self.grid);
        self.phase = phase_of(&self.counts);
        self.timer.record(scope.elapsed_ms());

        debug!(
            "Day {} (sequential): S={} I={} R={} D={}",
            self.day,
            self.counts.susceptible,
            self.counts.infected,
            self.counts.recovered,
            self.counts.dead
        );
    }

    /// Counts as of the last step
    pub fn statistics(&self) -> PopulationCounts {
        self.counts
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> ModelPhase {
        self.phase
    }

    /// Timing over all computed steps
    pub fn timer(&self) -> &StepTimer {
        &self.timer
    }

    /// Configuration the model was built from
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

impl EpidemicSimulation for SequentialModel {
    fn step(&mut self) {
        SequentialModel::step(self);
    }

    fn statistics(&self) -> PopulationCounts {
        self.counts
    }

    fn r0(&self, day: u32) -> f64 {
        let counts = StatsReducer::count_sequential(&self.grid);
        StatsReducer::r0(&counts, self.initial_infected, day)
    }

    fn grid(&self) -> EpidemicGrid {
        self.grid.clone()
    }

    fn grid_size(&self) -> usize {
        self.grid.size()
    }

    fn worker_count(&self) -> usize {
        1
    }

    fn day(&self) -> u32 {
        self.day
    }

    fn label(&self) -> &'static str {
        "sequential"
    }

    fn is_extinguished(&self) -> bool {
        self.phase == ModelPhase::Extinguished
    }
}
