//! Parallel epidemic model
//!
//! `EpidemicModel` owns the live grid, one random stream per busy worker slot and
//! the [`ParallelStepEngine`] that advances the grid one day at a time.

use super::config::{ConfigError, SimulationConfig};
use super::r#trait::EpidemicSimulation;
use crate::core_types::{CellState, RandomStream, StreamPool};
use crate::grid::EpidemicGrid;
use crate::solver::{
    ParallelStepEngine, PopulationCounts, ProfilerScope, StatsReducer, StepTimer, TransitionRule,
};
use rustc_hash::FxHashSet;
use tracing::{debug, info};

/// Lifecycle of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelPhase {
    /// At least one individual is infected
    Running,
    /// No infected individuals remain; further steps change nothing
    Extinguished,
}

/// Epidemic model advanced by the block-parallel engine
pub struct EpidemicModel {
    config: SimulationConfig,
    grid: EpidemicGrid,
    streams: StreamPool,
    engine: ParallelStepEngine,
    initial_infected: usize,
    counts: PopulationCounts,
    phase: ModelPhase,
    day: u32,
    timer: StepTimer,
}

impl EpidemicModel {
    /// Create a model with `initial_infected` cells chosen uniformly at random
    ///
    /// The positions are sampled without replacement from a seeding stream
    /// created from the base seed, separate from the worker streams.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the worker pool
    /// cannot be created
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let size = config.grid_size;
        let mut grid = EpidemicGrid::new(size);
        let mut seeding = RandomStream::from_seed(config.seed);
        for index in rand::seq::index::sample(
            seeding.rng_mut(),
            grid.cell_count(),
            config.initial_infected,
        ) {
            grid.set(index / size, index % size, CellState::Infected);
        }

        Self::from_grid(config, grid)
    }

    /// Create a model with infections at explicit `(row, col)` positions
    ///
    /// Duplicate positions are infected once. The configured
    /// `initial_infected` is replaced by the number of distinct positions.
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
        Self::from_grid(config, grid)
    }

    fn from_grid(config: SimulationConfig, grid: EpidemicGrid) -> Result<Self, ConfigError> {
        let rule = TransitionRule::new(
            config.infection_prob,
            config.recovery_prob,
            config.death_prob,
        );
        let engine = ParallelStepEngine::new(
            config.grid_size,
            config.worker_count,
            rule,
            config.neighbor_mode,
        )?;
        let streams = engine.stream_pool(config.seed);
        let counts = engine.count(&grid);

        info!(
            "Model initialized: {}x{} grid, {} workers on {} threads, seed={}, infected={}",
            config.grid_size,
            config.grid_size,
            engine.worker_count(),
            engine.pool_threads(),
            config.seed,
            counts.infected
        );

        Ok(Self {
            initial_infected: config.initial_infected,
            phase: phase_of(&counts),
            config,
            grid,
            streams,
            engine,
            counts,
            day: 0,
            timer: StepTimer::new(),
        })
    }

    /// Advance the grid by one day
    ///
    /// Once extinguished the grid no longer changes, only the day counter
    /// advances.
    pub fn step(&mut self) {
        self.day += 1;
        if self.phase == ModelPhase::Extinguished {
            debug!(day = self.day, "epidemic extinguished, grid unchanged");
            return;
        }

        let scope = ProfilerScope::new("parallel_step");
        let next = self.engine.step(&self.grid, &mut self.streams);
        self.grid = next;
        self.counts = self.engine.count(&self.grid);
        self.phase = phase_of(&self.counts);
        self.timer.record(scope.elapsed_ms());

        debug!(
            "Day {}: S={} I={} R={} D={} ({:.2}ms)",
            self.day,
            self.counts.susceptible,
            self.counts.infected,
            self.counts.recovered,
            self.counts.dead,
            self.timer.last_step_ms()
        );
    }

    /// Counts as of the last step
    pub fn statistics(&self) -> PopulationCounts {
        self.counts
    }

    /// Cumulative attack ratio for `day`, from a fresh count of the grid
    pub fn r0(&self, day: u32) -> f64 {
        let counts = self.engine.count(&self.grid);
        StatsReducer::r0(&counts, self.initial_infected, day)
    }

    /// Copy of the live grid
    pub fn grid(&self) -> EpidemicGrid {
        self.grid.clone()
    }

    /// Grid side length
    pub fn dimension(&self) -> usize {
        self.grid.size()
    }

    /// Logical worker slots
    pub fn worker_count(&self) -> usize {
        self.engine.worker_count()
    }

    /// Number of initially infected individuals
    pub fn initial_infected(&self) -> usize {
        self.initial_infected
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> ModelPhase {
        self.phase
    }

    /// True once no individual is infected
    pub fn is_extinguished(&self) -> bool {
        self.phase == ModelPhase::Extinguished
    }

    /// Days simulated so far
    pub fn day(&self) -> u32 {
        self.day
    }

    /// Wall time of the last computed step in milliseconds
    pub fn last_step_ms(&self) -> f64 {
        self.timer.last_step_ms()
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

impl EpidemicSimulation for EpidemicModel {
    fn step(&mut self) {
        EpidemicModel::step(self);
    }

    fn statistics(&self) -> PopulationCounts {
        EpidemicModel::statistics(self)
    }

    fn r0(&self, day: u32) -> f64 {
        EpidemicModel::r0(self, day)
    }

    fn grid(&self) -> EpidemicGrid {
        EpidemicModel::grid(self)
    }

    fn grid_size(&self) -> usize {
        self.dimension()
    }

    fn worker_count(&self) -> usize {
        EpidemicModel::worker_count(self)
    }

    fn day(&self) -> u32 {
        self.day
    }

    fn label(&self) -> &'static str {
        "parallel"
    }

    fn is_extinguished(&self) -> bool {
        EpidemicModel::is_extinguished(self)
    }
}

pub(super) fn phase_of(counts: &PopulationCounts) -> ModelPhase {
    if counts.is_extinguished() {
        ModelPhase::Extinguished
    } else {
        ModelPhase::Running
    }
}

/// Validate `config` against explicit positions and build the seeded grid
pub(super) fn seeded_grid(
    mut config: SimulationConfig,
    positions: &[(usize, usize)],
) -> Result<(SimulationConfig, EpidemicGrid), ConfigError> {
    let size = config.grid_size;
    if let Some(&(row, col)) = positions.iter().find(|&&(r, c)| r >= size || c >= size) {
        if size == 0 {
            return Err(ConfigError::InvalidGridSize(size));
        }
        return Err(ConfigError::InitialInfectedOutOfBounds {
            row,
            col,
            grid_size: size,
        });
    }

    let distinct: FxHashSet<(usize, usize)> = positions.iter().copied().collect();
    config.initial_infected = distinct.len();
    config.validate()?;

    let mut grid = EpidemicGrid::new(size);
    for &(row, col) in &distinct {
        grid.set(row, col, CellState::Infected);
    }
    Ok((config, grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config(grid_size: usize, workers: usize) -> SimulationConfig {
        SimulationConfig::default()
            .with_grid_size(grid_size)
            .with_worker_count(workers)
    }

    #[test]
    fn test_new_seeds_exact_count() {
        let model = EpidemicModel::new(config(50, 4).with_initial_infected(25)).unwrap();
        let stats = model.statistics();
        assert_eq!(stats.infected, 25);
        assert_eq!(stats.susceptible, 2500 - 25);
        assert_eq!(model.initial_infected(), 25);
        assert_eq!(model.phase(), ModelPhase::Running);
    }

    #[test]
    fn test_seeding_fills_whole_grid() {
        let model = EpidemicModel::new(config(4, 2).with_initial_infected(16)).unwrap();
        assert_eq!(model.statistics().infected, 16);
    }

    #[test]
    fn test_seeding_independent_of_worker_count() {
        let a = EpidemicModel::new(config(40, 1)).unwrap();
        let b = EpidemicModel::new(config(40, 7)).unwrap();
        assert_eq!(a.grid(), b.grid());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = config(10, 2).with_probabilities(1.5, 0.1, 0.01);
        assert!(matches!(
            EpidemicModel::new(bad),
            Err(ConfigError::InvalidProbability {
                name: "infection_prob",
                ..
            })
        ));

        let too_many = config(3, 1).with_initial_infected(10);
        assert!(matches!(
            EpidemicModel::new(too_many),
            Err(ConfigError::TooManyInitialInfected {
                requested: 10,
                capacity: 9
            })
        ));

        assert!(matches!(
            EpidemicModel::new(config(10, 0)),
            Err(ConfigError::InvalidWorkerCount)
        ));
    }

    #[test]
    fn test_explicit_positions_deduplicated_and_checked() {
        let model =
            EpidemicModel::with_initial_infected(config(5, 1), &[(1, 1), (1, 1), (4, 0)]).unwrap();
        assert_eq!(model.initial_infected(), 2);
        assert_eq!(model.grid().get(4, 0), CellState::Infected);

        let err = EpidemicModel::with_initial_infected(config(5, 1), &[(5, 0)]).err();
        assert_eq!(
            err,
            Some(ConfigError::InitialInfectedOutOfBounds {
                row: 5,
                col: 0,
                grid_size: 5
            })
        );
    }

    #[test]
    fn test_no_infected_starts_extinguished() {
        let mut model = EpidemicModel::new(config(10, 2).with_initial_infected(0)).unwrap();
        assert!(model.is_extinguished());
        let before = model.grid();
        model.step();
        assert_eq!(model.grid(), before);
        assert_eq!(model.day(), 1);
        assert_relative_eq!(model.r0(1), 0.0);
    }

    #[test]
    fn test_grid_is_a_copy() {
        let model = EpidemicModel::with_initial_infected(config(3, 1), &[(0, 0)]).unwrap();
        let mut copy = model.grid();
        copy.set(0, 0, CellState::Dead);
        assert_eq!(model.grid().get(0, 0), CellState::Infected);
    }

    #[test]
    fn test_r0_matches_attack_ratio() {
        let cfg = config(5, 1).with_probabilities(1.0, 0.0, 0.0);
        let mut model = EpidemicModel::with_initial_infected(cfg, &[(2, 2)]).unwrap();
        assert_relative_eq!(model.r0(0), 0.0);
        model.step();
        assert_relative_eq!(model.r0(1), 9.0);
        assert!(model.last_step_ms() >= 0.0);
        assert_eq!(model.timer().steps(), 1);
    }
}
