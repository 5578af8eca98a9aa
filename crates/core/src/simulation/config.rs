//! Simulation parameters
//!
//! Defaults reproduce the reference experiment: a 1000×1000 population,
//! 365 days, `p_infect = 0.3`, `p_recover = 0.1`, `p_death = 0.01`,
//! 10 initial infections and seed 42.

use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

/// Default grid side length
pub const DEFAULT_GRID_SIZE: usize = 1000;
/// Default number of simulated days
pub const DEFAULT_DAYS: u32 = 365;
/// Default per-neighbor infection probability
pub const DEFAULT_INFECTION_PROB: f64 = 0.3;
/// Default daily recovery probability
pub const DEFAULT_RECOVERY_PROB: f64 = 0.1;
/// Default daily death probability
pub const DEFAULT_DEATH_PROB: f64 = 0.01;
/// Default number of initially infected individuals
pub const DEFAULT_INITIAL_INFECTED: usize = 10;
/// Default base random seed
pub const DEFAULT_SEED: u64 = 42;

/// Where the transition rule reads neighbor state from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborMode {
    /// Read the shared previous-day grid directly
    #[default]
    SharedSnapshot,
    /// Copy each block's ghost bounds into a private window first
    GhostCopy,
}

/// Number of hardware threads, at least one
pub fn available_workers() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Full parameter set of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Side length of the square population grid
    pub grid_size: usize,
    /// Number of days the driver simulates
    pub days: u32,
    /// Per-neighbor daily infection probability
    pub infection_prob: f64,
    /// Daily recovery probability
    pub recovery_prob: f64,
    /// Daily death probability
    pub death_prob: f64,
    /// Individuals infected at day 0
    pub initial_infected: usize,
    /// Logical worker slots (one random stream each)
    pub worker_count: usize,
    /// Base random seed
    pub seed: u64,
    /// Neighbor read strategy of the parallel engine
    pub neighbor_mode: NeighborMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            days: DEFAULT_DAYS,
            infection_prob: DEFAULT_INFECTION_PROB,
            recovery_prob: DEFAULT_RECOVERY_PROB,
            death_prob: DEFAULT_DEATH_PROB,
            initial_infected: DEFAULT_INITIAL_INFECTED,
            worker_count: available_workers(),
            seed: DEFAULT_SEED,
            neighbor_mode: NeighborMode::default(),
        }
    }
}

impl SimulationConfig {
    /// Set the grid side length
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Set the number of days
    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    /// Set infection, recovery and death probabilities
    pub fn with_probabilities(mut self, infection: f64, recovery: f64, death: f64) -> Self {
        self.infection_prob = infection;
        self.recovery_prob = recovery;
        self.death_prob = death;
        self
    }

    /// Set the number of initially infected individuals
    pub fn with_initial_infected(mut self, initial_infected: usize) -> Self {
        self.initial_infected = initial_infected;
        self
    }

    /// Set the number of worker slots
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the base seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the neighbor read strategy
    pub fn with_neighbor_mode(mut self, neighbor_mode: NeighborMode) -> Self {
        self.neighbor_mode = neighbor_mode;
        self
    }

    /// Number of individuals on the grid, saturating on overflow
    pub fn capacity(&self) -> usize {
        self.grid_size.saturating_mul(self.grid_size)
    }

    /// Check every parameter before any simulation work starts
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::InvalidGridSize(self.grid_size));
        }
        for (name, value) in [
            ("infection_prob", self.infection_prob),
            ("recovery_prob", self.recovery_prob),
            ("death_prob", self.death_prob),
        ] {
            // NaN fails the range check too
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }
        if self.initial_infected > self.capacity() {
            return Err(ConfigError::TooManyInitialInfected {
                requested: self.initial_infected,
                capacity: self.capacity(),
            });
        }
        if self.worker_count == 0 {
            return Err(ConfigError::InvalidWorkerCount);
        }
        Ok(())
    }

    /// Load a configuration from a JSON file
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        let config: Self =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;

        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns error if the configuration cannot be serialized or written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeFailed(e.to_string()))?;

        fs::write(path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        Ok(())
    }
}

/// Errors raised while building or loading a simulation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Grid side length must be positive
    InvalidGridSize(usize),
    /// Probability outside `[0, 1]`
    InvalidProbability {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
    },
    /// More initial infections than individuals
    TooManyInitialInfected {
        /// Requested initial infections
        requested: usize,
        /// Grid capacity
        capacity: usize,
    },
    /// Initial infection placed outside the grid
    InitialInfectedOutOfBounds {
        /// Requested row
        row: usize,
        /// Requested column
        col: usize,
        /// Grid side length
        grid_size: usize,
    },
    /// At least one worker is required
    InvalidWorkerCount,
    /// Worker pool could not be created
    ThreadPool(String),
    /// Failed to read a configuration file
    LoadFailed(String),
    /// Failed to parse a configuration file
    ParseFailed(String),
    /// Failed to serialize a configuration
    SerializeFailed(String),
    /// Failed to write a configuration file
    SaveFailed(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidGridSize(size) => {
                write!(f, "Grid size must be positive, got {size}")
            }
            ConfigError::InvalidProbability { name, value } => {
                write!(f, "Probability {name} must be within [0, 1], got {value}")
            }
            ConfigError::TooManyInitialInfected {
                requested,
                capacity,
            } => write!(
                f,
                "Cannot infect {requested} individuals on a grid of {capacity}"
            ),
            ConfigError::InitialInfectedOutOfBounds {
                row,
                col,
                grid_size,
            } => write!(
                f,
                "Initial infection at ({row}, {col}) is outside a {grid_size}x{grid_size} grid"
            ),
            ConfigError::InvalidWorkerCount => write!(f, "Worker count must be at least 1"),
            ConfigError::ThreadPool(msg) => write!(f, "Failed to build worker pool: {msg}"),
            ConfigError::LoadFailed(msg) => write!(f, "Failed to load: {msg}"),
            ConfigError::ParseFailed(msg) => write!(f, "Failed to parse: {msg}"),
            ConfigError::SerializeFailed(msg) => write!(f, "Failed to serialize: {msg}"),
            ConfigError::SaveFailed(msg) => write!(f, "Failed to save: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
