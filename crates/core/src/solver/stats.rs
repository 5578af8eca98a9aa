//! Population counting and the R0 proxy
//!
//! Counting splits the grid by rows across the worker pool. Each worker folds
//! its rows into a private [`PopulationCounts`] and the partial counts are
//! summed exactly once per worker, so there are no shared counters to race on.

use crate::core_types::CellState;
use crate::grid::EpidemicGrid;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Number of individuals in each compartment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopulationCounts {
    /// Susceptible individuals
    pub susceptible: usize,
    /// Currently infected individuals
    pub infected: usize,
    /// Recovered individuals
    pub recovered: usize,
    /// Dead individuals
    pub dead: usize,
}

impl PopulationCounts {
    /// Count one individual in `state`
    #[inline]
    pub fn record(&mut self, state: CellState) {
        match state {
            CellState::Susceptible => self.susceptible += 1,
            CellState::Infected => self.infected += 1,
            CellState::Recovered => self.recovered += 1,
            CellState::Dead => self.dead += 1,
        }
    }

    /// Sum of all compartments
    pub fn total(&self) -> usize {
        self.susceptible + self.infected + self.recovered + self.dead
    }

    /// Individuals that have ever been infected
    pub fn ever_infected(&self) -> usize {
        self.infected + self.recovered + self.dead
    }

    /// True once nobody is infected
    pub fn is_extinguished(&self) -> bool {
        self.infected == 0
    }
}

impl Add for PopulationCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            susceptible: self.susceptible + rhs.susceptible,
            infected: self.infected + rhs.infected,
            recovered: self.recovered + rhs.recovered,
            dead: self.dead + rhs.dead,
        }
    }
}

impl AddAssign for PopulationCounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Parallel reduction over the grid
pub struct StatsReducer;

impl StatsReducer {
    /// Count cells by state using the current rayon pool
    pub fn count(grid: &EpidemicGrid) -> PopulationCounts {
        if grid.cell_count() == 0 {
            return PopulationCounts::default();
        }
        grid.as_slice()
            .par_chunks(grid.size())
            .fold(PopulationCounts::default, |mut acc, row| {
                for &state in row {
                    acc.record(state);
                }
                acc
            })
            .reduce(PopulationCounts::default, Add::add)
    }

    /// Single-threaded count, used by the sequential model
    pub fn count_sequential(grid: &EpidemicGrid) -> PopulationCounts {
        let mut counts = PopulationCounts::default();
        for &state in grid.as_slice() {
            counts.record(state);
        }
        counts
    }

    /// "R0" reported per day
    ///
    /// This is the cumulative attack ratio `(I + R + D) / initial_infected`,
    /// not the epidemiological basic reproduction number. The name is kept
    /// for compatibility with the statistics output. Returns 0 on day 0 or
    /// when nobody was initially infected.
    pub fn r0(counts: &PopulationCounts, initial_infected: usize, day: u32) -> f64 {
        if day == 0 || initial_infected == 0 {
            return 0.0;
        }
        counts.ever_infected() as f64 / initial_infected as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mixed_grid() -> EpidemicGrid {
        let mut grid = EpidemicGrid::new(20);
        for row in 0..20 {
            for col in 0..20 {
                let state = CellState::ALL[(row * 7 + col * 3) % 4];
                grid.set(row, col, state);
            }
        }
        grid
    }

    #[test]
    fn test_parallel_count_matches_sequential() {
        let grid = mixed_grid();
        let parallel = StatsReducer::count(&grid);
        let sequential = StatsReducer::count_sequential(&grid);
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.total(), 400);
    }

    #[test]
    fn test_count_matches_per_state_scan() {
        let grid = mixed_grid();
        let counts = StatsReducer::count(&grid);
        assert_eq!(counts.susceptible, grid.count(CellState::Susceptible));
        assert_eq!(counts.infected, grid.count(CellState::Infected));
        assert_eq!(counts.recovered, grid.count(CellState::Recovered));
        assert_eq!(counts.dead, grid.count(CellState::Dead));
    }

    #[test]
    fn test_count_in_dedicated_pool_is_stable() {
        let grid = mixed_grid();
        let expected = StatsReducer::count_sequential(&grid);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap();
        for _ in 0..20 {
            assert_eq!(pool.install(|| StatsReducer::count(&grid)), expected);
        }
    }

    #[test]
    fn test_r0_edge_cases() {
        let counts = PopulationCounts {
            susceptible: 80,
            infected: 10,
            recovered: 6,
            dead: 4,
        };
        assert_eq!(StatsReducer::r0(&counts, 5, 0), 0.0);
        assert_eq!(StatsReducer::r0(&counts, 0, 3), 0.0);
        assert_relative_eq!(StatsReducer::r0(&counts, 5, 1), 4.0);
    }

    #[test]
    fn test_add_counts() {
        let mut a = PopulationCounts {
            susceptible: 1,
            infected: 2,
            recovered: 3,
            dead: 4,
        };
        a += a;
        assert_eq!(a.total(), 20);
        assert_eq!(a.ever_infected(), 18);
        assert!(!a.is_extinguished());
    }
}
