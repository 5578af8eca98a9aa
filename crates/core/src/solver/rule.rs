//! Stochastic per-cell transition rule
//!
//! # Rules
//!
//! - **Susceptible**: with `k` infected Moore neighbors (`k > 0`) the cell is
//!   infected with probability `1 - (1 - p_infect)^k`, i.e. `k` independent
//!   exposures. One draw is consumed; none when `k == 0`.
//! - **Infected**: two independent draws are always consumed. The first is
//!   tested against `p_death`; only if the cell survives is the second tested
//!   against `p_recover`. Death is checked first, so `p_death + p_recover > 1`
//!   caps the effective recovery rate.
//! - **Recovered / Dead**: terminal, no draw.
//!
//! A rule only writes the target cell and only reads the 3×3 neighborhood of
//! the source.

use crate::core_types::{CellState, RandomSource};
use crate::grid::CellSource;
use serde::{Deserialize, Serialize};

/// Infection, recovery and death probabilities applied once per day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionRule {
    /// Per-neighbor daily infection probability
    pub infection_prob: f64,
    /// Daily recovery probability of a surviving infected cell
    pub recovery_prob: f64,
    /// Daily death probability of an infected cell
    pub death_prob: f64,
}

impl TransitionRule {
    /// Create a rule from the three daily probabilities
    #[must_use]
    pub fn new(infection_prob: f64, recovery_prob: f64, death_prob: f64) -> Self {
        Self {
            infection_prob,
            recovery_prob,
            death_prob,
        }
    }

    /// Probability that a susceptible cell with `infected_neighbors` infected
    /// neighbors becomes infected today
    ///
    /// Clamped to `[0, 1]` so rounding can never push it past certainty.
    pub fn infection_chance(&self, infected_neighbors: u32) -> f64 {
        if infected_neighbors == 0 {
            return 0.0;
        }
        let escape = (1.0 - self.infection_prob).powi(infected_neighbors as i32);
        (1.0 - escape).clamp(0.0, 1.0)
    }

    /// Next state of `(row, col)`, or `None` when the cell keeps its state
    pub fn next_state<S, R>(
        &self,
        source: &S,
        row: usize,
        col: usize,
        rng: &mut R,
    ) -> Option<CellState>
    where
        S: CellSource + ?Sized,
        R: RandomSource + ?Sized,
    {
        match source.state(row, col) {
            CellState::Susceptible => {
                let infected = source.infected_neighbors(row, col);
                if infected == 0 {
                    return None;
                }
                let chance = self.infection_chance(infected);
                (rng.next_unit() < chance).then_some(CellState::Infected)
            }
            CellState::Infected => {
                let death_draw = rng.next_unit();
                let recovery_draw = rng.next_unit();
                if death_draw < self.death_prob {
                    Some(CellState::Dead)
                } else if recovery_draw < self.recovery_prob {
                    Some(CellState::Recovered)
                } else {
                    None
                }
            }
            CellState::Recovered | CellState::Dead => None,
        }
    }

    /// Apply the rule to `(row, col)`, writing into `target` only on a transition
    ///
    /// `target` is the cell's slot in the next-day buffer, which starts as a
    /// copy of the previous day.
    #[inline]
    pub fn apply<S, R>(
        &self,
        source: &S,
        row: usize,
        col: usize,
        target: &mut CellState,
        rng: &mut R,
    ) where
        S: CellSource + ?Sized,
        R: RandomSource + ?Sized,
    {
        if let Some(next) = self.next_state(source, row, col, rng) {
            *target = next;
        }
    }
}
