//! Epidemiological status of a single individual on the grid

use serde::{Deserialize, Serialize};

/// Compartment an individual currently belongs to
///
/// The discriminants are the integer codes used by grid snapshots
/// (0 = Susceptible, 1 = Infected, 2 = Recovered, 3 = Dead).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CellState {
    /// Healthy and can be infected by an infected neighbor
    #[default]
    Susceptible = 0,
    /// Currently infectious
    Infected = 1,
    /// Recovered with immunity (terminal)
    Recovered = 2,
    /// Died from the infection (terminal)
    Dead = 3,
}

impl CellState {
    /// All states in code order
    pub const ALL: [CellState; 4] = [
        CellState::Susceptible,
        CellState::Infected,
        CellState::Recovered,
        CellState::Dead,
    ];

    /// Integer code written to grid snapshots
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse a snapshot code back into a state
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(CellState::Susceptible),
            1 => Some(CellState::Infected),
            2 => Some(CellState::Recovered),
            3 => Some(CellState::Dead),
            _ => None,
        }
    }

    /// Recovered and Dead never change again
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, CellState::Recovered | CellState::Dead)
    }

    /// Character used by the text grid sample
    pub fn symbol(self) -> char {
        match self {
            CellState::Susceptible => '.',
            CellState::Infected => 'I',
            CellState::Recovered => 'R',
            CellState::Dead => 'X',
        }
    }
}
