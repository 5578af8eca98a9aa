//! Square population grid
//!
//! Stores one [`CellState`] per individual in row-major order
//! (`row * size + col`). The grid has no wraparound: border cells simply
//! have fewer neighbors.

use crate::core_types::CellState;

/// Read-only access to cell states, used by the transition rule
///
/// Implemented by [`EpidemicGrid`] (the shared previous-day snapshot) and by
/// [`GhostWindow`](super::GhostWindow) (a block-local copy of the same data).
pub trait CellSource {
    /// Side length of the full grid
    fn dimension(&self) -> usize;

    /// State at `(row, col)`
    fn state(&self, row: usize, col: usize) -> CellState;

    /// Number of infected cells in the Moore neighborhood of `(row, col)`
    ///
    /// Out-of-grid positions are clipped, never wrapped.
    fn infected_neighbors(&self, row: usize, col: usize) -> u32 {
        moore_neighbors(row, col, self.dimension())
            .filter(|&(r, c)| self.state(r, c) == CellState::Infected)
            .count() as u32
    }
}

/// In-bounds Moore neighbors of `(row, col)` on a `size × size` grid
///
/// Yields at most 8 positions, 3 at a corner and none on a 1×1 grid.
pub fn moore_neighbors(
    row: usize,
    col: usize,
    size: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let last = size.saturating_sub(1);
    let rows = row.saturating_sub(1)..=(row + 1).min(last);
    let cols = col.saturating_sub(1)..=(col + 1).min(last);
    rows.flat_map(move |r| cols.clone().map(move |c| (r, c)))
        .filter(move |&(r, c)| size > 0 && (r, c) != (row, col))
}

/// Population grid of `size × size` individuals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpidemicGrid {
    cells: Vec<CellState>,
    size: usize,
}

impl EpidemicGrid {
    /// Create a grid with every individual susceptible
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![CellState::Susceptible; size * size],
            size,
        }
    }

    /// Side length
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells (`size²`)
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Flat index of `(row, col)`
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.size + col
    }

    /// State at `(row, col)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> CellState {
        assert!(
            row < self.size && col < self.size,
            "Coordinates out of bounds"
        );
        self.cells[self.index(row, col)]
    }

    /// Overwrite the state at `(row, col)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, row: usize, col: usize, state: CellState) {
        assert!(
            row < self.size && col < self.size,
            "Coordinates out of bounds"
        );
        let idx = self.index(row, col);
        self.cells[idx] = state;
    }

    /// Cells in row-major order
    pub fn as_slice(&self) -> &[CellState] {
        &self.cells
    }

    /// Mutable cells in row-major order
    pub fn as_mut_slice(&mut self) -> &mut [CellState] {
        &mut self.cells
    }

    /// Iterate rows as slices
    pub fn rows(&self) -> impl Iterator<Item = &[CellState]> {
        // chunks_exact(0) panics, an empty grid has no rows
        self.cells.chunks_exact(self.size.max(1))
    }

    /// Number of cells currently in `state`
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&c| c == state).count()
    }
}

impl CellSource for EpidemicGrid {
    #[inline]
    fn dimension(&self) -> usize {
        self.size
    }

    #[inline]
    fn state(&self, row: usize, col: usize) -> CellState {
        self.cells[row * self.size + col]
    }
}
