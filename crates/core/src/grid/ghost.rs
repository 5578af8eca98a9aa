//! Block-local ghost-cell copies
//!
//! A [`GhostWindow`] holds a private copy of a block's ghost bounds (the block
//! plus one ring of neighbors). Reading neighbor state from the window instead
//! of the shared snapshot gives the same answers as long as only cells inside
//! the block are updated.

use super::epidemic_grid::{CellSource, EpidemicGrid};
use super::partition::Block;
use crate::core_types::CellState;

/// Read-only copy of the cells inside a ghost bound
#[derive(Debug, Clone)]
pub struct GhostWindow {
    bounds: Block,
    cells: Vec<CellState>,
    dimension: usize,
}

impl GhostWindow {
    /// Copy `bounds` out of `grid`
    #[must_use]
    pub fn capture(grid: &EpidemicGrid, bounds: Block) -> Self {
        let mut cells = Vec::with_capacity(bounds.cell_count());
        for row in grid.rows().skip(bounds.row_start).take(bounds.height()) {
            cells.extend_from_slice(&row[bounds.cols()]);
        }
        Self {
            bounds,
            cells,
            dimension: grid.size(),
        }
    }

    /// Region of the grid this window mirrors
    pub fn bounds(&self) -> Block {
        self.bounds
    }
}

impl CellSource for GhostWindow {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn state(&self, row: usize, col: usize) -> CellState {
        debug_assert!(
            self.bounds.contains(row, col),
            "({row}, {col}) outside ghost window {:?}",
            self.bounds
        );
        let local_row = row - self.bounds.row_start;
        let local_col = col - self.bounds.col_start;
        self.cells[local_row * self.bounds.width() + local_col]
    }
}
