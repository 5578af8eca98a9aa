//! Block decomposition of the grid for parallel processing
//!
//! The grid is tiled into `blocks_per_dim × blocks_per_dim` rectangular blocks
//! where `blocks_per_dim = ceil(sqrt(worker_count))` and every block is at most
//! `ceil(grid_size / blocks_per_dim)` cells on a side. Blocks on the far edges
//! are clipped to the grid and can be empty when the worker count overshoots
//! the number of cells.
//!
//! The tiling is a pure function of `(grid_size, worker_count)`.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Half-open rectangle `[row_start, row_end) × [col_start, col_end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    /// First row (inclusive)
    pub row_start: usize,
    /// Last row (exclusive)
    pub row_end: usize,
    /// First column (inclusive)
    pub col_start: usize,
    /// Last column (exclusive)
    pub col_end: usize,
}

impl Block {
    /// Row range covered by the block
    pub fn rows(&self) -> Range<usize> {
        self.row_start..self.row_end
    }

    /// Column range covered by the block
    pub fn cols(&self) -> Range<usize> {
        self.col_start..self.col_end
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.row_end - self.row_start
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.col_end - self.col_start
    }

    /// Number of cells covered
    pub fn cell_count(&self) -> usize {
        self.height() * self.width()
    }

    /// True when the block covers no cells
    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// True when `(row, col)` lies inside the block
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.rows().contains(&row) && self.cols().contains(&col)
    }
}

/// Smallest `b` with `b * b >= n`
fn ceil_sqrt(n: usize) -> usize {
    let mut b = (n as f64).sqrt() as usize;
    while b.checked_mul(b).is_some_and(|sq| sq < n) {
        b += 1;
    }
    while b > 1 && (b - 1) * (b - 1) >= n {
        b -= 1;
    }
    b.max(1)
}

/// Near-square tiling of a `grid_size × grid_size` grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPartitioner {
    grid_size: usize,
    worker_count: usize,
    blocks_per_dim: usize,
    block_size: usize,
}

impl BlockPartitioner {
    /// Compute the tiling geometry
    ///
    /// A worker count of zero is treated as one.
    #[must_use]
    pub fn new(grid_size: usize, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let blocks_per_dim = ceil_sqrt(worker_count);
        let block_size = grid_size.div_ceil(blocks_per_dim);
        Self {
            grid_size,
            worker_count,
            blocks_per_dim,
            block_size,
        }
    }

    /// Side length of the partitioned grid
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Worker count the tiling was computed for
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Blocks along each axis
    pub fn blocks_per_dim(&self) -> usize {
        self.blocks_per_dim
    }

    /// Nominal block side length (edge blocks may be smaller)
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Total number of blocks, including empty ones
    pub fn block_count(&self) -> usize {
        self.blocks_per_dim * self.blocks_per_dim
    }

    /// Bounds of block `id` in row-major block order
    pub fn block(&self, id: usize) -> Block {
        let block_row = id / self.blocks_per_dim;
        let block_col = id % self.blocks_per_dim;

        let row_start = (block_row * self.block_size).min(self.grid_size);
        let col_start = (block_col * self.block_size).min(self.grid_size);
        Block {
            row_start,
            row_end: (row_start + self.block_size).min(self.grid_size),
            col_start,
            col_end: (col_start + self.block_size).min(self.grid_size),
        }
    }

    /// Blocks along each axis that cover at least one row or column
    ///
    /// Blocks with a row or column index at or past this value are empty.
    pub fn occupied_per_dim(&self) -> usize {
        if self.block_size == 0 {
            0
        } else {
            self.grid_size.div_ceil(self.block_size)
        }
    }

    /// Ids and bounds of the non-empty blocks in row-major block order
    ///
    /// Never visits the empty blocks, so the cost follows the grid rather than
    /// the worker count.
    pub fn non_empty_blocks(&self) -> impl Iterator<Item = (usize, Block)> + '_ {
        let occupied = self.occupied_per_dim();
        (0..occupied).flat_map(move |block_row| {
            (0..occupied).map(move |block_col| {
                let id = block_row * self.blocks_per_dim + block_col;
                (id, self.block(id))
            })
        })
    }

    /// All blocks in row-major block order
    pub fn partition(&self) -> Vec<Block> {
        (0..self.block_count()).map(|id| self.block(id)).collect()
    }

    /// Block bounds grown by one cell on every side, clamped to the grid
    ///
    /// Ghost bounds are only ever read from. An empty block stays empty.
    pub fn ghost_bounds(&self, block: &Block) -> Block {
        if block.is_empty() {
            return *block;
        }
        Block {
            row_start: block.row_start.saturating_sub(1),
            row_end: (block.row_end + 1).min(self.grid_size),
            col_start: block.col_start.saturating_sub(1),
            col_end: (block.col_end + 1).min(self.grid_size),
        }
    }
}

/// Convenience wrapper around [`BlockPartitioner::partition`]
pub fn partition(grid_size: usize, worker_count: usize) -> Vec<Block> {
    BlockPartitioner::new(grid_size, worker_count).partition()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Owner block of every cell; panics on overlap
    fn ownership(grid_size: usize, worker_count: usize) -> Vec<Option<usize>> {
        let mut owner = vec![None; grid_size * grid_size];
        for (id, block) in partition(grid_size, worker_count).iter().enumerate() {
            for row in block.rows() {
                for col in block.cols() {
                    let slot = &mut owner[row * grid_size + col];
                    assert!(
                        slot.is_none(),
                        "cell ({row}, {col}) owned twice (n={grid_size}, w={worker_count})"
                    );
                    *slot = Some(id);
                }
            }
        }
        owner
    }

    #[test]
    fn test_ceil_sqrt() {
        assert_eq!(ceil_sqrt(1), 1);
        assert_eq!(ceil_sqrt(2), 2);
        assert_eq!(ceil_sqrt(4), 2);
        assert_eq!(ceil_sqrt(5), 3);
        assert_eq!(ceil_sqrt(9), 3);
        assert_eq!(ceil_sqrt(10), 4);
        assert_eq!(ceil_sqrt(1_000_000), 1000);
        assert_eq!(ceil_sqrt(1_000_001), 1001);
    }

    #[test]
    fn test_geometry() {
        let p = BlockPartitioner::new(1000, 8);
        assert_eq!(p.blocks_per_dim(), 3);
        assert_eq!(p.block_size(), 334);
        assert_eq!(p.block_count(), 9);

        let last = p.block(8);
        assert_eq!(last.rows(), 668..1000);
        assert_eq!(last.cols(), 668..1000);
    }

    #[test]
    fn test_single_worker_is_whole_grid() {
        let blocks = partition(7, 1);
        assert_eq!(
            blocks,
            vec![Block {
                row_start: 0,
                row_end: 7,
                col_start: 0,
                col_end: 7
            }]
        );
    }

    #[test]
    fn test_row_major_block_order() {
        let p = BlockPartitioner::new(10, 4);
        assert_eq!(p.block(1).cols(), 5..10);
        assert_eq!(p.block(1).rows(), 0..5);
        assert_eq!(p.block(2).rows(), 5..10);
        assert_eq!(p.block(2).cols(), 0..5);
    }

    #[test]
    fn test_partition_completeness() {
        for grid_size in 1..=13 {
            for worker_count in 1..=(grid_size * grid_size + 3) {
                let owner = ownership(grid_size, worker_count);
                assert!(
                    owner.iter().all(Option::is_some),
                    "gap in tiling (n={grid_size}, w={worker_count})"
                );
                let covered: usize = partition(grid_size, worker_count)
                    .iter()
                    .map(Block::cell_count)
                    .sum();
                assert_eq!(covered, grid_size * grid_size);
            }
        }
    }

    #[test]
    fn test_overshooting_worker_count_yields_empty_blocks() {
        // 2x2 grid, 9 workers: 3x3 blocks of size 1, last row/col empty
        let blocks = partition(2, 9);
        assert_eq!(blocks.len(), 9);
        assert_eq!(blocks.iter().filter(|b| b.is_empty()).count(), 5);
        assert_eq!(blocks.iter().filter(|b| !b.is_empty()).count(), 4);
    }

    #[test]
    fn test_non_empty_blocks_match_partition() {
        for (grid_size, worker_count) in [(0, 4), (1, 1), (2, 9), (5, 26), (10, 4), (13, 50)] {
            let p = BlockPartitioner::new(grid_size, worker_count);
            let expected: Vec<(usize, Block)> = p
                .partition()
                .into_iter()
                .enumerate()
                .filter(|(_, b)| !b.is_empty())
                .collect();
            let listed: Vec<(usize, Block)> = p.non_empty_blocks().collect();
            assert_eq!(listed, expected, "n={grid_size} w={worker_count}");
        }
    }

    #[test]
    fn test_non_empty_blocks_with_huge_worker_count() {
        let p = BlockPartitioner::new(5, 2_000_000);
        assert_eq!(p.blocks_per_dim(), 1415);
        assert_eq!(p.occupied_per_dim(), 5);
        let ids: Vec<usize> = p.non_empty_blocks().map(|(id, _)| id).collect();
        assert_eq!(ids.len(), 25);
        assert_eq!(ids[5], 1415);
        assert_eq!(p.block(ids[24]).rows(), 4..5);
    }

    #[test]
    fn test_ghost_bounds_clamped() {
        let p = BlockPartitioner::new(10, 4);

        let top_left = p.ghost_bounds(&p.block(0));
        assert_eq!(top_left.rows(), 0..6);
        assert_eq!(top_left.cols(), 0..6);

        let bottom_right = p.ghost_bounds(&p.block(3));
        assert_eq!(bottom_right.rows(), 4..10);
        assert_eq!(bottom_right.cols(), 4..10);
    }

    #[test]
    fn test_ghost_bounds_interior_block() {
        let p = BlockPartitioner::new(9, 9);
        let centre = p.block(4);
        assert_eq!(centre.rows(), 3..6);
        let ghost = p.ghost_bounds(&centre);
        assert_eq!(ghost.rows(), 2..7);
        assert_eq!(ghost.cols(), 2..7);
    }

    #[test]
    fn test_ghost_bounds_of_empty_block_is_empty() {
        let p = BlockPartitioner::new(2, 9);
        let empty = p.block(8);
        assert!(empty.is_empty());
        assert!(p.ghost_bounds(&empty).is_empty());
    }

    #[test]
    fn test_partition_is_deterministic() {
        assert_eq!(partition(100, 6), partition(100, 6));
    }
}
