//! Parallel day step using block decomposition and Rayon
//!
//! One day is computed as:
//!
//! 1. Clone the previous-day grid into the next-day buffer.
//! 2. Tile the grid with [`BlockPartitioner`] and split the next-day buffer
//!    into per-block row segments. The segments are disjoint `&mut` borrows,
//!    so blocks can be written concurrently without locks.
//! 3. Block `i` goes to lane `i % worker_count`. Each lane owns one
//!    [`RandomStream`] and processes its blocks in order, so a stream is never
//!    touched by two threads and the outcome does not depend on scheduling.
//!    Only lanes that own a non-empty block exist, so an oversized worker
//!    count costs nothing per step.
//! 4. Lanes run on the engine's thread pool and read only the previous-day
//!    grid (or a ghost-window copy of it).
//!
//! The next-day grid is returned once every lane has finished.

use super::rule::TransitionRule;
use super::stats::{PopulationCounts, StatsReducer};
use crate::core_types::{CellState, RandomStream, StreamPool};
use crate::grid::{Block, BlockPartitioner, CellSource, EpidemicGrid, GhostWindow};
use crate::simulation::config::{available_workers, ConfigError, NeighborMode};
use rayon::prelude::*;
use tracing::{trace, warn};

/// One block's share of the next-day buffer
struct BlockTask<'a> {
    block: Block,
    ghost: Block,
    rows: Vec<&'a mut [CellState]>,
}

/// Computes simulation days on a dedicated worker pool
pub struct ParallelStepEngine {
    partitioner: BlockPartitioner,
    rule: TransitionRule,
    neighbor_mode: NeighborMode,
    active_slots: Vec<usize>,
    pool: rayon::ThreadPool,
}

impl ParallelStepEngine {
    /// Create an engine for a `grid_size` grid with `worker_count` slots
    ///
    /// The pool gets `min(worker_count, available cores)` threads. Logical
    /// slots, and with them the random streams and results, are unaffected by
    /// that clamp.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWorkerCount`] for zero workers and
    /// [`ConfigError::ThreadPool`] if the pool cannot be created
    pub fn new(
        grid_size: usize,
        worker_count: usize,
        rule: TransitionRule,
        neighbor_mode: NeighborMode,
    ) -> Result<Self, ConfigError> {
        if worker_count == 0 {
            return Err(ConfigError::InvalidWorkerCount);
        }

        let available = available_workers();
        let threads = worker_count.min(available);
        if threads < worker_count {
            warn!(
                "Requested {} workers but only {} hardware threads are available; \
                 running {} logical slots on {} threads",
                worker_count, available, worker_count, threads
            );
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("epidemic-worker-{i}"))
            .build()
            .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;

        let partitioner = BlockPartitioner::new(grid_size, worker_count);
        let mut active_slots: Vec<usize> = partitioner
            .non_empty_blocks()
            .map(|(id, _)| id % worker_count)
            .collect();
        active_slots.sort_unstable();
        active_slots.dedup();

        Ok(Self {
            partitioner,
            rule,
            neighbor_mode,
            active_slots,
            pool,
        })
    }

    /// Logical worker slots
    pub fn worker_count(&self) -> usize {
        self.partitioner.worker_count()
    }

    /// Worker slots owning at least one non-empty block, ascending
    pub fn active_slots(&self) -> &[usize] {
        &self.active_slots
    }

    /// Fresh streams for the active slots, seeded from `base_seed`
    pub fn stream_pool(&self, base_seed: u64) -> StreamPool {
        StreamPool::for_slots(base_seed, &self.active_slots)
    }

    /// OS threads in the pool
    pub fn pool_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Block geometry used for every step
    pub fn partitioner(&self) -> &BlockPartitioner {
        &self.partitioner
    }

    /// Transition rule applied to every cell
    pub fn rule(&self) -> &TransitionRule {
        &self.rule
    }

    /// Compute the next day from `read`
    ///
    /// `streams` must come from [`Self::stream_pool`].
    ///
    /// # Panics
    ///
    /// Panics if `read` does not match the engine's grid size or the stream
    /// pool does not cover exactly the active slots
    pub fn step(&self, read: &EpidemicGrid, streams: &mut StreamPool) -> EpidemicGrid {
        assert_eq!(
            read.size(),
            self.partitioner.grid_size(),
            "grid size does not match engine"
        );
        assert_eq!(
            streams.slots(),
            self.active_slots.as_slice(),
            "one random stream per active worker slot required"
        );

        let mut write = read.clone();
        let lanes = self.split_lanes(write.as_mut_slice());
        let rule = self.rule;
        let mode = self.neighbor_mode;

        self.pool.install(|| {
            self.active_slots
                .par_iter()
                .zip(streams.as_mut_slice().par_iter_mut())
                .zip(lanes.into_par_iter())
                .for_each(|((&slot, stream), lane)| {
                    trace!(slot, blocks = lane.len(), "processing lane");
                    for task in lane {
                        process_block(&rule, mode, read, task, stream);
                    }
                });
        });

        write
    }

    /// Count cells by state on the engine's pool
    pub fn count(&self, grid: &EpidemicGrid) -> PopulationCounts {
        self.pool.install(|| StatsReducer::count(grid))
    }

    /// Split `cells` into per-block row segments grouped by lane
    ///
    /// Lane `k` belongs to slot `active_slots[k]`.
    fn split_lanes<'a>(&self, cells: &'a mut [CellState]) -> Vec<Vec<BlockTask<'a>>> {
        let size = self.partitioner.grid_size();
        let occupied = self.partitioner.occupied_per_dim();
        let blocks: Vec<(usize, Block)> = self.partitioner.non_empty_blocks().collect();

        let mut block_rows: Vec<Vec<&'a mut [CellState]>> = blocks
            .iter()
            .map(|(_, block)| Vec::with_capacity(block.height()))
            .collect();

        if size > 0 {
            let block_size = self.partitioner.block_size();
            for (row, row_cells) in cells.chunks_mut(size).enumerate() {
                let first = (row / block_size) * occupied;
                let row_blocks = &mut block_rows[first..first + occupied];
                let mut rest = row_cells;
                for (segments, (_, block)) in row_blocks.iter_mut().zip(&blocks[first..]) {
                    let (segment, tail) = std::mem::take(&mut rest).split_at_mut(block.width());
                    rest = tail;
                    segments.push(segment);
                }
            }
        }

        let workers = self.worker_count();
        let mut lanes: Vec<Vec<BlockTask<'a>>> =
            self.active_slots.iter().map(|_| Vec::new()).collect();
        for ((id, block), rows) in blocks.into_iter().zip(block_rows) {
            if let Ok(lane) = self.active_slots.binary_search(&(id % workers)) {
                lanes[lane].push(BlockTask {
                    block,
                    ghost: self.partitioner.ghost_bounds(&block),
                    rows,
                });
            }
        }
        lanes
    }
}

/// Run the rule over one block with its lane's stream
fn process_block(
    rule: &TransitionRule,
    mode: NeighborMode,
    read: &EpidemicGrid,
    task: BlockTask<'_>,
    stream: &mut RandomStream,
) {
    match mode {
        NeighborMode::SharedSnapshot => sweep(rule, read, task, stream),
        NeighborMode::GhostCopy => {
            let window = GhostWindow::capture(read, task.ghost);
            sweep(rule, &window, task, stream);
        }
    }
}

/// Row-major scan of a block, writing into its own segments only
fn sweep<S: CellSource>(
    rule: &TransitionRule,
    source: &S,
    task: BlockTask<'_>,
    stream: &mut RandomStream,
) {
    let BlockTask { block, rows, .. } = task;
    for (row, cells) in block.rows().zip(rows) {
        for (col, cell) in block.cols().zip(cells.iter_mut()) {
            rule.apply(source, row, col, cell, stream);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(grid_size: usize, workers: usize, rule: TransitionRule) -> ParallelStepEngine {
        ParallelStepEngine::new(grid_size, workers, rule, NeighborMode::SharedSnapshot).unwrap()
    }

    #[test]
    fn test_rejects_zero_workers() {
        let rule = TransitionRule::new(0.3, 0.1, 0.01);
        let result = ParallelStepEngine::new(10, 0, rule, NeighborMode::SharedSnapshot);
        assert!(matches!(result, Err(ConfigError::InvalidWorkerCount)));
    }

    #[test]
    fn test_pool_threads_clamped_to_hardware() {
        let e = engine(10, 10_000, TransitionRule::new(0.3, 0.1, 0.01));
        assert_eq!(e.worker_count(), 10_000);
        assert!(e.pool_threads() <= available_workers());
        assert!(e.pool_threads() >= 1);
    }

    #[test]
    fn test_lanes_cover_every_cell_once() {
        for (size, workers) in [(1, 1), (5, 2), (10, 3), (10, 4), (7, 49), (3, 20)] {
            let e = engine(size, workers, TransitionRule::new(0.0, 0.0, 0.0));
            let mut cells = vec![CellState::Susceptible; size * size];
            let lanes = e.split_lanes(&mut cells);
            assert_eq!(lanes.len(), e.active_slots().len());

            let covered: usize = lanes
                .iter()
                .flatten()
                .map(|task| {
                    assert_eq!(task.rows.len(), task.block.height());
                    for segment in &task.rows {
                        assert_eq!(segment.len(), task.block.width());
                    }
                    task.block.cell_count()
                })
                .sum();
            assert_eq!(covered, size * size, "size={size} workers={workers}");
        }
    }

    #[test]
    fn test_block_to_lane_assignment() {
        // 5 workers -> 3x3 = 9 blocks; lane 0 gets blocks 0 and 5
        let e = engine(9, 5, TransitionRule::new(0.0, 0.0, 0.0));
        let mut cells = vec![CellState::Susceptible; 81];
        let lanes = e.split_lanes(&mut cells);
        let lane0: Vec<Block> = lanes[0].iter().map(|t| t.block).collect();
        assert_eq!(lane0, vec![e.partitioner().block(0), e.partitioner().block(5)]);
        assert_eq!(lanes[4].len(), 1);
    }

    #[test]
    fn test_segments_write_through_to_buffer() {
        let e = engine(6, 4, TransitionRule::new(0.0, 0.0, 0.0));
        let mut cells = vec![CellState::Susceptible; 36];
        {
            let lanes = e.split_lanes(&mut cells);
            for task in lanes.into_iter().flatten() {
                let BlockTask { block, mut rows, .. } = task;
                if block.row_start == 3 && block.col_start == 3 {
                    rows[0][0] = CellState::Dead;
                }
            }
        }
        assert_eq!(cells[3 * 6 + 3], CellState::Dead);
        assert_eq!(cells.iter().filter(|&&c| c == CellState::Dead).count(), 1);
    }

    #[test]
    fn test_step_leaves_read_grid_untouched() {
        let mut grid = EpidemicGrid::new(8);
        grid.set(4, 4, CellState::Infected);
        let before = grid.clone();

        let e = engine(8, 4, TransitionRule::new(1.0, 0.0, 0.0));
        let mut streams = e.stream_pool(42);
        let next = e.step(&grid, &mut streams);

        assert_eq!(grid, before);
        assert_eq!(next.count(CellState::Infected), 9);
    }

    #[test]
    fn test_ghost_copy_matches_shared_snapshot() {
        let rule = TransitionRule::new(0.4, 0.2, 0.05);
        let shared = engine(30, 6, rule);
        let ghost = ParallelStepEngine::new(30, 6, rule, NeighborMode::GhostCopy).unwrap();

        let mut grid = EpidemicGrid::new(30);
        for (row, col) in [(0, 0), (10, 10), (14, 15), (29, 29), (20, 3)] {
            grid.set(row, col, CellState::Infected);
        }

        let mut streams_a = shared.stream_pool(9);
        let mut streams_b = ghost.stream_pool(9);
        let mut a = grid.clone();
        let mut b = grid;
        for _ in 0..15 {
            a = shared.step(&a, &mut streams_a);
            b = ghost.step(&b, &mut streams_b);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_only_slots_with_work_get_streams() {
        // 3x3 grid, 20 workers: 5x5 blocks of one cell, only the top-left 3x3 occupied
        let e = engine(3, 20, TransitionRule::new(0.0, 0.0, 0.0));
        assert_eq!(e.active_slots(), &[0, 1, 2, 5, 6, 7, 10, 11, 12]);
        assert_eq!(e.stream_pool(1).len(), 9);

        // Block ids past the worker count wrap onto lower slots
        let e = engine(9, 5, TransitionRule::new(0.0, 0.0, 0.0));
        assert_eq!(e.active_slots(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_huge_worker_count_on_tiny_grid() {
        let e = engine(5, 2_000_000, TransitionRule::new(1.0, 0.0, 0.0));
        assert_eq!(e.worker_count(), 2_000_000);
        assert_eq!(e.partitioner().block_count(), 2_002_225);

        let mut streams = e.stream_pool(42);
        assert_eq!(streams.len(), 25);
        assert_eq!(streams.slots()[5], 1415);

        let mut grid = EpidemicGrid::new(5);
        grid.set(2, 2, CellState::Infected);
        let next = e.step(&grid, &mut streams);
        assert_eq!(next.count(CellState::Infected), 9);
    }

    #[test]
    #[should_panic(expected = "active worker slot")]
    fn test_step_rejects_mismatched_streams() {
        let e = engine(3, 20, TransitionRule::new(0.0, 0.0, 0.0));
        let mut streams = StreamPool::for_slots(1, &[0, 1, 2]);
        e.step(&EpidemicGrid::new(3), &mut streams);
    }

    #[test]
    fn test_count_on_engine_pool() {
        let mut grid = EpidemicGrid::new(4);
        grid.set(0, 0, CellState::Dead);
        let e = engine(4, 2, TransitionRule::new(0.0, 0.0, 0.0));
        let counts = e.count(&grid);
        assert_eq!(counts.dead, 1);
        assert_eq!(counts.susceptible, 15);
    }
}
