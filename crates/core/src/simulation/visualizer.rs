//! Text sample of the grid for console progress output

use crate::grid::EpidemicGrid;

/// Maximum sampled rows and columns
pub const SAMPLE_SIZE: usize = 50;

/// Renders a down-sampled view of a grid
#[derive(Debug, Clone, Copy)]
pub struct Visualizer {
    grid_size: usize,
    step: usize,
}

impl Visualizer {
    /// Create a visualizer for a `grid_size` grid
    ///
    /// Every `max(1, grid_size / 50)`-th row and column is sampled.
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            step: (grid_size / SAMPLE_SIZE).max(1),
        }
    }

    /// Sampling stride
    pub fn step(&self) -> usize {
        self.step
    }

    /// Sampled coordinates along one axis of a `size` grid
    fn sample_axis(&self, size: usize) -> impl Iterator<Item = usize> {
        (0..self.grid_size.min(size))
            .step_by(self.step)
            .take(SAMPLE_SIZE)
    }

    /// Render the sample for `day`
    ///
    /// The first line is a caption, then one line per sampled row using
    /// `.` `I` `R` `X` for the four states. Every line is indented by two
    /// spaces and ends with a newline. A grid smaller than the configured
    /// size is sampled only within its own bounds.
    pub fn grid_summary(&self, grid: &EpidemicGrid, day: u32) -> String {
        let size = grid.size();
        let width = self.sample_axis(size).count();
        let mut out = String::with_capacity((width + 3) * (width + 1) + 32);
        out.push_str(&format!("  Grid sample (day {day}):\n"));
        for row in self.sample_axis(size) {
            out.push_str("  ");
            for col in self.sample_axis(size) {
                out.push(grid.get(row, col).symbol());
            }
            out.push('\n');
        }
        out
    }
}
