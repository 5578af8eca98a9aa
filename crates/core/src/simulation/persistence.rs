//! Output files written by a simulation run
//!
//! The engine itself never touches the filesystem; callers pull statistics
//! and grids from a model and hand them to the functions here.

use super::history::StatisticsHistory;
use super::runner::ScalingResult;
use crate::grid::EpidemicGrid;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// CSV header of the strong-scaling results file
pub const SCALING_CSV_HEADER: &str = "Cores,Time,Speedup,Efficiency";

/// File name of the snapshot for `day`
pub fn snapshot_file_name(day: u32) -> String {
    format!("grid_day_{day:03}.csv")
}

/// Create `dir` and any missing parents
///
/// # Errors
///
/// Returns [`PersistenceError::CreateDirFailed`] if the directory cannot be created
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> Result<(), PersistenceError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| PersistenceError::CreateDirFailed {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })
}

impl StatisticsHistory {
    /// Write the history as CSV to `path`
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created or written
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let file = create_file(path)?;
        self.write_csv(BufWriter::new(file))
            .map_err(|e| write_failed(path, &e))
    }
}

/// Write the total run time, and the worker count of a parallel run
///
/// The first line holds the seconds with four decimals. A parallel run passes
/// `Some(cores)`, which adds the count on a second line; a sequential run
/// passes `None` and the file holds the seconds only.
///
/// # Errors
///
/// Returns error if the file cannot be written
pub fn save_execution_time<P: AsRef<Path>>(
    path: P,
    seconds: f64,
    cores: Option<usize>,
) -> Result<(), PersistenceError> {
    let path = path.as_ref();
    let text = match cores {
        Some(cores) => format!("{seconds:.4}\n{cores}"),
        None => format!("{seconds:.4}"),
    };
    fs::write(path, text).map_err(|e| write_failed(path, &e))
}

/// Write `grid` as `grid_day_{day:03}.csv` inside `dir`
///
/// One line per grid row, cells as comma-separated state codes. Returns the
/// path of the written file.
///
/// # Errors
///
/// Returns error if the file cannot be created or written
pub fn save_grid_snapshot<P: AsRef<Path>>(
    grid: &EpidemicGrid,
    day: u32,
    dir: P,
) -> Result<PathBuf, PersistenceError> {
    let path = dir.as_ref().join(snapshot_file_name(day));
    let file = create_file(&path)?;
    write_grid(grid, BufWriter::new(file)).map_err(|e| write_failed(&path, &e))?;
    Ok(path)
}

/// Write the strong-scaling table
///
/// # Errors
///
/// Returns error if the file cannot be created or written
pub fn save_scaling_results<P: AsRef<Path>>(
    path: P,
    results: &[ScalingResult],
) -> Result<(), PersistenceError> {
    let path = path.as_ref();
    let file = create_file(path)?;
    write_scaling(results, BufWriter::new(file)).map_err(|e| write_failed(path, &e))
}

fn write_grid<W: Write>(grid: &EpidemicGrid, mut writer: W) -> std::io::Result<()> {
    let mut line = String::with_capacity(grid.size() * 2);
    for row in grid.rows() {
        line.clear();
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push(char::from(b'0' + cell.code()));
        }
        writeln!(writer, "{line}")?;
    }
    writer.flush()
}

fn write_scaling<W: Write>(results: &[ScalingResult], mut writer: W) -> std::io::Result<()> {
    writeln!(writer, "{SCALING_CSV_HEADER}")?;
    for r in results {
        writeln!(
            writer,
            "{},{:.4},{:.4},{:.4}",
            r.cores, r.time_seconds, r.speedup, r.efficiency
        )?;
    }
    writer.flush()
}

fn create_file(path: &Path) -> Result<File, PersistenceError> {
    File::create(path).map_err(|e| PersistenceError::CreateFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn write_failed(path: &Path, err: &std::io::Error) -> PersistenceError {
    PersistenceError::WriteFailed {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Errors that can occur while writing output files
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceError {
    /// Failed to create an output directory
    CreateDirFailed {
        /// Directory path
        path: PathBuf,
        /// Underlying error
        message: String,
    },
    /// Failed to create an output file
    CreateFailed {
        /// File path
        path: PathBuf,
        /// Underlying error
        message: String,
    },
    /// Failed to write an output file
    WriteFailed {
        /// File path
        path: PathBuf,
        /// Underlying error
        message: String,
    },
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::CreateDirFailed { path, message } => {
                write!(f, "Failed to create directory {}: {message}", path.display())
            }
            PersistenceError::CreateFailed { path, message } => {
                write!(f, "Failed to create {}: {message}", path.display())
            }
            PersistenceError::WriteFailed { path, message } => {
                write!(f, "Failed to write {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::CellState;
    use std::env;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("epidemic-sim-{name}-{}", std::process::id()));
        ensure_dir(&dir).unwrap();
        dir
    }

    #[test]
    fn test_snapshot_file_name_is_zero_padded() {
        assert_eq!(snapshot_file_name(0), "grid_day_000.csv");
        assert_eq!(snapshot_file_name(30), "grid_day_030.csv");
        assert_eq!(snapshot_file_name(365), "grid_day_365.csv");
    }

    #[test]
    fn test_grid_snapshot_contents() {
        let dir = scratch_dir("snapshot");
        let mut grid = EpidemicGrid::new(3);
        grid.set(0, 1, CellState::Infected);
        grid.set(1, 2, CellState::Recovered);
        grid.set(2, 0, CellState::Dead);

        let path = save_grid_snapshot(&grid, 7, &dir).unwrap();
        assert!(path.ends_with("grid_day_007.csv"));

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "0,1,0\n0,0,2\n3,0,0\n");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_execution_time_format() {
        let dir = scratch_dir("exec-time");
        let path = dir.join("execution_time.txt");
        save_execution_time(&path, 12.345_678, Some(8)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "12.3457\n8");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_sequential_execution_time_is_seconds_only() {
        let dir = scratch_dir("exec-time-seq");
        let path = dir.join("execution_time.txt");
        save_execution_time(&path, 0.001_94, None).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "0.0019");
        let seconds: f64 = text.trim().parse().unwrap();
        approx::assert_relative_eq!(seconds, 0.0019);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_scaling_results_format() {
        let dir = scratch_dir("scaling");
        let path = dir.join("scaling_results.csv");
        let results = vec![
            ScalingResult::new(1, 4.0, 4.0),
            ScalingResult::new(2, 4.0, 2.5),
        ];
        save_scaling_results(&path, &results).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], SCALING_CSV_HEADER);
        assert_eq!(lines[1], "1,4.0000,1.0000,1.0000");
        assert_eq!(lines[2], "2,2.5000,1.6000,0.8000");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_directory_reports_path() {
        let dir = env::temp_dir().join(format!("epidemic-sim-missing-{}", std::process::id()));
        let err = save_grid_snapshot(&EpidemicGrid::new(2), 1, dir.join("nested")).unwrap_err();
        match err {
            PersistenceError::CreateFailed { path, .. } => {
                assert!(path.ends_with("grid_day_001.csv"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
