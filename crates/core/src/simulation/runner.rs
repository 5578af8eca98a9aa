//! Day loop shared by the driver and the scaling benchmark

use super::config::{available_workers, ConfigError, SimulationConfig};
use super::history::{DayStatistics, StatisticsHistory};
use super::model::EpidemicModel;
use super::r#trait::EpidemicSimulation;
use crate::solver::PopulationCounts;
use std::time::Instant;
use tracing::{debug, info};

/// Thread counts tried by the strong-scaling experiment
pub const SCALING_THREAD_COUNTS: [usize; 4] = [1, 2, 4, 8];

/// Days simulated per strong-scaling run
pub const SCALING_DAYS: u32 = 100;

/// Outcome of [`run_simulation`]
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// One record per simulated day
    pub history: StatisticsHistory,
    /// Wall time of the whole loop in seconds
    pub elapsed_seconds: f64,
    /// Day on which the last infection ended, if it happened
    pub extinction_day: Option<u32>,
    /// Counts after the last simulated day
    pub final_counts: PopulationCounts,
}

impl RunSummary {
    /// Individuals that were infected at some point
    pub fn total_affected(&self) -> usize {
        self.final_counts.ever_infected()
    }

    /// Share of the population ever infected, in percent
    pub fn percent_affected(&self) -> f64 {
        let total = self.final_counts.total();
        if total == 0 {
            return 0.0;
        }
        self.total_affected() as f64 / total as f64 * 100.0
    }
}

/// Run `sim` for up to `days` days
///
/// After every day the counts and R0 are recorded and `on_day` is called with
/// the model and that day's record. The loop stops early on the first day
/// without infected individuals.
///
/// # Errors
///
/// Returns the first error produced by `on_day`
pub fn run_simulation<S, F, E>(sim: &mut S, days: u32, mut on_day: F) -> Result<RunSummary, E>
where
    S: EpidemicSimulation + ?Sized,
    F: FnMut(&S, &DayStatistics) -> Result<(), E>,
{
    let start = Instant::now();
    let mut history = StatisticsHistory::new();
    let mut extinction_day = None;

    for day in 1..=days {
        sim.step();
        let counts = sim.statistics();
        let record = history.record_day(day, counts, sim.r0(day));
        on_day(&*sim, &record)?;

        if counts.infected == 0 {
            info!("Epidemic ended on day {day} ({} backend)", sim.label());
            extinction_day = Some(day);
            break;
        }
    }

    Ok(RunSummary {
        history,
        elapsed_seconds: start.elapsed().as_secs_f64(),
        extinction_day,
        final_counts: sim.statistics(),
    })
}

/// One row of the strong-scaling table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingResult {
    /// Worker count of the run
    pub cores: usize,
    /// Wall time in seconds
    pub time_seconds: f64,
    /// Baseline time over this run's time
    pub speedup: f64,
    /// Speedup per worker
    pub efficiency: f64,
}

impl ScalingResult {
    /// Derive speedup and efficiency relative to `baseline_seconds`
    pub fn new(cores: usize, baseline_seconds: f64, time_seconds: f64) -> Self {
        let speedup = if time_seconds > 0.0 {
            baseline_seconds / time_seconds
        } else {
            0.0
        };
        Self {
            cores,
            time_seconds,
            speedup,
            efficiency: speedup / cores.max(1) as f64,
        }
    }
}

/// Thread counts from [`SCALING_THREAD_COUNTS`] this machine can run
pub fn scaling_thread_counts() -> Vec<usize> {
    let available = available_workers();
    SCALING_THREAD_COUNTS
        .iter()
        .copied()
        .take_while(|&threads| threads <= available)
        .collect()
}

/// Time the parallel model for each worker count in `thread_counts`
///
/// Every run uses `config` with its worker count replaced and simulates up to
/// `days` days. The first run is the baseline for speedup and efficiency.
///
/// # Errors
///
/// Returns error if a model cannot be built
pub fn measure_scaling(
    config: &SimulationConfig,
    thread_counts: &[usize],
    days: u32,
) -> Result<Vec<ScalingResult>, ConfigError> {
    let mut timings = Vec::with_capacity(thread_counts.len());
    for &threads in thread_counts {
        let mut model = EpidemicModel::new(config.clone().with_worker_count(threads))?;
        let start = Instant::now();
        for _ in 0..days {
            model.step();
            if model.is_extinguished() {
                break;
            }
        }
        let seconds = start.elapsed().as_secs_f64();
        debug!("Scaling run with {threads} workers took {seconds:.4}s");
        timings.push((threads, seconds));
    }

    let baseline = timings.first().map_or(0.0, |&(_, seconds)| seconds);
    Ok(timings
        .into_iter()
        .map(|(threads, seconds)| ScalingResult::new(threads, baseline, seconds))
        .collect())
}
