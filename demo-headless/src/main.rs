use clap::{Parser, ValueEnum};
use epidemic_sim_core::simulation::config::available_workers;
use epidemic_sim_core::simulation::persistence::{ensure_dir, save_scaling_results};
use epidemic_sim_core::simulation::runner::{scaling_thread_counts, SCALING_DAYS};
use epidemic_sim_core::simulation::{
    measure_scaling, run_simulation, save_execution_time, save_grid_snapshot, RunSummary,
    Visualizer,
};
use epidemic_sim_core::{
    EpidemicModel, EpidemicSimulation, NeighborMode, SequentialModel, SimulationConfig,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Days between progress reports
const PROGRESS_INTERVAL: u32 = 50;

/// Days between grid snapshots
const SNAPSHOT_INTERVAL: u32 = 30;

/// Which model advances the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Block-parallel engine
    Parallel,
    /// Single-threaded reference scan
    Sequential,
}

/// Stochastic SIR-D epidemic simulation on a square grid
#[derive(Parser, Debug)]
#[command(name = "epidemic-sim")]
#[command(about = "Monte-Carlo SIR-D epidemic simulation", long_about = None)]
struct Args {
    /// Grid side length [default: 1000]
    #[arg(short, long)]
    grid_size: Option<usize>,

    /// Days to simulate [default: 365]
    #[arg(short, long)]
    days: Option<u32>,

    /// Per-neighbor infection probability [default: 0.3]
    #[arg(long)]
    infection_prob: Option<f64>,

    /// Daily recovery probability [default: 0.1]
    #[arg(long)]
    recovery_prob: Option<f64>,

    /// Daily death probability [default: 0.01]
    #[arg(long)]
    death_prob: Option<f64>,

    /// Initially infected individuals [default: 10]
    #[arg(short, long)]
    initial_infected: Option<usize>,

    /// Worker slots [default: available cores]
    #[arg(short, long)]
    threads: Option<usize>,

    /// Base random seed [default: 42]
    #[arg(short, long)]
    seed: Option<u64>,

    /// Read neighbors from per-block ghost copies
    #[arg(long)]
    ghost_copy: bool,

    /// Model to run
    #[arg(short, long, value_enum, default_value_t = Mode::Parallel)]
    mode: Mode,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// JSON configuration file; flags given on the command line override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run the strong-scaling experiment instead of a single simulation
    #[arg(long)]
    scaling: bool,
}

impl Args {
    /// Merge the optional config file with command-line overrides
    fn simulation_config(&self) -> Result<SimulationConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load(path)?,
            None => SimulationConfig::default(),
        };
        if let Some(grid_size) = self.grid_size {
            config.grid_size = grid_size;
        }
        if let Some(days) = self.days {
            config.days = days;
        }
        if let Some(p) = self.infection_prob {
            config.infection_prob = p;
        }
        if let Some(p) = self.recovery_prob {
            config.recovery_prob = p;
        }
        if let Some(p) = self.death_prob {
            config.death_prob = p;
        }
        if let Some(count) = self.initial_infected {
            config.initial_infected = count;
        }
        if let Some(threads) = self.threads {
            config.worker_count = threads;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if self.ghost_copy {
            config.neighbor_mode = NeighborMode::GhostCopy;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let result = if args.scaling {
        run_scaling(&args)
    } else {
        run_single(&args)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn banner(title: &str) {
    println!("=============================================================");
    println!("{title:^61}");
    println!("=============================================================");
}

fn run_single(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = args.simulation_config()?;
    let cores = match args.mode {
        Mode::Parallel => config.worker_count,
        Mode::Sequential => 1,
    };

    banner(match args.mode {
        Mode::Parallel => "SIR MONTE-CARLO SIMULATION - PARALLEL",
        Mode::Sequential => "SIR MONTE-CARLO SIMULATION - SEQUENTIAL",
    });
    println!();
    println!("Parameters:");
    println!(
        "  Grid size: {}x{} ({} individuals)",
        config.grid_size,
        config.grid_size,
        config.capacity()
    );
    println!("  Days to simulate: {}", config.days);
    println!("  Initial infected: {}", config.initial_infected);
    println!("  P(infection): {:.2}", config.infection_prob);
    println!("  P(recovery): {:.2}", config.recovery_prob);
    println!("  P(death): {:.2}", config.death_prob);
    println!("  Seed: {}", config.seed);
    println!("  Available cores: {}", available_workers());
    println!("  Cores used: {cores}");
    println!();

    let snapshot_dir = args.output.join("grid_snapshots");
    ensure_dir(&args.output)?;
    ensure_dir(&snapshot_dir)?;

    let mut sim: Box<dyn EpidemicSimulation> = match args.mode {
        Mode::Parallel => Box::new(EpidemicModel::new(config.clone())?),
        Mode::Sequential => Box::new(SequentialModel::new(config.clone())?),
    };

    println!("Starting {} simulation...", sim.label());
    println!();

    let visualizer = Visualizer::new(config.grid_size);
    let days = config.days;
    let summary = run_simulation(sim.as_mut(), days, |sim, record| {
        if record.day == 1 || record.day % PROGRESS_INTERVAL == 0 {
            println!(
                "Day {:>3}/{days} - Infected: {:>8} - R0: {:>5.2}",
                record.day, record.infected, record.r0
            );
            println!();
            print!("{}", visualizer.grid_summary(&sim.grid(), record.day));
        }
        if record.day % SNAPSHOT_INTERVAL == 0 {
            save_grid_snapshot(&sim.grid(), record.day, &snapshot_dir)?;
        }
        if record.infected == 0 {
            println!();
            println!("Epidemic ended on day {}", record.day);
        }
        Ok::<(), Box<dyn Error>>(())
    })?;

    print_summary(&summary, cores);

    let statistics_path = args.output.join("statistics.csv");
    let time_path = args.output.join("execution_time.txt");
    summary.history.save_csv(&statistics_path)?;
    let recorded_cores = match args.mode {
        Mode::Parallel => Some(cores),
        Mode::Sequential => None,
    };
    save_execution_time(&time_path, summary.elapsed_seconds, recorded_cores)?;

    println!("Generated files:");
    println!("  - {}", statistics_path.display());
    println!("  - {}", time_path.display());
    println!("  - {}/", snapshot_dir.display());
    println!();
    println!("Simulation completed successfully.");
    Ok(())
}

fn print_summary(summary: &RunSummary, cores: usize) {
    let counts = &summary.final_counts;
    println!();
    banner("RESULTS SUMMARY");
    println!("Total execution time: {:.2} seconds", summary.elapsed_seconds);
    println!("Cores used: {cores}");
    println!();
    println!("Final susceptible: {:>10}", counts.susceptible);
    println!("Final infected:    {:>10}", counts.infected);
    println!("Final recovered:   {:>10}", counts.recovered);
    println!("Final dead:        {:>10}", counts.dead);
    println!(
        "Total affected:    {:>10} ({:.2}%)",
        summary.total_affected(),
        summary.percent_affected()
    );
    println!();
}

fn run_scaling(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = args.simulation_config()?;
    let thread_counts = scaling_thread_counts();

    banner("STRONG SCALING EXPERIMENT");
    println!();
    println!(
        "Grid {}x{}, {} days, thread counts {:?}",
        config.grid_size, config.grid_size, SCALING_DAYS, thread_counts
    );
    println!();

    let results = measure_scaling(&config, &thread_counts, SCALING_DAYS)?;
    for r in &results {
        println!("Ran with {} core(s): {:.2} seconds", r.cores, r.time_seconds);
    }
    println!();

    ensure_dir(&args.output)?;
    let path = args.output.join("scaling_results.csv");
    save_scaling_results(&path, &results)?;

    banner("SCALING RESULTS");
    println!("{:<10}{:<15}{:<15}{:<15}", "Cores", "Time (s)", "Speedup", "Efficiency");
    println!("{}", "-".repeat(60));
    for r in &results {
        let efficiency = format!("{:.2}%", r.efficiency * 100.0);
        println!(
            "{:<10}{:<15.2}{:<15.2}{:<15}",
            r.cores, r.time_seconds, r.speedup, efficiency
        );
    }
    println!();
    println!("Results written to {}", path.display());
    Ok(())
}
