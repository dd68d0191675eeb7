use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use flocksim::spatial_index::NaiveIndex;
use flocksim::{AgentId, BenchConfig, IndexKind, Simulation, SpatialIndex};
use statrs::statistics::{Data, Distribution, Max, Min};
use tracing_subscriber::EnvFilter;

/// Times the flocking simulation once per spatial index and prints the
/// average cost of a tick.
#[derive(Parser, Debug)]
#[command(name = "flocksim_bench", version)]
struct Args {
    /// YAML file with `world`, `simulation` and `bench` sections
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of boids
    #[arg(long)]
    boids: Option<usize>,

    /// Ticks run before timing starts
    #[arg(long)]
    warmup: Option<usize>,

    /// Timed ticks per index
    #[arg(long)]
    iterations: Option<usize>,

    /// Neighbour query radius
    #[arg(long)]
    radius: Option<f64>,

    /// Cell size of the grid hash index
    #[arg(long = "cell-size")]
    cell_size: Option<f64>,

    /// Seed for placement and wander jitter
    #[arg(long)]
    seed: Option<u64>,

    /// Index to benchmark (naive, kdtree, grid, quadtree); repeatable.
    /// Defaults to all of them.
    #[arg(long = "index", value_name = "KIND")]
    indexes: Vec<IndexKind>,

    /// Cross-check every index against the naive one before timing
    #[arg(long)]
    verify: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,
}

struct CaseResult {
    label: &'static str,
    mean_ms: f64,
    std_dev_ms: f64,
    min_ms: f64,
    max_ms: f64,
}

fn load_config(args: &Args) -> anyhow::Result<BenchConfig> {
    let mut config = match &args.config {
        Some(path) => BenchConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => BenchConfig::default(),
    };

    if let Some(boids) = args.boids {
        config.simulation.boid_count = boids;
    }
    if let Some(warmup) = args.warmup {
        config.warmup_iterations = warmup;
    }
    if let Some(iterations) = args.iterations {
        config.measured_iterations = iterations;
    }
    if let Some(radius) = args.radius {
        config.simulation.neighbour_radius = radius;
    }
    if let Some(cell_size) = args.cell_size {
        config.simulation.world.cell_size = cell_size;
    }
    if args.seed.is_some() {
        config.simulation.seed = args.seed;
    }
    if !args.indexes.is_empty() {
        config.indexes = args.indexes.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Builds every selected index from the same initial population and checks
/// each one returns the naive index's neighbour sets.
fn verify(config: &BenchConfig) -> anyhow::Result<()> {
    let reference = Simulation::from_config(&config.simulation, NaiveIndex::new())?;
    let agents = reference.agents();
    let radius = config.simulation.neighbour_radius;

    let mut naive = NaiveIndex::new();
    naive.rebuild(agents);

    for kind in &config.indexes {
        let mut index = kind.build(&config.simulation.world)?;
        index.rebuild(agents);
        for agent in agents {
            let expected: HashSet<AgentId> =
                naive.neighbours_in_radius(agent, radius).into_iter().collect();
            let found: HashSet<AgentId> =
                index.neighbours_in_radius(agent, radius).into_iter().collect();
            if found != expected {
                bail!(
                    "{} disagrees with the naive index for agent {}: {} vs {} neighbours",
                    index.name(),
                    agent.agent_id,
                    found.len(),
                    expected.len()
                );
            }
        }
        tracing::info!(index = index.name(), agents = agents.len(), "verified");
    }
    Ok(())
}

fn run_case(kind: IndexKind, config: &BenchConfig) -> anyhow::Result<CaseResult> {
    // A fresh index per case so no state carries over between strategies
    let index = kind.build(&config.simulation.world)?;
    let mut simulation = Simulation::from_config(&config.simulation, index)?;

    for _ in 0..config.warmup_iterations {
        simulation.step();
    }

    let mut samples = Vec::with_capacity(config.measured_iterations);
    for _ in 0..config.measured_iterations {
        simulation.step();
        samples.push(simulation.last_tick_duration().as_secs_f64() * 1000f64);
    }

    let data = Data::new(samples);
    let result = CaseResult {
        label: simulation.index_name(),
        mean_ms: data.mean().unwrap_or(0f64),
        std_dev_ms: data.std_dev().unwrap_or(0f64),
        min_ms: data.min(),
        max_ms: data.max(),
    };
    tracing::debug!(
        index = result.label,
        mean_ms = result.mean_ms,
        max_ms = result.max_ms,
        "case finished"
    );
    Ok(result)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(&args)?;
    if args.verify {
        verify(&config)?;
    }

    println!(
        "Boids: {} | Iterations: {} (warmup: {}) | Radius: {:.1}",
        config.simulation.boid_count,
        config.measured_iterations,
        config.warmup_iterations,
        config.simulation.neighbour_radius
    );
    println!("--------------------------------------------------------");

    let mut results = vec![];
    for kind in &config.indexes {
        tracing::info!(index = %kind, "running");
        results.push(run_case(*kind, &config)?);
    }

    for result in &results {
        println!(
            "{:<18} {:.3} ms/iteration (± {:.3}, min {:.3}, max {:.3})",
            result.label, result.mean_ms, result.std_dev_ms, result.min_ms, result.max_ms
        );
    }
    Ok(())
}
