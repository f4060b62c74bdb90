use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use supply_risk_sim::io::reporting;
use supply_risk_sim::simulation::config::load_config;
use supply_risk_sim::{
    rng, run_experiment_seeded, DisruptionSimulator, DistributionSpec, InventoryConfig,
    InventorySimulation, PolicyKind, PolicyParameters, RiskConfig, SimulationParameters,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "supply-risk-sim", about = "Supply chain disruption risk and inventory policy simulation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Monte Carlo disruption risk over fitted distributions
    Risk(RiskArgs),
    /// Sweep an inventory policy over a parameter grid
    Inventory(InventoryArgs),
}

#[derive(Debug, Args)]
struct RiskArgs {
    /// Fitted parameter document (JSON)
    #[arg(long)]
    params: PathBuf,
    #[arg(long, default_value_t = 10_000)]
    runs: usize,
    #[arg(long, default_value_t = 365.0)]
    period: f64,
    /// Seed for reproducible runs; random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// JSON overrides for variable names, pool size and risk weights
    #[arg(long)]
    config: Option<PathBuf>,
    /// Where to write the per-period total costs
    #[arg(long)]
    costs_csv: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct InventoryArgs {
    /// `sS` or `myopic`
    #[arg(long, default_value = "sS")]
    policy: PolicyKind,
    /// JSON array of grid points, e.g. '[{"s":10,"S":50}]'
    #[arg(long)]
    grid: Option<String>,
    /// Daily demand as `family:p1,p2,...`
    #[arg(long, default_value = "norm:5,2", value_parser = parse_spec)]
    demand: DistributionSpec,
    /// Lead time as `family:p1,...`; overrides --params
    #[arg(long, value_parser = parse_spec)]
    lead_time: Option<DistributionSpec>,
    /// Parameter document to take the lead time distribution from
    #[arg(long)]
    params: Option<PathBuf>,
    #[arg(long, default_value = "shipping_delay_days")]
    lead_time_variable: String,
    #[arg(long, default_value_t = 1_000)]
    runs: usize,
    #[arg(long, default_value_t = 365)]
    period: usize,
    #[arg(long)]
    seed: Option<u64>,
    /// JSON overrides for cost rates and initial inventory
    #[arg(long)]
    config: Option<PathBuf>,
    /// Where to write the experiment table
    #[arg(long)]
    out: Option<PathBuf>,
    /// Where to write a day-by-day trace of one run at the first grid point
    #[arg(long)]
    trace: Option<PathBuf>,
}

fn parse_spec(text: &str) -> Result<DistributionSpec, String> {
    let (family, params) = text
        .split_once(':')
        .ok_or_else(|| format!("expected family:p1,p2,... got '{text}'"))?;
    let parameters = params
        .split(',')
        .filter(|p| !p.trim().is_empty())
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("bad parameter '{p}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DistributionSpec::new(family.trim(), parameters))
}

fn default_grid(policy: PolicyKind) -> Vec<PolicyParameters> {
    match policy {
        PolicyKind::ReorderPoint => vec![
            PolicyParameters::ReorderPoint { s: 10, order_up_to: 50 },
            PolicyParameters::ReorderPoint { s: 20, order_up_to: 70 },
            PolicyParameters::ReorderPoint { s: 30, order_up_to: 100 },
        ],
        PolicyKind::Myopic => vec![
            PolicyParameters::Myopic { target_days: 10.0 },
            PolicyParameters::Myopic { target_days: 20.0 },
            PolicyParameters::Myopic { target_days: 30.0 },
        ],
    }
}

fn run_risk(args: RiskArgs) -> Result<()> {
    // 1. SETUP CONFIGURATION
    let config: RiskConfig = match &args.config {
        Some(path) => load_config(path)?,
        None => RiskConfig::default(),
    };
    let sim = DisruptionSimulator::from_path(&args.params, config)
        .with_context(|| format!("loading {}", args.params.display()))?;

    // 2. RUN SIMULATION
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, runs = args.runs, period = args.period, "running disruption simulation");
    let result = sim.run_seeded(args.runs, args.period, seed)?;

    // 3. REPORT
    println!("\n=== Simulation Results ===");
    println!("Average Total Cost per Period: {:.2}", result.avg_total_cost);
    println!("Average Number of Disruptions per Period: {:.2}", result.avg_num_disruptions);
    println!("Average Delay per Disruption: {:.2} days", result.avg_average_delay);
    println!("Supply Chain Risk Index: {:.2}", result.risk_index);
    if let Some(p95) = result.cost_quantile(0.95) {
        println!("95th Percentile Period Cost: {:.2}", p95);
    }

    if let Some(path) = &args.costs_csv {
        reporting::export(path, |f| reporting::write_cost_samples(f, &result))?;
    }
    Ok(())
}

fn run_inventory(args: InventoryArgs) -> Result<()> {
    // 1. SETUP CONFIGURATION
    let config: InventoryConfig = match &args.config {
        Some(path) => load_config(path)?,
        None => InventoryConfig::default(),
    };
    let lead_time = match (&args.lead_time, &args.params) {
        (Some(spec), _) => spec.clone(),
        (None, Some(path)) => SimulationParameters::load(path)?
            .distribution(&args.lead_time_variable)?
            .clone(),
        (None, None) => DistributionSpec::new("norm", vec![3.0, 1.0]),
    };
    let grid = match &args.grid {
        Some(json) => serde_json::from_str(json).context("parsing --grid")?,
        None => default_grid(args.policy),
    };
    let sim = InventorySimulation::new(&args.demand, &lead_time, config)?;

    // 2. RUN EXPERIMENTS
    let seed = args.seed.unwrap_or_else(rand::random);
    println!("\n--- Running {} Policy Experiments ---", args.policy);
    let results = run_experiment_seeded(&sim, args.policy, &grid, args.runs, args.period, seed)?;
    for r in &results {
        println!(
            "{:<8} {:<20} avg cost {:>12.2}  std dev {:>10.2}",
            r.policy.as_str(),
            r.parameters.to_string(),
            r.avg_total_cost,
            r.std_dev_cost
        );
    }

    // 3. EXPORT RESULTS
    if let Some(path) = &args.out {
        reporting::export(path, |f| reporting::write_experiment_results(f, &results))?;
    }
    if let (Some(path), Some(first)) = (&args.trace, grid.first()) {
        let policy = first.build();
        let mut stream = rng::seeded(seed);
        let (_, history) = sim.run_traced(policy.as_ref(), args.period, &mut stream);
        reporting::export(path, |f| reporting::write_day_trace(f, &history))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        Command::Risk(args) => run_risk(args),
        Command::Inventory(args) => run_inventory(args),
    }
}
