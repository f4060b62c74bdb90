// src/simulation/experiment.rs

//! Parameter sweeps: many inventory runs per grid point, summarised by cost.

use crate::error::{Result, SimError};
use crate::rng;
use crate::simulation::engine::{CostBreakdown, InventorySimulation};
use crate::strategy::implementations::{PolicyKind, PolicyParameters};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

/// Cost summary for one grid point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentResult {
    pub policy: PolicyKind,
    pub parameters: PolicyParameters,
    pub avg_total_cost: f64,
    /// Population standard deviation of the per-run total cost.
    pub std_dev_cost: f64,
    pub avg_holding_cost: f64,
    pub avg_shortage_cost: f64,
    pub avg_ordering_cost: f64,
}

/// Runs every grid point `num_runs` times from one shared stream.
///
/// Results come back in grid order.
pub fn run_experiment<R: Rng + ?Sized>(
    sim: &InventorySimulation,
    policy: PolicyKind,
    grid: &[PolicyParameters],
    num_runs: usize,
    period_days: usize,
    rng: &mut R,
) -> Result<Vec<ExperimentResult>> {
    check_grid(policy, grid, num_runs)?;
    let mut results = Vec::with_capacity(grid.len());
    for params in grid {
        let built = params.build();
        debug!(policy = built.name(), %params, num_runs, "sweeping grid point");
        let mut runs = Vec::with_capacity(num_runs);
        for _ in 0..num_runs {
            runs.push(sim.run(built.as_ref(), period_days, &mut *rng));
        }
        results.push(summarize(policy, *params, &runs));
    }
    info!(%policy, grid_points = grid.len(), num_runs, "experiment complete");
    Ok(results)
}

/// Like [`run_experiment`], but every run gets its own sub-stream of `seed`,
/// keyed by grid position and run index.
pub fn run_experiment_seeded(
    sim: &InventorySimulation,
    policy: PolicyKind,
    grid: &[PolicyParameters],
    num_runs: usize,
    period_days: usize,
    seed: u64,
) -> Result<Vec<ExperimentResult>> {
    check_grid(policy, grid, num_runs)?;
    let results = grid
        .iter()
        .enumerate()
        .map(|(g, params)| {
            let built = params.build();
            debug!(policy = built.name(), %params, num_runs, "sweeping grid point");
            let runs: Vec<CostBreakdown> = (0..num_runs)
                .map(|i| {
                    let mut stream = rng::run_stream(seed, (g * num_runs + i) as u64);
                    sim.run(built.as_ref(), period_days, &mut stream)
                })
                .collect();
            summarize(policy, *params, &runs)
        })
        .collect();
    info!(%policy, grid_points = grid.len(), num_runs, seed, "experiment complete");
    Ok(results)
}

fn check_grid(policy: PolicyKind, grid: &[PolicyParameters], num_runs: usize) -> Result<()> {
    if num_runs == 0 {
        return Err(SimError::InvalidArgument("num_runs must be at least 1".to_string()));
    }
    if let Some(bad) = grid.iter().find(|p| p.kind() != policy) {
        return Err(SimError::InvalidArgument(format!(
            "grid point {bad} does not belong to policy {policy}"
        )));
    }
    Ok(())
}

fn summarize(policy: PolicyKind, parameters: PolicyParameters, runs: &[CostBreakdown]) -> ExperimentResult {
    let n = runs.len() as f64;
    let mean = |f: fn(&CostBreakdown) -> f64| runs.iter().map(f).sum::<f64>() / n;

    let avg_total_cost = mean(|r| r.total);
    let variance = runs
        .iter()
        .map(|r| (r.total - avg_total_cost).powi(2))
        .sum::<f64>()
        / n;

    let result = ExperimentResult {
        policy,
        parameters,
        avg_total_cost,
        std_dev_cost: variance.sqrt(),
        avg_holding_cost: mean(|r| r.holding),
        avg_shortage_cost: mean(|r| r.shortage),
        avg_ordering_cost: mean(|r| r.ordering),
    };
    debug!(%parameters, avg = result.avg_total_cost, std = result.std_dev_cost, "grid point done");
    result
}
