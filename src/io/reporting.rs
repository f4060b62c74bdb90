// src/io/reporting.rs

use crate::error::Result;
use crate::simulation::disruption::AggregateRiskResult;
use crate::simulation::engine::DayRecord;
use crate::simulation::experiment::ExperimentResult;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Flat CSV row for one grid point; the parameters are rendered as text.
#[derive(Debug, Clone, Serialize)]
struct ExperimentRow<'a> {
    policy: &'a str,
    parameters: String,
    avg_total_cost: f64,
    std_dev_cost: f64,
    avg_holding_cost: f64,
    avg_shortage_cost: f64,
    avg_ordering_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
struct CostSampleRow {
    run: usize,
    total_cost: f64,
}

/// Serializes each record as one CSV row into `writer`.
fn write_rows<W: Write, T: Serialize>(writer: W, rows: impl IntoIterator<Item = T>) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut count = 0;
    for row in rows {
        wtr.serialize(row)?;
        count += 1;
    }
    // Flush the buffer to ensure all data is written
    wtr.flush()?;
    Ok(count)
}

/// Writes the per-day trace of one inventory run.
pub fn write_day_trace<W: Write>(writer: W, history: &[DayRecord]) -> Result<usize> {
    write_rows(writer, history)
}

/// Writes the experiment table, one row per grid point in grid order.
pub fn write_experiment_results<W: Write>(writer: W, results: &[ExperimentResult]) -> Result<usize> {
    write_rows(
        writer,
        results.iter().map(|r| ExperimentRow {
            policy: r.policy.as_str(),
            parameters: r.parameters.to_string(),
            avg_total_cost: r.avg_total_cost,
            std_dev_cost: r.std_dev_cost,
            avg_holding_cost: r.avg_holding_cost,
            avg_shortage_cost: r.avg_shortage_cost,
            avg_ordering_cost: r.avg_ordering_cost,
        }),
    )
}

/// Writes the simulated total cost of every period, for distribution plots.
pub fn write_cost_samples<W: Write>(writer: W, result: &AggregateRiskResult) -> Result<usize> {
    write_rows(
        writer,
        result
            .raw_cost_samples
            .iter()
            .enumerate()
            .map(|(run, &total_cost)| CostSampleRow { run, total_cost }),
    )
}

/// Creates `path` and hands it to one of the writers above.
pub fn export<F>(path: impl AsRef<Path>, write: F) -> Result<()>
where
    F: FnOnce(File) -> Result<usize>,
{
    let path = path.as_ref();
    let rows = write(File::create(path)?)?;
    info!(rows, path = %path.display(), "exported csv");
    Ok(())
}
