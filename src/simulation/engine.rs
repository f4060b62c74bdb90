// src/simulation/engine.rs

use crate::error::Result;
use crate::model::distribution::{DistributionSpec, Marginal};
use crate::model::inventory::InventoryState;
use crate::simulation::config::InventoryConfig;
use crate::strategy::traits::{PolicyContext, ReplenishmentPolicy};
use rand::Rng;
use serde::Serialize;

// We make this Serialize so we can write it to CSV later
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRecord {
    pub day: usize,
    pub received: i64,
    /// Level after the morning delivery, before demand. Drives the day's cost.
    pub opening_level: i64,
    pub holding_cost: f64,
    pub shortage_cost: f64,
    pub demand: i64,
    pub closing_level: i64,
    pub inventory_position: i64,
    pub order_qty: i64,
    pub lead_time: Option<usize>,
}

/// Accumulated costs of one policy run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CostBreakdown {
    pub holding: f64,
    pub shortage: f64,
    pub ordering: f64,
    pub total: f64,
}

/// Day-stepped inventory simulation under stochastic demand and lead time.
#[derive(Debug, Clone)]
pub struct InventorySimulation {
    config: InventoryConfig,
    demand: Marginal,
    lead_time: Marginal,
}

impl InventorySimulation {
    pub fn new(demand: &DistributionSpec, lead_time: &DistributionSpec, config: InventoryConfig) -> Result<Self> {
        Ok(Self {
            config,
            demand: demand.evaluate()?,
            lead_time: lead_time.evaluate()?,
        })
    }

    pub fn mean_daily_demand(&self) -> f64 {
        self.demand.mean()
    }

    /// Runs one fresh policy run of `period_days` days.
    pub fn run<R: Rng + ?Sized>(
        &self,
        policy: &dyn ReplenishmentPolicy,
        period_days: usize,
        rng: &mut R,
    ) -> CostBreakdown {
        self.simulate(policy, period_days, rng, None)
    }

    /// Like [`run`](Self::run), also returning what happened on every day.
    pub fn run_traced<R: Rng + ?Sized>(
        &self,
        policy: &dyn ReplenishmentPolicy,
        period_days: usize,
        rng: &mut R,
    ) -> (CostBreakdown, Vec<DayRecord>) {
        let mut history = Vec::with_capacity(period_days);
        let costs = self.simulate(policy, period_days, rng, Some(&mut history));
        (costs, history)
    }

    fn simulate<R: Rng + ?Sized>(
        &self,
        policy: &dyn ReplenishmentPolicy,
        period_days: usize,
        rng: &mut R,
        mut history: Option<&mut Vec<DayRecord>>,
    ) -> CostBreakdown {
        let mut state = InventoryState::new(self.config.initial_inventory);
        let mut costs = CostBreakdown::default();
        let context = PolicyContext {
            mean_daily_demand: self.mean_daily_demand(),
        };

        for day in 0..period_days {
            // 1. Morning deliveries
            let received = state.receive(day);
            let opening_level = state.inventory_level;

            // 2. Exactly one of holding or shortage accrues
            let (holding, shortage) = if opening_level > 0 {
                (opening_level as f64 * self.config.holding_cost, 0.0)
            } else {
                (0.0, opening_level.unsigned_abs() as f64 * self.config.shortage_cost)
            };
            costs.holding += holding;
            costs.shortage += shortage;

            // 3. Demand, floored to a non-negative integer
            let demand = floor_non_negative(self.demand.sample(rng));
            state.fulfil(demand);

            // 4. Position includes everything still in the pipeline
            let position = state.refresh_position();

            // 5. Policy decision
            let order_qty = policy.order_quantity(position, &context);

            // 6. Place the order; lead time draws past the horizon saturate
            let mut lead_time = None;
            if order_qty > 0 {
                costs.ordering += self.config.order_cost;
                let lt = floor_at_least_one(self.lead_time.sample(rng));
                state.schedule(day.saturating_add(lt), order_qty);
                lead_time = Some(lt);
            }

            if let Some(history) = history.as_mut() {
                history.push(DayRecord {
                    day,
                    received,
                    opening_level,
                    holding_cost: holding,
                    shortage_cost: shortage,
                    demand,
                    closing_level: state.inventory_level,
                    inventory_position: position,
                    order_qty: order_qty.max(0),
                    lead_time,
                });
            }
        }

        costs.total = costs.holding + costs.shortage + costs.ordering;
        costs
    }
}

/// Truncates toward zero and clamps negatives to 0.
fn floor_non_negative(x: f64) -> i64 {
    if x.is_nan() || x < 0.0 {
        0
    } else {
        x.trunc() as i64
    }
}

/// Truncates toward zero, never returning less than one day.
fn floor_at_least_one(x: f64) -> usize {
    if x.is_nan() || x < 1.0 {
        1
    } else {
        x.trunc() as usize
    }
}
