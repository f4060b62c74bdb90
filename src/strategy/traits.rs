// src/strategy/traits.rs

use std::fmt::Debug;

/// What a policy may look at besides the inventory position.
#[derive(Debug, Clone, Default)]
pub struct PolicyContext {
    /// Mean of the daily demand distribution; infinite for heavy-tailed demand.
    pub mean_daily_demand: f64,
}

/// Decides how much to reorder at the end of each simulated day.
///
/// We require `Send` + `Sync` so one policy can be shared by runs on
/// different workers.
pub trait ReplenishmentPolicy: Debug + Send + Sync {
    /// Short identifier used in experiment tables.
    fn name(&self) -> &'static str;

    /// Quantity to order given the current inventory position. Zero or less
    /// means no order.
    fn order_quantity(&self, inventory_position: i64, context: &PolicyContext) -> i64;
}
