// src/model/inventory.rs

use std::collections::BTreeMap;

/// On-hand stock and the replenishment pipeline for one policy run.
///
/// Levels are signed: a negative `inventory_level` is a backorder. All
/// arithmetic saturates at the `i64` bounds, which heavy-tailed demand or an
/// infinite myopic target can reach.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryState {
    pub inventory_level: i64,
    pub inventory_position: i64,
    /// Arrival day -> quantity arriving that morning.
    pub pending_orders: BTreeMap<usize, i64>,
}

impl InventoryState {
    pub fn new(initial_inventory: i64) -> Self {
        Self {
            inventory_level: initial_inventory,
            inventory_position: initial_inventory,
            pending_orders: BTreeMap::new(),
        }
    }

    /// Takes delivery of whatever was scheduled to land on `day`.
    ///
    /// Returns the quantity received (0 if nothing was due).
    pub fn receive(&mut self, day: usize) -> i64 {
        let arrived = self.pending_orders.remove(&day).unwrap_or(0);
        self.inventory_level = self.inventory_level.saturating_add(arrived);
        arrived
    }

    /// Removes demand from stock; unmet demand becomes backorder.
    pub fn fulfil(&mut self, demand: i64) {
        self.inventory_level = self.inventory_level.saturating_sub(demand);
    }

    /// Total quantity ordered but not yet arrived.
    pub fn on_order(&self) -> i64 {
        self.pending_orders
            .values()
            .fold(0i64, |acc, &q| acc.saturating_add(q))
    }

    pub fn refresh_position(&mut self) -> i64 {
        self.inventory_position = self.inventory_level.saturating_add(self.on_order());
        self.inventory_position
    }

    /// Adds `quantity` to whatever already arrives on `arrival_day`.
    pub fn schedule(&mut self, arrival_day: usize, quantity: i64) {
        let pending = self.pending_orders.entry(arrival_day).or_insert(0);
        *pending = pending.saturating_add(quantity);
    }
}
