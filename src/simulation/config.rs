// src/simulation/config.rs

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Weights of the composite supply chain risk index:
/// `cost / cost_divisor + delay * delay_weight + disruptions * disruption_weight`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub cost_divisor: f64,
    pub delay_weight: f64,
    pub disruption_weight: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            cost_divisor: 1000.0,
            delay_weight: 10.0,
            disruption_weight: 5.0,
        }
    }
}

impl RiskWeights {
    pub fn risk_index(&self, avg_total_cost: f64, avg_average_delay: f64, avg_num_disruptions: f64) -> f64 {
        (avg_total_cost / self.cost_divisor)
            + (avg_average_delay * self.delay_weight)
            + (avg_num_disruptions * self.disruption_weight)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub inter_arrival_variable: String,
    pub profit_variable: String,
    pub delay_variable: String,
    /// Clamped at zero when sampled independently.
    pub marginal_non_negative: Vec<String>,
    /// Clamped at zero when sampled through the copula.
    pub copula_non_negative: Vec<String>,
    /// Inter-arrival draws per simulated period. Arrivals beyond the pool are
    /// never counted, so this must comfortably exceed the expected event count.
    pub arrival_pool_size: usize,
    pub weights: RiskWeights,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            inter_arrival_variable: "inter_arrival_time".to_string(),
            profit_variable: "order_profit_per_order".to_string(),
            delay_variable: "shipping_delay_days".to_string(),
            marginal_non_negative: vec![
                "inter_arrival_time".to_string(),
                "shipping_delay_days".to_string(),
            ],
            copula_non_negative: vec![
                "shipping_delay_days".to_string(),
                "order_profit_per_order".to_string(),
            ],
            arrival_pool_size: 2000,
            weights: RiskWeights::default(),
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<()> {
        if self.arrival_pool_size == 0 {
            return Err(SimError::InvalidArgument(
                "arrival_pool_size must be at least 1".to_string(),
            ));
        }
        if !(self.weights.cost_divisor.is_finite() && self.weights.cost_divisor != 0.0) {
            return Err(SimError::InvalidArgument(
                "risk cost_divisor must be finite and non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Cost rates and starting stock for the inventory policy engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub holding_cost: f64,
    pub shortage_cost: f64,
    pub order_cost: f64,
    pub initial_inventory: i64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            holding_cost: 1.0,
            shortage_cost: 10.0,
            order_cost: 50.0,
            initial_inventory: 100,
        }
    }
}

/// Reads a JSON override file; absent keys keep their defaults.
pub fn load_config<T: for<'de> Deserialize<'de>>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SimError::ConfigNotFound {
            path: path.to_path_buf(),
        },
        _ => SimError::ConfigMalformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    })?;
    serde_json::from_str(&text).map_err(|e| SimError::ConfigMalformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
