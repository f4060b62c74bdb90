// src/strategy/implementations.rs

use crate::error::SimError;
use crate::strategy::traits::{PolicyContext, ReplenishmentPolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =========================================================================
// 1. (s, S) Policy
// =========================================================================

/// Reorder up to `S` whenever the inventory position falls to `s` or below.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReorderPointPolicy {
    reorder_point: i64,
    order_up_to: i64,
}

impl ReorderPointPolicy {
    pub fn new(reorder_point: i64, order_up_to: i64) -> Self {
        Self {
            reorder_point,
            order_up_to,
        }
    }
}

impl ReplenishmentPolicy for ReorderPointPolicy {
    fn name(&self) -> &'static str {
        PolicyKind::ReorderPoint.as_str()
    }

    fn order_quantity(&self, inventory_position: i64, _context: &PolicyContext) -> i64 {
        if inventory_position <= self.reorder_point {
            self.order_up_to.saturating_sub(inventory_position)
        } else {
            0
        }
    }
}

// =========================================================================
// 2. Myopic Policy
// =========================================================================

/// Keeps a fixed cover of `target_days` of mean demand.
///
/// When the position drops below the target, a full target's worth is
/// ordered regardless of the gap. The target is not a rolling average of
/// observed demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MyopicPolicy {
    target_days: f64,
}

impl MyopicPolicy {
    pub fn new(target_days: f64) -> Self {
        Self { target_days }
    }

    pub fn target(&self, mean_daily_demand: f64) -> i64 {
        (mean_daily_demand * self.target_days).round() as i64
    }
}

impl ReplenishmentPolicy for MyopicPolicy {
    fn name(&self) -> &'static str {
        PolicyKind::Myopic.as_str()
    }

    fn order_quantity(&self, inventory_position: i64, context: &PolicyContext) -> i64 {
        let target = self.target(context.mean_daily_demand);
        if inventory_position < target {
            target
        } else {
            0
        }
    }
}

// =========================================================================
// Parameters and kinds, as they appear in experiment grids
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    #[serde(rename = "sS")]
    ReorderPoint,
    #[serde(rename = "myopic")]
    Myopic,
}

impl PolicyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::ReorderPoint => "sS",
            PolicyKind::Myopic => "myopic",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sS" | "ss" | "s_S" => Ok(PolicyKind::ReorderPoint),
            "myopic" => Ok(PolicyKind::Myopic),
            other => Err(SimError::InvalidArgument(format!("unknown policy '{other}'"))),
        }
    }
}

/// One grid point: the parameters of a single policy configuration.
///
/// Serialised untagged so grids read naturally, e.g. `{"s": 10, "S": 50}`
/// or `{"target_days": 30}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicyParameters {
    ReorderPoint {
        s: i64,
        #[serde(rename = "S")]
        order_up_to: i64,
    },
    Myopic {
        target_days: f64,
    },
}

impl PolicyParameters {
    pub fn kind(&self) -> PolicyKind {
        match self {
            PolicyParameters::ReorderPoint { .. } => PolicyKind::ReorderPoint,
            PolicyParameters::Myopic { .. } => PolicyKind::Myopic,
        }
    }

    pub fn build(&self) -> Box<dyn ReplenishmentPolicy> {
        match *self {
            PolicyParameters::ReorderPoint { s, order_up_to } => {
                Box::new(ReorderPointPolicy::new(s, order_up_to))
            }
            PolicyParameters::Myopic { target_days } => Box::new(MyopicPolicy::new(target_days)),
        }
    }
}

impl fmt::Display for PolicyParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyParameters::ReorderPoint { s, order_up_to } => write!(f, "s={s} S={order_up_to}"),
            PolicyParameters::Myopic { target_days } => write!(f, "target_days={target_days}"),
        }
    }
}
