//! Monte Carlo supply chain risk and inventory policy simulation.
//!
//! Two engines share one parameter store of fitted marginal distributions:
//!
//! * [`simulation::disruption::DisruptionSimulator`] counts disruptions with a
//!   renewal process, draws per-event profit and delay (optionally coupled by
//!   a Gaussian or Student-t copula) and rolls everything into a risk index.
//! * [`simulation::engine::InventorySimulation`] steps an inventory through
//!   stochastic daily demand and lead times under a replenishment policy;
//!   [`simulation::experiment`] sweeps policy parameter grids over it.
//!
//! All randomness is passed in explicitly, see [`rng`] for seeded streams.

pub mod error;
pub mod io;
pub mod model;
pub mod rng;
pub mod sampling;
pub mod simulation;
pub mod strategy;

pub use error::{Result, SimError};
pub use model::distribution::{DistributionSpec, Family, Marginal};
pub use model::parameters::{CopulaSpec, CopulaType, SimulationParameters};
pub use simulation::config::{InventoryConfig, RiskConfig, RiskWeights};
pub use simulation::disruption::{AggregateRiskResult, DisruptionSimulator, SimulationRunResult};
pub use simulation::engine::{CostBreakdown, DayRecord, InventorySimulation};
pub use simulation::experiment::{run_experiment, run_experiment_seeded, ExperimentResult};
pub use strategy::implementations::{PolicyKind, PolicyParameters};
