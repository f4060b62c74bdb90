//! Integration tests for the disruption risk simulator
//!
//! Tests cover:
//! - Renewal-process event counts against the Poisson expectation
//! - Non-negativity of costs and delays
//! - The risk index formula and configurable weights
//! - Copula-driven and fallback sampling paths

use proptest::prelude::*;
use supply_risk_sim::sampling::copula::{CopulaCapability, UnavailableReason};
use supply_risk_sim::{
    rng, AggregateRiskResult, DisruptionSimulator, RiskConfig, RiskWeights, SimulationParameters,
    SimulationRunResult,
};

fn poisson_document(rate: f64) -> String {
    format!(
        r#"{{
            "inter_arrival_time": {{"distribution": "expon", "parameters": [0.0, {}]}},
            "order_profit_per_order": {{"distribution": "norm", "parameters": [10.0, 40.0]}},
            "shipping_delay_days": {{"distribution": "norm", "parameters": [2.0, 3.0]}}
        }}"#,
        1.0 / rate
    )
}

#[test]
fn test_event_count_matches_rate_times_horizon() {
    let rate = 0.05;
    let params = SimulationParameters::from_json(&poisson_document(rate)).unwrap();
    let sim = DisruptionSimulator::new(params, RiskConfig::default()).unwrap();
    let result = sim.run_seeded(2_000, 365.0, 2024).unwrap();

    let expected = rate * 365.0;
    assert!(
        (result.avg_num_disruptions - expected).abs() < 0.5,
        "expected ~{expected}, got {}",
        result.avg_num_disruptions
    );
    assert_eq!(result.truncated_runs, 0);
}

#[test]
fn test_costs_and_delays_are_never_negative() {
    let params = SimulationParameters::from_json(&poisson_document(0.1)).unwrap();
    let sim = DisruptionSimulator::new(params, RiskConfig::default()).unwrap();
    let copula = CopulaCapability::query(sim.params(), &sim.config().copula_non_negative).unwrap();
    let mut stream = rng::seeded(5);

    let mut saw_loss = false;
    for _ in 0..300 {
        let (run, _) = sim.simulate_period(365.0, &copula, &mut stream).unwrap();
        assert!(run.total_cost >= 0.0);
        assert!(run.average_delay >= 0.0);
        saw_loss |= run.total_cost > 0.0;
        if run.num_disruptions == 0 {
            assert_eq!(run, SimulationRunResult::default());
        }
    }
    assert!(saw_loss, "normal(10, 40) profits should produce some losses");
}

#[test]
fn test_risk_index_uses_configured_weights() {
    let params = SimulationParameters::from_json(&poisson_document(0.05)).unwrap();
    let config = RiskConfig {
        weights: RiskWeights {
            cost_divisor: 250.0,
            delay_weight: 1.0,
            disruption_weight: 0.0,
        },
        ..RiskConfig::default()
    };
    let sim = DisruptionSimulator::new(params, config).unwrap();
    let r = sim.run_seeded(200, 365.0, 1).unwrap();
    assert_eq!(r.risk_index, r.avg_total_cost / 250.0 + r.avg_average_delay * 1.0 + r.avg_num_disruptions * 0.0);
}

#[test]
fn test_raw_costs_have_one_entry_per_run() {
    let params = SimulationParameters::from_json(&poisson_document(0.02)).unwrap();
    let sim = DisruptionSimulator::new(params, RiskConfig::default()).unwrap();
    let mut stream = rng::seeded(3);
    let r = sim.run(137, 365.0, &mut stream).unwrap();
    assert_eq!(r.raw_cost_samples.len(), 137);
    let mean = r.raw_cost_samples.iter().sum::<f64>() / 137.0;
    assert!((mean - r.avg_total_cost).abs() < 1e-9);
}

#[test]
fn test_student_t_copula_runs_end_to_end() {
    let doc = r#"{
        "inter_arrival_time": {"distribution": "expon", "parameters": [0.0, 15.0]},
        "order_profit_per_order": {"distribution": "norm", "parameters": [-5.0, 30.0]},
        "shipping_delay_days": {"distribution": "lognorm", "parameters": [0.6, 0.0, 2.5]},
        "copula": {
            "type": "student_t",
            "variables": ["order_profit_per_order", "shipping_delay_days"],
            "parameters": {"correlation_matrix": [[1.0, -0.5], [-0.5, 1.0]], "degrees_of_freedom": 4}
        }
    }"#;
    let params = SimulationParameters::from_json(doc).unwrap();
    let sim = DisruptionSimulator::new(params, RiskConfig::default()).unwrap();

    let capability = CopulaCapability::query(sim.params(), &sim.config().copula_non_negative).unwrap();
    if cfg!(feature = "student-t") {
        assert!(capability.engine().is_some());
    } else {
        assert!(matches!(
            capability,
            CopulaCapability::Unavailable(UnavailableReason::StudentTDisabled)
        ));
    }

    let a = sim.run_seeded(300, 365.0, 11).unwrap();
    let b = sim.run_seeded(300, 365.0, 11).unwrap();
    assert_eq!(a, b);
    assert!(a.avg_average_delay > 0.0);
    assert!(a.avg_num_disruptions > 20.0 && a.avg_num_disruptions < 29.0);
}

proptest! {
    #[test]
    fn risk_index_is_exactly_linear(
        costs in prop::collection::vec((0.0f64..1e6, 0usize..100, 0.0f64..50.0), 1..40)
    ) {
        let runs: Vec<SimulationRunResult> = costs
            .into_iter()
            .map(|(total_cost, num_disruptions, average_delay)| SimulationRunResult {
                total_cost,
                num_disruptions,
                average_delay,
            })
            .collect();
        let r = AggregateRiskResult::from_runs(&runs, &RiskWeights::default(), 0);
        prop_assert_eq!(
            r.risk_index,
            r.avg_total_cost / 1000.0 + r.avg_average_delay * 10.0 + r.avg_num_disruptions * 5.0
        );
        prop_assert_eq!(r.raw_cost_samples.len(), runs.len());
    }
}
