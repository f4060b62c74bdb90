// src/model/parameters.rs

//! The parameter store: fitted marginals plus an optional copula, loaded from JSON.

use crate::error::{Result, SimError};
use crate::model::distribution::{DistributionSpec, Marginal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopulaType {
    Gaussian,
    StudentT,
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CopulaParameters {
    #[serde(default)]
    pub correlation_matrix: Vec<Vec<f64>>,
    #[serde(default, alias = "df", skip_serializing_if = "Option::is_none")]
    pub degrees_of_freedom: Option<f64>,
}

/// Dependency structure coupling some of the variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopulaSpec {
    #[serde(rename = "type")]
    pub kind: CopulaType,
    pub variables: Vec<String>,
    #[serde(default)]
    pub parameters: CopulaParameters,
}

impl CopulaSpec {
    pub fn correlation_matrix(&self) -> &[Vec<f64>] {
        &self.parameters.correlation_matrix
    }

    pub fn degrees_of_freedom(&self) -> Option<f64> {
        self.parameters.degrees_of_freedom
    }
}

/// Every fitted distribution, keyed by variable name, and the optional copula.
///
/// Read-only once loaded; share it by reference between simulators and runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copula: Option<CopulaSpec>,
    #[serde(flatten)]
    pub variables: BTreeMap<String, DistributionSpec>,
}

impl SimulationParameters {
    /// Loads the parameter document at `path`.
    ///
    /// Family names and parameter counts are not checked here; they are
    /// validated the first time a variable is sampled.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SimError::ConfigNotFound {
                path: path.to_path_buf(),
            },
            _ => SimError::ConfigMalformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;
        Self::parse(&text, path)
    }

    /// Parses a parameter document held in memory.
    pub fn from_json(text: &str) -> Result<Self> {
        Self::parse(text, Path::new("<inline>"))
    }

    fn parse(text: &str, origin: &Path) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| SimError::ConfigMalformed {
            path: PathBuf::from(origin),
            reason: e.to_string(),
        })
    }

    pub fn with_variable(mut self, name: impl Into<String>, spec: DistributionSpec) -> Self {
        self.variables.insert(name.into(), spec);
        self
    }

    pub fn with_copula(mut self, copula: CopulaSpec) -> Self {
        self.copula = Some(copula);
        self
    }

    pub fn distribution(&self, name: &str) -> Result<&DistributionSpec> {
        self.variables
            .get(name)
            .ok_or_else(|| SimError::UnknownVariable(name.to_string()))
    }

    /// Looks up and resolves the marginal for `name`.
    pub fn marginal(&self, name: &str) -> Result<Marginal> {
        self.distribution(name)?.evaluate()
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// The copula block, if one is present and not of type `none`.
    pub fn active_copula(&self) -> Option<&CopulaSpec> {
        self.copula
            .as_ref()
            .filter(|c| c.kind != CopulaType::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOCUMENT: &str = r#"{
        "inter_arrival_time": {"distribution": "expon", "parameters": [0.0, 12.5]},
        "shipping_delay_days": {"distribution": "weibull_min", "parameters": [1.4, 0.0, 3.2]},
        "order_profit_per_order": {"distribution": "norm", "parameters": [20.0, 55.0]},
        "copula": {
            "type": "student_t",
            "variables": ["order_profit_per_order", "shipping_delay_days"],
            "parameters": {"correlation_matrix": [[1.0, -0.4], [-0.4, 1.0]], "df": 4}
        }
    }"#;

    #[test]
    fn document_round_trips_every_variable() {
        let params = SimulationParameters::from_json(DOCUMENT).unwrap();
        let names: Vec<&str> = params.variable_names().collect();
        assert_eq!(
            names,
            vec!["inter_arrival_time", "order_profit_per_order", "shipping_delay_days"]
        );

        let delay = params.distribution("shipping_delay_days").unwrap();
        assert_eq!(delay.distribution, "weibull_min");
        assert_eq!(delay.parameters, vec![1.4, 0.0, 3.2]);

        let copula = params.active_copula().unwrap();
        assert_eq!(copula.kind, CopulaType::StudentT);
        assert_eq!(copula.degrees_of_freedom(), Some(4.0));
        assert_eq!(copula.correlation_matrix()[0][1], -0.4);
    }

    #[test]
    fn unknown_family_loads_but_fails_on_use() {
        let params = SimulationParameters::from_json(
            r#"{"x": {"distribution": "cauchy", "parameters": [0.0, 1.0]}}"#,
        )
        .unwrap();
        assert!(matches!(
            params.marginal("x"),
            Err(SimError::UnsupportedDistribution(_))
        ));
    }

    #[test]
    fn missing_variable_is_reported_by_name() {
        let params = SimulationParameters::default();
        assert!(matches!(
            params.distribution("lead_time"),
            Err(SimError::UnknownVariable(name)) if name == "lead_time"
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = SimulationParameters::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SimError::ConfigNotFound { .. }));
    }

    #[test]
    fn broken_json_is_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"inter_arrival_time\": [1, 2").unwrap();
        let err = SimulationParameters::load(file.path()).unwrap_err();
        assert!(matches!(err, SimError::ConfigMalformed { .. }));
    }

    #[test]
    fn copula_of_type_none_is_inactive() {
        let params = SimulationParameters::from_json(
            r#"{"copula": {"type": "none", "variables": []}}"#,
        )
        .unwrap();
        assert!(params.copula.is_some());
        assert!(params.active_copula().is_none());
    }
}
