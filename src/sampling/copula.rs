// src/sampling/copula.rs

//! Dependent sampling through a Gaussian or Student-t copula.
//!
//! Correlated latent draws are pushed through the copula's own CDF to get
//! uniform pseudo-observations, then through each variable's marginal
//! inverse CDF to land back on that variable's native scale.

use crate::error::{Result, SimError};
use crate::model::distribution::Marginal;
use crate::model::parameters::{CopulaSpec, CopulaType, SimulationParameters};
use crate::sampling::marginal::clamp_non_negative;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, Gamma, StandardNormal};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use std::fmt;
use tracing::{debug, warn};

const UNIT_DIAGONAL_TOLERANCE: f64 = 1e-9;
const SYMMETRY_TOLERANCE: f64 = 1e-9;
const PSD_TOLERANCE: f64 = 1e-8;
/// Keeps pseudo-observations off 0 and 1 so unbounded quantiles stay finite.
const UNIFORM_EPSILON: f64 = 1e-15;

/// Column-per-variable table of jointly drawn samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    variables: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl SampleTable {
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn column(&self, variable: &str) -> Option<&[f64]> {
        self.variables
            .iter()
            .position(|v| v == variable)
            .map(|i| self.columns[i].as_slice())
    }
}

/// Why dependent sampling cannot be offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// No copula block, or one of type `none`.
    NotConfigured,
    /// A Student-t copula was requested but this build carries no Student-t sampler.
    StudentTDisabled,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::NotConfigured => f.write_str("no copula configured"),
            UnavailableReason::StudentTDisabled => {
                f.write_str("student_t copula support is not compiled in")
            }
        }
    }
}

/// Result of asking whether dependent sampling is possible.
///
/// Callers pick dependent or independent sampling by matching on this.
#[derive(Debug, Clone)]
pub enum CopulaCapability {
    Available(CopulaEngine),
    Unavailable(UnavailableReason),
}

impl CopulaCapability {
    /// Inspects the parameter store and builds an engine if one can be offered.
    ///
    /// A malformed copula block (bad matrix, missing marginals) is an error;
    /// an absent or unsupported one is `Unavailable`.
    pub fn query(params: &SimulationParameters, non_negative: &[String]) -> Result<Self> {
        let Some(spec) = params.active_copula() else {
            return Ok(CopulaCapability::Unavailable(UnavailableReason::NotConfigured));
        };
        if spec.kind == CopulaType::StudentT && !cfg!(feature = "student-t") {
            return Ok(CopulaCapability::Unavailable(
                UnavailableReason::StudentTDisabled,
            ));
        }
        CopulaEngine::from_spec(spec, params, non_negative).map(CopulaCapability::Available)
    }

    pub fn engine(&self) -> Option<&CopulaEngine> {
        match self {
            CopulaCapability::Available(engine) => Some(engine),
            CopulaCapability::Unavailable(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Dependence {
    Gaussian {
        law: Normal,
    },
    StudentT {
        /// Gamma(df/2, 2/df); its reciprocal is the inverse-gamma mixing weight.
        mixing: Gamma<f64>,
        law: StudentsT,
    },
}

/// A ready-to-sample copula over a fixed, ordered set of variables.
#[derive(Debug, Clone)]
pub struct CopulaEngine {
    variables: Vec<String>,
    marginals: Vec<Marginal>,
    clamp: Vec<bool>,
    /// `A` with `A * A^T` equal to the correlation matrix.
    factor: DMatrix<f64>,
    dependence: Dependence,
}

impl CopulaEngine {
    pub fn from_spec(
        spec: &CopulaSpec,
        params: &SimulationParameters,
        non_negative: &[String],
    ) -> Result<Self> {
        let dim = spec.variables.len();
        if dim < 2 {
            return Err(SimError::InvalidCopula(format!(
                "need at least 2 variables, got {dim}"
            )));
        }
        let factor = factorize(spec.correlation_matrix(), dim)?;

        let dependence = match spec.kind {
            CopulaType::Gaussian => Dependence::Gaussian {
                law: Normal::new(0.0, 1.0).map_err(|e| SimError::InvalidCopula(e.to_string()))?,
            },
            CopulaType::StudentT => {
                let df = spec
                    .degrees_of_freedom()
                    .filter(|df| df.is_finite() && *df > 0.0)
                    .ok_or_else(|| {
                        SimError::InvalidCopula(
                            "student_t copula needs positive degrees_of_freedom".to_string(),
                        )
                    })?;
                Dependence::StudentT {
                    mixing: Gamma::new(df / 2.0, 2.0 / df)
                        .map_err(|e| SimError::InvalidCopula(e.to_string()))?,
                    law: StudentsT::new(0.0, 1.0, df)
                        .map_err(|e| SimError::InvalidCopula(e.to_string()))?,
                }
            }
            CopulaType::None => {
                return Err(SimError::InvalidCopula(
                    "copula of type none has no engine".to_string(),
                ))
            }
        };

        let marginals = spec
            .variables
            .iter()
            .map(|name| params.marginal(name))
            .collect::<Result<Vec<_>>>()?;
        let clamp = spec
            .variables
            .iter()
            .map(|name| non_negative.iter().any(|v| v == name))
            .collect();

        debug!(variables = ?spec.variables, kind = ?spec.kind, "copula engine ready");
        Ok(Self {
            variables: spec.variables.clone(),
            marginals,
            clamp,
            factor,
            dependence,
        })
    }

    /// Draws `count` joint samples, one column per copula variable.
    pub fn sample_dependent<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> SampleTable {
        let dim = self.variables.len();
        let mut columns = vec![Vec::with_capacity(count); dim];

        for _ in 0..count {
            let mut z = Vec::with_capacity(dim);
            for _ in 0..dim {
                let draw: f64 = StandardNormal.sample(rng);
                z.push(draw);
            }
            let mut latent = &self.factor * DVector::from_vec(z);

            let uniforms: Vec<f64> = match &self.dependence {
                Dependence::Gaussian { law } => latent.iter().map(|&x| law.cdf(x)).collect(),
                Dependence::StudentT { mixing, law } => {
                    let weight = 1.0 / mixing.sample(rng);
                    latent *= weight.sqrt();
                    latent.iter().map(|&x| law.cdf(x)).collect()
                }
            };

            for (i, u) in uniforms.into_iter().enumerate() {
                let u = u.clamp(UNIFORM_EPSILON, 1.0 - UNIFORM_EPSILON);
                columns[i].push(self.marginals[i].inverse_cdf(u));
            }
        }

        for (column, clamp) in columns.iter_mut().zip(&self.clamp) {
            if *clamp {
                clamp_non_negative(column);
            }
        }

        SampleTable {
            variables: self.variables.clone(),
            columns,
        }
    }
}

/// Draws `count` dependent samples, or `None` when no copula can be used.
///
/// `None` tells the caller to sample the variables independently instead.
pub fn sample_dependent<R: Rng + ?Sized>(
    params: &SimulationParameters,
    non_negative: &[String],
    count: usize,
    rng: &mut R,
) -> Result<Option<SampleTable>> {
    match CopulaCapability::query(params, non_negative)? {
        CopulaCapability::Available(engine) => Ok(Some(engine.sample_dependent(count, rng))),
        CopulaCapability::Unavailable(reason) => {
            if params.active_copula().is_some() {
                warn!(%reason, "copula unavailable, falling back to independent sampling");
            }
            Ok(None)
        }
    }
}

/// Validates a correlation matrix and returns a factor `A` with `A * A^T = matrix`.
///
/// Cholesky is tried first; singular but positive-semi-definite matrices go
/// through a symmetric eigendecomposition instead.
fn factorize(matrix: &[Vec<f64>], dim: usize) -> Result<DMatrix<f64>> {
    if matrix.len() != dim || matrix.iter().any(|row| row.len() != dim) {
        return Err(SimError::InvalidCopula(format!(
            "correlation matrix must be {dim}x{dim}"
        )));
    }
    let m = DMatrix::from_fn(dim, dim, |i, j| matrix[i][j]);

    for i in 0..dim {
        if (m[(i, i)] - 1.0).abs() > UNIT_DIAGONAL_TOLERANCE {
            return Err(SimError::InvalidCopula(format!(
                "diagonal entry {i} is {}, expected 1",
                m[(i, i)]
            )));
        }
        for j in (i + 1)..dim {
            if (m[(i, j)] - m[(j, i)]).abs() > SYMMETRY_TOLERANCE {
                return Err(SimError::InvalidCopula(format!(
                    "matrix is not symmetric at ({i}, {j})"
                )));
            }
        }
    }

    if let Some(cholesky) = m.clone().cholesky() {
        return Ok(cholesky.l());
    }

    let eigen = m.symmetric_eigen();
    if let Some(min) = eigen
        .eigenvalues
        .iter()
        .copied()
        .find(|&l| l < -PSD_TOLERANCE)
    {
        return Err(SimError::InvalidCopula(format!(
            "matrix is not positive semi-definite (eigenvalue {min})"
        )));
    }
    let roots = eigen.eigenvalues.map(|l| l.max(0.0).sqrt());
    Ok(&eigen.eigenvectors * DMatrix::from_diagonal(&roots))
}
