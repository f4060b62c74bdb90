// src/model/distribution.rs

use crate::error::{Result, SimError};
use rand::Rng;
use rand_distr::{Distribution, Exp1, StandardNormal};
use serde::{Deserialize, Serialize};
use statrs::distribution::{
    ContinuousCDF, Exp as ExpLaw, Normal as NormalLaw, Pareto as ParetoLaw,
    Weibull as WeibullLaw,
};
use statrs::function::gamma::gamma;
use std::fmt;
use std::str::FromStr;

/// The closed set of parametric families a variable can be fitted to.
///
/// `Constant` is a point mass. It is not produced by fitting, but lets a
/// caller pin a quantity (e.g. a fixed lead time) without special cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Exponential,
    Weibull,
    LogNormal,
    Pareto,
    Normal,
    Constant,
}

impl Family {
    /// Name used when writing the family back out.
    pub fn canonical_name(self) -> &'static str {
        match self {
            Family::Exponential => "expon",
            Family::Weibull => "weibull_min",
            Family::LogNormal => "lognorm",
            Family::Pareto => "pareto",
            Family::Normal => "norm",
            Family::Constant => "constant",
        }
    }

    /// Number of leading shape parameters before the optional `loc` and `scale`.
    fn shape_count(self) -> usize {
        match self {
            Family::Exponential | Family::Normal => 0,
            Family::Weibull | Family::LogNormal | Family::Pareto => 1,
            Family::Constant => 1,
        }
    }
}

impl FromStr for Family {
    type Err = SimError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "expon" | "exponential" => Ok(Family::Exponential),
            "weibull_min" | "weibull" => Ok(Family::Weibull),
            "lognorm" | "lognormal" => Ok(Family::LogNormal),
            "pareto" => Ok(Family::Pareto),
            "norm" | "normal" => Ok(Family::Normal),
            "constant" => Ok(Family::Constant),
            other => Err(SimError::UnsupportedDistribution(other.to_string())),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// One variable's fitted distribution, exactly as it appears in the parameter document.
///
/// The family name is kept as text so that loading never rejects a document
/// over an unknown family; that check happens the first time the variable is
/// sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSpec {
    pub distribution: String,
    pub parameters: Vec<f64>,
}

impl DistributionSpec {
    pub fn new(distribution: impl Into<String>, parameters: Vec<f64>) -> Self {
        Self {
            distribution: distribution.into(),
            parameters,
        }
    }

    pub fn family(&self) -> Result<Family> {
        self.distribution.parse()
    }

    /// Resolves the family and parameters into a usable [`Marginal`].
    pub fn evaluate(&self) -> Result<Marginal> {
        evaluate(self.family()?, &self.parameters)
    }
}

/// Standardised kernel of a location-scale family.
///
/// Each variant carries the `rand_distr` sampler and the `statrs` law it needs,
/// both built once when the marginal is evaluated.
#[derive(Debug, Clone)]
enum Kernel {
    Exponential {
        law: ExpLaw,
    },
    Weibull {
        shape: f64,
        draw: rand_distr::Weibull<f64>,
        law: WeibullLaw,
    },
    LogNormal {
        sigma: f64,
        draw: rand_distr::LogNormal<f64>,
        /// Standard normal; `ln Z / sigma` is standard normal.
        normal: NormalLaw,
    },
    Pareto {
        shape: f64,
        draw: rand_distr::Pareto<f64>,
        law: ParetoLaw,
    },
    Normal {
        law: NormalLaw,
    },
    Constant,
}

/// A resolved marginal distribution: sampling, CDF and inverse CDF for one variable.
///
/// All families are handled as `loc + scale * Z`, where `Z` follows the
/// standardised family. Parameters are ordered shape(s) first, then the
/// optional `loc` (default 0) and `scale` (default 1).
#[derive(Debug, Clone)]
pub struct Marginal {
    family: Family,
    loc: f64,
    scale: f64,
    kernel: Kernel,
}

/// Builds the sample/cdf/inverse-cdf bundle for `family` with the given parameters.
pub fn evaluate(family: Family, parameters: &[f64]) -> Result<Marginal> {
    let invalid = |reason: String| SimError::InvalidParameters {
        family: family.canonical_name().to_string(),
        reason,
    };

    if let Some(bad) = parameters.iter().find(|p| !p.is_finite()) {
        return Err(invalid(format!("parameter {bad} is not finite")));
    }

    if family == Family::Constant {
        return match parameters {
            [value] => Ok(Marginal {
                family,
                loc: *value,
                scale: 0.0,
                kernel: Kernel::Constant,
            }),
            _ => Err(invalid(format!(
                "expected exactly 1 parameter, got {}",
                parameters.len()
            ))),
        };
    }

    let shapes = family.shape_count();
    if parameters.len() < shapes || parameters.len() > shapes + 2 {
        return Err(invalid(format!(
            "expected {} to {} parameters, got {}",
            shapes,
            shapes + 2,
            parameters.len()
        )));
    }

    let loc = parameters.get(shapes).copied().unwrap_or(0.0);
    let scale = parameters.get(shapes + 1).copied().unwrap_or(1.0);
    if scale <= 0.0 {
        return Err(invalid(format!("scale must be positive, got {scale}")));
    }
    let shape = parameters.first().copied().unwrap_or(0.0);
    if shapes == 1 && shape <= 0.0 {
        return Err(invalid(format!("shape must be positive, got {shape}")));
    }

    let kernel = match family {
        Family::Exponential => Kernel::Exponential {
            law: ExpLaw::new(1.0).map_err(|e| invalid(e.to_string()))?,
        },
        Family::Weibull => Kernel::Weibull {
            shape,
            draw: rand_distr::Weibull::new(1.0, shape).map_err(|e| invalid(e.to_string()))?,
            law: WeibullLaw::new(shape, 1.0).map_err(|e| invalid(e.to_string()))?,
        },
        Family::LogNormal => Kernel::LogNormal {
            sigma: shape,
            draw: rand_distr::LogNormal::new(0.0, shape).map_err(|e| invalid(e.to_string()))?,
            normal: NormalLaw::new(0.0, 1.0).map_err(|e| invalid(e.to_string()))?,
        },
        Family::Pareto => Kernel::Pareto {
            shape,
            draw: rand_distr::Pareto::new(1.0, shape).map_err(|e| invalid(e.to_string()))?,
            law: ParetoLaw::new(1.0, shape).map_err(|e| invalid(e.to_string()))?,
        },
        Family::Normal => Kernel::Normal {
            law: NormalLaw::new(0.0, 1.0).map_err(|e| invalid(e.to_string()))?,
        },
        Family::Constant => Kernel::Constant,
    };

    Ok(Marginal {
        family,
        loc,
        scale,
        kernel,
    })
}

impl Marginal {
    pub fn family(&self) -> Family {
        self.family
    }

    /// Draws one value.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let z: f64 = match &self.kernel {
            Kernel::Exponential { .. } => Exp1.sample(rng),
            Kernel::Weibull { draw, .. } => draw.sample(rng),
            Kernel::LogNormal { draw, .. } => draw.sample(rng),
            Kernel::Pareto { draw, .. } => draw.sample(rng),
            Kernel::Normal { .. } => StandardNormal.sample(rng),
            Kernel::Constant => return self.loc,
        };
        self.loc + self.scale * z
    }

    /// Draws `count` i.i.d. values.
    pub fn sample_n<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<f64> {
        (0..count).map(|_| self.sample(rng)).collect()
    }

    pub fn cdf(&self, x: f64) -> f64 {
        let z = (x - self.loc) / self.scale;
        match &self.kernel {
            Kernel::Exponential { law } => law.cdf(z),
            Kernel::Weibull { law, .. } => law.cdf(z),
            Kernel::LogNormal { sigma, normal, .. } => {
                if z <= 0.0 {
                    0.0
                } else {
                    normal.cdf(z.ln() / sigma)
                }
            }
            Kernel::Pareto { law, .. } => law.cdf(z),
            Kernel::Normal { law } => law.cdf(z),
            Kernel::Constant => {
                if x < self.loc {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    /// Quantile function. `p` is expected in `(0, 1)`; the end points map to
    /// the support bounds, which may be infinite.
    ///
    /// statrs only bisects coarsely for families without a closed-form
    /// quantile, so those are written out here.
    pub fn inverse_cdf(&self, p: f64) -> f64 {
        let z = match &self.kernel {
            Kernel::Exponential { .. } => -(-p).ln_1p(),
            Kernel::Weibull { shape, .. } => (-(-p).ln_1p()).powf(1.0 / shape),
            Kernel::LogNormal { sigma, normal, .. } => (sigma * normal.inverse_cdf(p)).exp(),
            Kernel::Pareto { shape, .. } => (1.0 - p).powf(-1.0 / shape),
            Kernel::Normal { law } => law.inverse_cdf(p),
            Kernel::Constant => return self.loc,
        };
        self.loc + self.scale * z
    }

    /// Expected value; infinite for a Pareto with shape at or below 1.
    pub fn mean(&self) -> f64 {
        let standard = match &self.kernel {
            Kernel::Exponential { .. } => 1.0,
            Kernel::Weibull { shape, .. } => gamma(1.0 + 1.0 / shape),
            Kernel::LogNormal { sigma, .. } => (sigma * sigma / 2.0).exp(),
            Kernel::Pareto { shape, .. } => {
                if *shape <= 1.0 {
                    return f64::INFINITY;
                }
                shape / (shape - 1.0)
            }
            Kernel::Normal { .. } => 0.0,
            Kernel::Constant => return self.loc,
        };
        self.loc + self.scale * standard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn both_naming_conventions_parse() {
        assert_eq!("expon".parse::<Family>().unwrap(), Family::Exponential);
        assert_eq!("weibull".parse::<Family>().unwrap(), Family::Weibull);
        assert_eq!("lognorm".parse::<Family>().unwrap(), Family::LogNormal);
        assert_eq!("normal".parse::<Family>().unwrap(), Family::Normal);
    }

    #[test]
    fn unknown_family_is_unsupported() {
        let spec = DistributionSpec::new("gumbel_r", vec![0.0, 1.0]);
        assert!(matches!(
            spec.evaluate(),
            Err(SimError::UnsupportedDistribution(name)) if name == "gumbel_r"
        ));
    }

    #[test]
    fn wrong_parameter_count_is_rejected() {
        assert!(matches!(
            evaluate(Family::Weibull, &[]),
            Err(SimError::InvalidParameters { .. })
        ));
        assert!(matches!(
            evaluate(Family::Normal, &[0.0, 1.0, 2.0]),
            Err(SimError::InvalidParameters { .. })
        ));
        assert!(matches!(
            evaluate(Family::Exponential, &[0.0, -2.0]),
            Err(SimError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn loc_and_scale_shift_the_quantiles() {
        let m = evaluate(Family::Normal, &[5.0, 2.0]).unwrap();
        assert!((m.inverse_cdf(0.5) - 5.0).abs() < 1e-9);
        assert!((m.cdf(5.0) - 0.5).abs() < 1e-9);
        assert!((m.mean() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn inverse_cdf_undoes_cdf() {
        let cases = [
            (Family::Exponential, vec![0.0, 3.0]),
            (Family::Weibull, vec![1.5, 0.0, 2.0]),
            (Family::LogNormal, vec![0.4, 1.0, 10.0]),
            (Family::Pareto, vec![2.5]),
        ];
        for (family, params) in cases {
            let m = evaluate(family, &params).unwrap();
            for p in [0.05, 0.3, 0.5, 0.9] {
                let x = m.inverse_cdf(p);
                assert!((m.cdf(x) - p).abs() < 1e-6, "{family} at {p}");
            }
        }
    }

    #[test]
    fn exponential_sample_mean_matches_scale() {
        let m = evaluate(Family::Exponential, &[0.0, 4.0]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let draws = m.sample_n(20_000, &mut rng);
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        assert!((mean - 4.0).abs() < 0.15, "mean was {mean}");
    }

    #[test]
    fn constant_is_a_point_mass() {
        let m = evaluate(Family::Constant, &[3.0]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(m.sample_n(10, &mut rng).iter().all(|&x| x == 3.0));
        assert_eq!(m.inverse_cdf(0.01), 3.0);
        assert_eq!(m.mean(), 3.0);
        assert_eq!(m.cdf(2.9), 0.0);
    }

    #[test]
    fn heavy_pareto_has_infinite_mean() {
        let m = evaluate(Family::Pareto, &[0.8]).unwrap();
        assert!(m.mean().is_infinite());
    }
}
