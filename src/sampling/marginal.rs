// src/sampling/marginal.rs

use crate::error::Result;
use crate::model::parameters::SimulationParameters;
use rand::Rng;

/// Independent draws from a single named variable.
#[derive(Debug, Clone, Copy)]
pub struct MarginalSampler<'a> {
    params: &'a SimulationParameters,
    /// Variables that cannot be negative (times, delays).
    non_negative: &'a [String],
}

impl<'a> MarginalSampler<'a> {
    pub fn new(params: &'a SimulationParameters, non_negative: &'a [String]) -> Self {
        Self {
            params,
            non_negative,
        }
    }

    /// Draws `count` i.i.d. samples for `variable`.
    ///
    /// Negative draws of a non-negative variable are set to exactly zero,
    /// not redrawn.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        variable: &str,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<f64>> {
        let marginal = self.params.marginal(variable)?;
        let mut samples = marginal.sample_n(count, rng);
        if self.is_non_negative(variable) {
            clamp_non_negative(&mut samples);
        }
        Ok(samples)
    }

    pub fn is_non_negative(&self, variable: &str) -> bool {
        self.non_negative.iter().any(|v| v == variable)
    }
}

pub(crate) fn clamp_non_negative(values: &mut [f64]) {
    for v in values.iter_mut() {
        if *v < 0.0 {
            *v = 0.0;
        }
    }
}
