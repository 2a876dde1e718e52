//! Laplace mechanism.
//!
//! Adds noise drawn from `Lap(0, Δ/ε)` where `Δ` is the sensitivity and `ε`
//! the privacy parameter. Samples use the inverse CDF
//! `X = -b · sign(U) · ln(1 - 2|U|)` with `U ~ Uniform(-0.5, 0.5)`.

use rand::Rng;

use crate::error::ConfigError;

/// Calibrated additive Laplace noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaplaceMechanism {
    sensitivity: f64,
    epsilon: f64,
}

impl LaplaceMechanism {
    pub fn new(sensitivity: f64, epsilon: f64) -> Result<Self, ConfigError> {
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(ConfigError::InvalidEpsilon(epsilon));
        }
        if !(sensitivity.is_finite() && sensitivity > 0.0) {
            return Err(ConfigError::InvalidSensitivity(sensitivity));
        }
        Ok(LaplaceMechanism {
            sensitivity,
            epsilon,
        })
    }

    /// Unit sensitivity, as used for per-pixel noise.
    pub fn with_epsilon(epsilon: f64) -> Result<Self, ConfigError> {
        Self::new(1.0, epsilon)
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Scale `b = Δ/ε`.
    pub fn scale(&self) -> f64 {
        self.sensitivity / self.epsilon
    }

    /// One draw from `Lap(0, b)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        loop {
            let u: f64 = rng.random::<f64>() - 0.5;
            let tail = 1.0 - 2.0 * u.abs();
            // u = -0.5 would give ln(0).
            if tail > 0.0 {
                return -self.scale() * u.signum() * tail.ln();
            }
        }
    }

    pub fn perturb<R: Rng + ?Sized>(&self, value: f64, rng: &mut R) -> f64 {
        value + self.sample(rng)
    }

    /// Independent draw per element.
    pub fn perturb_all<R: Rng + ?Sized>(&self, values: &mut [f64], rng: &mut R) {
        for v in values {
            *v = self.perturb(*v, rng);
        }
    }
}
