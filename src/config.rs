//! Field configuration: spread fraction, self-gravitation, attraction bias,
//! decay, and the strategy used by [`GammaField::step`](crate::GammaField::step).
//!
//! Configurations are plain data. They can be built in code or loaded from
//! JSON handed over by a sweep harness:
//!
//! ```
//! use gamma_field::{FieldConfig, SpreadRule};
//!
//! let config = FieldConfig::from_json_str(r#"{ "rule": "attracting", "attraction": 2.0 }"#).unwrap();
//! assert_eq!(config.rule, SpreadRule::Attracting);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, Result};
use crate::source::DepositMode;

/// How a node's outflow is computed and shared among its neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadRule {
    /// Constant outflow fraction `alpha`, split evenly. `self_gravity` is ignored.
    Linear,
    /// Outflow fraction `alpha / (1 + G * gamma)`, split evenly.
    #[default]
    SelfGravitating,
    /// Self-gravitating outflow, split in proportion to `1 + G_attract * gamma[j]`.
    Attracting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldConfig {
    /// Spread fraction. `None` resolves to `1 / k` for the topology's nominal degree.
    pub alpha: Option<f64>,
    /// Self-gravitation strength `G`.
    pub self_gravity: f64,
    /// Directional bias strength `G_attract`, used by the attracting spread.
    pub attraction: f64,
    /// Multiplicative attenuation applied by `step()`. `1.0` disables decay.
    pub decay: f64,
    pub rule: SpreadRule,
    pub deposit_mode: DepositMode,
    /// Worker threads for the spread kernels. `0` uses rayon's global pool.
    pub threads: usize,
    /// Keep one ledger record per tick. Off by default: the history grows by
    /// one record every tick for the life of the field.
    pub record_history: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            alpha: None,
            self_gravity: 0.0,
            attraction: 0.0,
            decay: 1.0,
            rule: SpreadRule::SelfGravitating,
            deposit_mode: DepositMode::MassConserving,
            threads: 0,
            record_history: false,
        }
    }
}

impl FieldConfig {
    /// Plain conservative diffusion.
    pub fn linear() -> Self {
        FieldConfig {
            rule: SpreadRule::Linear,
            ..Default::default()
        }
    }

    pub fn self_gravitating(self_gravity: f64) -> Self {
        FieldConfig {
            rule: SpreadRule::SelfGravitating,
            self_gravity,
            ..Default::default()
        }
    }

    pub fn attracting(self_gravity: f64, attraction: f64) -> Self {
        FieldConfig {
            rule: SpreadRule::Attracting,
            self_gravity,
            attraction,
            ..Default::default()
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_deposit_mode(mut self, mode: DepositMode) -> Self {
        self.deposit_mode = mode;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_history(mut self, record_history: bool) -> Self {
        self.record_history = record_history;
        self
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Self-gravitation strength seen by the spread kernels.
    pub fn retention(&self) -> f64 {
        match self.rule {
            SpreadRule::Linear => 0.0,
            SpreadRule::SelfGravitating | SpreadRule::Attracting => self.self_gravity,
        }
    }

    /// Check every numeric parameter and resolve `alpha` against the nominal degree.
    pub fn resolve_alpha(&self, nominal_degree: usize) -> Result<f64> {
        if !(self.self_gravity.is_finite() && self.self_gravity >= 0.0) {
            return Err(FieldError::config(format!(
                "self_gravity must be finite and >= 0, got {}",
                self.self_gravity
            )));
        }
        if !(self.attraction.is_finite() && self.attraction >= 0.0) {
            return Err(FieldError::config(format!(
                "attraction must be finite and >= 0, got {}",
                self.attraction
            )));
        }
        validate_decay(self.decay)?;

        let alpha = match self.alpha {
            Some(alpha) => alpha,
            None if nominal_degree == 0 => {
                return Err(FieldError::config(
                    "alpha cannot default to 1/k on a topology with nominal degree 0",
                ))
            }
            None => 1.0 / nominal_degree as f64,
        };
        if !(alpha.is_finite() && alpha > 0.0 && alpha < 1.0) {
            return Err(FieldError::config(format!(
                "alpha must lie in (0, 1), got {alpha}"
            )));
        }
        Ok(alpha)
    }
}

/// Decay factors live in `(0, 1]`.
pub(crate) fn validate_decay(factor: f64) -> Result<()> {
    if factor.is_finite() && factor > 0.0 && factor <= 1.0 {
        Ok(())
    } else {
        Err(FieldError::config(format!(
            "decay factor must lie in (0, 1], got {factor}"
        )))
    }
}
