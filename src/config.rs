use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::capacity::ScenarioConfig;

/// The big-M constant of the source data, used as the derived-policy fallback
pub const REFERENCE_BIG_M: f64 = 999_999_999_999.0;

/// How the big-M coefficients of the loading sign decomposition are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum BigM {
    /// One constant for every product and scenario
    Fixed { value: f64 },
    /// Bounds implied by initial loading, demand and capacity limits; `fallback`
    /// where the data implies no bound.
    Derived { fallback: f64 },
}

impl Default for BigM {
    fn default() -> Self {
        BigM::Derived {
            fallback: REFERENCE_BIG_M,
        }
    }
}

/// Options of a model build and solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Whether production of a product is capped by its make-to-order demand
    pub demand_cap: bool,
    pub big_m: BigM,
    /// Upper bound on acquisitions per period, resource and channel
    pub acquisition_limit: Option<u32>,
    /// Upper bound on the stock of every tester type and handler instance
    pub stock_limit: Option<u32>,
    /// Thread hint for solvers that support it
    pub threads: i32,
    /// Builds the scenario based variant when set
    pub stochastic: Option<ScenarioConfig>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            demand_cap: true,
            big_m: BigM::default(),
            acquisition_limit: None,
            stock_limit: None,
            threads: 16,
            stochastic: None,
        }
    }
}

impl ModelConfig {
    pub fn from_json(json: &str) -> Result<ModelConfig, Error> {
        let config: ModelConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn read(path: &Path) -> Result<ModelConfig, Error> {
        let json = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        ModelConfig::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        match self.big_m {
            BigM::Fixed { value } if !positive(value) => {
                return Err(Error::InvalidConfig(format!(
                    "big-M must be positive and finite, got {}",
                    value
                )))
            }
            BigM::Derived { fallback } if !positive(fallback) => {
                return Err(Error::InvalidConfig(format!(
                    "big-M fallback must be positive and finite, got {}",
                    fallback
                )))
            }
            _ => (),
        }

        if self.threads < 0 {
            return Err(Error::InvalidConfig(format!(
                "thread count cannot be negative, got {}",
                self.threads
            )));
        }

        match &self.stochastic {
            Some(scenarios) => scenarios.validate(),
            None => Ok(()),
        }
    }

    pub fn is_stochastic(&self) -> bool {
        self.stochastic.is_some()
    }
}
