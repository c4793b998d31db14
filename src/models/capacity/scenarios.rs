use std::str::FromStr;

use itertools::iproduct;
use log::{debug, info};
use rand::{
    distributions::{Distribution as _, Uniform},
    rngs::StdRng,
    SeedableRng,
};
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use super::{Parameters, Sets};
use crate::error::Error;
use crate::problem::{PeriodId, ProductId, ScenarioId};
use crate::repository::Param;

/// Distribution of the multiplicative demand factor. Both have mean one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// Uniform on `[1 - sqrt(3v), 1 + sqrt(3v)]`
    Uniform,
    /// `Normal(1, sqrt(v))`
    Normal,
}

impl FromStr for Distribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uniform" => Ok(Distribution::Uniform),
            "normal" => Ok(Distribution::Normal),
            other => Err(format!("unknown distribution {}, expected uniform or normal", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Number of equally likely scenarios
    pub count: usize,
    pub distribution: Distribution,
    /// Variance of the demand factor
    pub variance: f64,
    /// Seeds the generator; scenarios are drawn from entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.count == 0 {
            return Err(Error::InvalidConfig(
                "at least one scenario is required".to_string(),
            ));
        }
        if !self.variance.is_finite() || self.variance < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "demand variance must be finite and non-negative, got {}",
                self.variance
            )));
        }
        Ok(())
    }
}

type Demand = Param<(PeriodId, ProductId)>;

/// One demand realization with its probability.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub id: ScenarioId,
    pub probability: f64,
    pub demand_mts: Demand,
    pub demand_mto: Demand,
}

impl Scenario {
    /// The data as given, with probability one
    pub fn nominal(parameters: &Parameters) -> Scenario {
        Scenario {
            id: ScenarioId::NOMINAL,
            probability: 1.0,
            demand_mts: parameters.demand_mts.clone(),
            demand_mto: parameters.demand_mto.clone(),
        }
    }

    /// Draws `config.count` equally likely scenarios. Every (scenario, period, product)
    /// gets its own factor, applied to both demand roles and clamped at zero.
    pub fn sample(
        config: &ScenarioConfig,
        parameters: &Parameters,
        sets: &Sets,
    ) -> Result<Vec<Scenario>, Error> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let draw: Box<dyn Fn(&mut StdRng) -> f64> = match config.distribution {
            Distribution::Uniform => {
                let half_width = (3.0 * config.variance).sqrt();
                let uniform = Uniform::new_inclusive(1.0 - half_width, 1.0 + half_width);
                Box::new(move |rng: &mut StdRng| uniform.sample(rng))
            }
            Distribution::Normal => {
                let normal = Normal::new(1.0, config.variance.sqrt())
                    .map_err(|e| Error::InvalidConfig(format!("demand distribution: {}", e)))?;
                Box::new(move |rng: &mut StdRng| normal.sample(rng))
            }
        };

        let probability = 1.0 / config.count as f64;
        let mut scenarios = Vec::with_capacity(config.count);
        for s in 0..config.count {
            let mut mts = Vec::new();
            let mut mto = Vec::new();
            for (p, t) in iproduct!(sets.P.iter().copied(), sets.T.iter().copied()) {
                let factor = draw(&mut rng);
                let key = (p, t);
                mts.push((key, (parameters.demand_mts.get(key)? * factor).max(0.0)));
                mto.push((key, (parameters.demand_mto.get(key)? * factor).max(0.0)));
                debug!("scenario {} period {} product {}: factor {:.4}", s, p, t, factor);
            }

            scenarios.push(Scenario {
                id: ScenarioId::new(s),
                probability,
                demand_mts: Param::new("demand_mts", mts),
                demand_mto: Param::new("demand_mto", mto),
            });
        }

        info!(
            "Sampled {} {:?} demand scenarios with variance {}",
            config.count, config.distribution, config.variance
        );
        Ok(scenarios)
    }
}
