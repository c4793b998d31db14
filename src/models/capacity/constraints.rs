use itertools::iproduct;
use log::{debug, info, trace, warn};

use super::variables::{Stock, Variables};
use super::{Parameters, Scenario, Sets};
use crate::config::{BigM, ModelConfig};
use crate::error::Error;
use crate::models::lp::{Expression, LinearProgram, Relate};
use crate::problem::{Label, Period, PeriodId, ProductId, ScenarioId};

/// Big-M coefficients of the sign decomposition of one product in one scenario
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadingBounds {
    /// Bounds the excess part
    pub pos: f64,
    /// Bounds the shortage part
    pub neg: f64,
}

/// Adds every constraint family of the capacity planning model to a linear program.
pub struct ConstraintGenerator<'a> {
    pub sets: &'a Sets,
    pub parameters: &'a Parameters,
    pub scenarios: &'a [Scenario],
    pub vars: &'a Variables,
    pub config: &'a ModelConfig,
}

fn name(family: &str, key: impl Label) -> String {
    format!("{}_({})", family, key.label())
}

fn usable(denominator: f64, resource: &'static str, key: impl Label) -> Result<f64, Error> {
    match denominator.is_finite() && denominator > 0.0 {
        true => Ok(denominator),
        false => Err(Error::ZeroCapacity {
            resource,
            key: key.label(),
        }),
    }
}

impl<'a> ConstraintGenerator<'a> {
    pub fn generate(&self, lp: &mut LinearProgram) -> Result<(), Error> {
        info!("Adding constraints for {} scenario(s)", self.scenarios.len());

        let families: [(&str, fn(&Self, &mut LinearProgram) -> Result<(), Error>); 9] = [
            ("tester capacity", Self::tester_capacity),
            ("production decomposition", Self::production_decomposition),
            ("handler capacity", Self::handler_capacity),
            ("sign decomposition", Self::sign_decomposition),
            ("loading balance", Self::loading_balance),
            ("demand cap", Self::demand_cap),
            ("loading cost", Self::loading_cost),
            ("capital", Self::capital),
            ("stock dynamics", Self::stock_dynamics),
        ];

        for (family, add) in families {
            let before = lp.num_constrs();
            add(self, lp)?;
            debug!("{}: {} constraints", family, lp.num_constrs() - before);
        }

        info!(
            "Model has {} variables and {} constraints",
            lp.num_vars(),
            lp.num_constrs()
        );
        Ok(())
    }

    fn scenario_ids(&self) -> impl Iterator<Item = ScenarioId> + Clone + 'a {
        self.scenarios.iter().map(|s| s.id)
    }

    /// Production on the testers of a product, weighted by ability
    fn inflow(&self, s: ScenarioId, p: PeriodId, t: ProductId) -> Result<Expression, Error> {
        self.sets
            .M
            .iter()
            .map(|&m| {
                Ok(self.vars.Q.get((s, p, m, t))? * self.parameters.tester_ability.get((m, t))?)
            })
            .sum::<Result<Expression, Error>>()
    }

    /// The testers in use can not exceed the stock plus what is acquired in the period
    pub fn tester_capacity(&self, lp: &mut LinearProgram) -> Result<(), Error> {
        let params = self.parameters;
        for (s, &p, &m) in iproduct!(self.scenario_ids(), &self.sets.P, &self.sets.M) {
            let hours = params.tester_work_hours.at((p, m))? * params.tester_util.at((p, m))?;

            let available = self.vars.K.available(p.into(), m)?
                + self
                    .sets
                    .Z
                    .iter()
                    .map(|&z| self.vars.X.get((p, m, z)))
                    .sum::<Result<Expression, Error>>()?;

            let used = self
                .sets
                .T
                .iter()
                .map(|&t| {
                    let rate = usable(
                        params.tester_throughput.get((m, t))? * hours,
                        "tester",
                        (p, m, t),
                    )?;
                    Ok(self.vars.Q.get((s, p, m, t))? * (params.tester_ability.get((m, t))? / rate))
                })
                .sum::<Result<Expression, Error>>()?;

            lp.add_constr(&name("tester_capacity", (s, p, m)), available.at_least(used))?;
        }
        Ok(())
    }

    /// Production on a tester is split over the handler instances of every category
    pub fn production_decomposition(&self, lp: &mut LinearProgram) -> Result<(), Error> {
        let sets = self.sets;
        let keys = iproduct!(self.scenario_ids(), &sets.P, &sets.M, &sets.H, &sets.T);
        for (s, &p, &m, &h, &t) in keys {
            let combined = sets
                .A
                .iter()
                .map(|&a| self.vars.QH.get((s, p, m, h, a, t)))
                .sum::<Result<Expression, Error>>()?;

            lp.add_constr(
                &name("production_decomposition", (s, p, m, h, t)),
                combined.equals(self.vars.Q.get((s, p, m, t))?),
            )?;
        }
        Ok(())
    }

    /// The handlers in use can not exceed the stock plus what is acquired in the period
    pub fn handler_capacity(&self, lp: &mut LinearProgram) -> Result<(), Error> {
        let params = self.parameters;
        let sets = self.sets;
        for (s, &p, (h, a)) in iproduct!(self.scenario_ids(), &sets.P, sets.handler_pairs()) {
            let hours =
                params.handler_work_hours.at((p, h, a))? * params.handler_util.at((p, h, a))?;

            let available = self.vars.KH.available(p.into(), (h, a))?
                + sets
                    .Zh
                    .iter()
                    .map(|&z| self.vars.XH.get((p, h, a, z)))
                    .sum::<Result<Expression, Error>>()?;

            let used = iproduct!(&sets.M, &sets.T)
                .map(|(&m, &t)| {
                    let rate = usable(
                        params.handler_throughput.get((m, h, a, t))? * hours,
                        "handler",
                        (p, m, h, a, t),
                    )?;
                    let weight = params.handler_ability.get((m, h, a, t))? / rate;
                    Ok(self.vars.QH.get((s, p, m, h, a, t))? * weight)
                })
                .sum::<Result<Expression, Error>>()?;

            lp.add_constr(&name("handler_capacity", (s, p, h, a)), available.at_least(used))?;
        }
        Ok(())
    }

    /// S = S_pos - S_neg, where the binary y selects which part may be non-zero
    pub fn sign_decomposition(&self, lp: &mut LinearProgram) -> Result<(), Error> {
        let vars = self.vars;
        for scenario in self.scenarios {
            let s = scenario.id;
            for &t in &self.sets.T {
                let bounds = self.big_m(scenario, t)?;
                for period in self.sets.horizon() {
                    let key = (s, period, t);
                    let (pos, neg, y) =
                        (vars.S_pos.get(key)?, vars.S_neg.get(key)?, vars.y.get(key)?);

                    lp.add_constr(
                        &name("loading_sign", key),
                        vars.S.get(key)?.equals(pos - neg),
                    )?;
                    lp.add_constr(&name("loading_excess", key), pos.at_most(y * bounds.pos))?;
                    lp.add_constr(
                        &name("loading_shortage", key),
                        (neg + y * bounds.neg).at_most(bounds.neg),
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Loading starts at its initial value and accumulates production net of demand
    pub fn loading_balance(&self, lp: &mut LinearProgram) -> Result<(), Error> {
        let initial = self.parameters.initial_loading.get()?;
        for scenario in self.scenarios {
            let s = scenario.id;
            for &t in &self.sets.T {
                lp.add_constr(
                    &name("loading_initial", (s, t)),
                    self.vars.S.get((s, Period::Initial, t))?.equals(initial.get(t)?),
                )?;

                for (prev, p) in self.sets.transitions() {
                    let rhs = self.vars.S.get((s, prev, t))? + self.inflow(s, p, t)?
                        - scenario.demand_mts.get((p, t))?;
                    lp.add_constr(
                        &name("loading_balance", (s, p, t)),
                        self.vars.S.get((s, p.into(), t))?.equals(rhs),
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Production of a product is capped by its make-to-order demand
    pub fn demand_cap(&self, lp: &mut LinearProgram) -> Result<(), Error> {
        if !self.config.demand_cap {
            info!("Demand cap disabled");
            return Ok(());
        }

        for scenario in self.scenarios {
            for (&p, &t) in iproduct!(&self.sets.P, &self.sets.T) {
                let key = (scenario.id, p, t);
                lp.add_constr(
                    &name("demand_cap", key),
                    self.inflow(scenario.id, p, t)?
                        .at_most(scenario.demand_mto.get((p, t))?),
                )?;
            }
        }
        Ok(())
    }

    /// V prices the excess and shortage parts of the loading
    pub fn loading_cost(&self, lp: &mut LinearProgram) -> Result<(), Error> {
        let excess = self.parameters.excess_cost.get()?;
        let shortage = self.parameters.shortage_cost.get()?;
        for (s, &p, &t) in iproduct!(self.scenario_ids(), &self.sets.P, &self.sets.T) {
            let key = (s, Period::from(p), t);
            let cost = self.vars.S_pos.get(key)? * excess.get((p, t))?
                + self.vars.S_neg.get(key)? * shortage.get((p, t))?;
            lp.add_constr(
                &name("loading_cost", (s, p, t)),
                self.vars.V.get((s, p, t))?.equals(cost),
            )?;
        }
        Ok(())
    }

    /// Capital earns interest and pays for acquisitions and loading cost out of profit
    pub fn capital(&self, lp: &mut LinearProgram) -> Result<(), Error> {
        let params = self.parameters;
        let sets = self.sets;
        let vars = self.vars;
        let initial = *params.initial_capital.get()?;

        for scenario in self.scenarios {
            let s = scenario.id;
            lp.add_constr(
                &name("capital_initial", s),
                vars.F.get((s, Period::Initial))?.equals(initial),
            )?;

            for (prev, p) in sets.transitions() {
                let rate = params.interest_rate.at(p)?;

                let tester_spend = iproduct!(&sets.M, &sets.Z)
                    .map(|(&m, &z)| {
                        Ok(vars.X.get((p, m, z))? * params.tester_borrow_price.get((p, m, z))?)
                    })
                    .sum::<Result<Expression, Error>>()?;
                let handler_spend = iproduct!(sets.handler_pairs(), &sets.Zh)
                    .map(|((h, a), &z)| {
                        let price = params.handler_borrow_price.get((p, h, a, z))?;
                        Ok(vars.XH.get((p, h, a, z))? * price)
                    })
                    .sum::<Result<Expression, Error>>()?;
                let loading_cost = sets
                    .T
                    .iter()
                    .map(|&t| vars.V.get((s, p, t)))
                    .sum::<Result<Expression, Error>>()?;
                let stock_profit = sets
                    .T
                    .iter()
                    .map(|&t| Ok(params.profit.get((p, t))? * scenario.demand_mts.get((p, t))?))
                    .sum::<Result<f64, Error>>()?;
                let order_profit = iproduct!(&sets.M, &sets.T)
                    .map(|(&m, &t)| Ok(vars.Q.get((s, p, m, t))? * params.profit.get((p, t))?))
                    .sum::<Result<Expression, Error>>()?;

                let rhs = vars.F.get((s, prev))? * (1.0 + rate) - tester_spend - handler_spend
                    - loading_cost
                    + stock_profit
                    + order_profit;
                lp.add_constr(
                    &name("capital", (s, p)),
                    vars.F.get((s, p.into()))?.equals(rhs),
                )?;
            }
        }
        Ok(())
    }

    /// Deterministic stock starts at the initial inventory and never decreases.
    /// Here-and-now stock is bounded below by the initial inventory instead.
    pub fn stock_dynamics(&self, lp: &mut LinearProgram) -> Result<(), Error> {
        let initial_testers = self.parameters.initial_testers.get()?;
        let initial_handlers = self.parameters.initial_handlers.get()?;

        if let Stock::PerPeriod(_) = self.vars.K {
            for &m in &self.sets.M {
                lp.add_constr(
                    &name("tester_stock_initial", m),
                    self.vars
                        .K
                        .available(Period::Initial, m)?
                        .equals(initial_testers.get(m)?),
                )?;
                for (prev, p) in self.sets.transitions() {
                    lp.add_constr(
                        &name("tester_stock", (p, m)),
                        self.vars
                            .K
                            .available(p.into(), m)?
                            .at_least(self.vars.K.available(prev, m)?),
                    )?;
                }
            }
        }

        if let Stock::PerPeriod(_) = self.vars.KH {
            for (h, a) in self.sets.handler_pairs() {
                lp.add_constr(
                    &name("handler_stock_initial", (h, a)),
                    self.vars
                        .KH
                        .available(Period::Initial, (h, a))?
                        .equals(initial_handlers.get((h, a))?),
                )?;
                for (prev, p) in self.sets.transitions() {
                    lp.add_constr(
                        &name("handler_stock", (p, h, a)),
                        self.vars
                            .KH
                            .available(p.into(), (h, a))?
                            .at_least(self.vars.KH.available(prev, (h, a))?),
                    )?;
                }
            }
        }
        Ok(())
    }

    /// The big-M coefficients for the sign decomposition of product `t` in `scenario`
    pub fn big_m(&self, scenario: &Scenario, t: ProductId) -> Result<LoadingBounds, Error> {
        let fallback = match self.config.big_m {
            BigM::Fixed { value } => {
                return Ok(LoadingBounds {
                    pos: value,
                    neg: value,
                })
            }
            BigM::Derived { fallback } => fallback,
        };

        let s0 = self.parameters.initial_loading.at(t)?;
        let mut shortfall = 0.0;
        let mut surplus = Some(0.0);
        for &p in &self.sets.P {
            let demand = scenario.demand_mts.get((p, t))?;
            shortfall += demand.max(0.0);
            surplus = match (surplus, self.max_inflow(scenario, p, t)?) {
                (Some(acc), Some(inflow)) => Some(acc + (inflow - demand).max(0.0)),
                _ => None,
            };
        }

        let neg = (-s0).max(0.0) + shortfall + 1.0;
        let pos = match surplus {
            Some(surplus) => s0.max(0.0) + surplus + 1.0,
            None => {
                warn!(
                    "no bound on production of product {} in scenario {}, using big-M {}",
                    t, scenario.id, fallback
                );
                fallback
            }
        };

        trace!("big-M for ({},{}): +{} -{}", scenario.id, t, pos, neg);
        Ok(LoadingBounds { pos, neg })
    }

    /// An upper bound on the ability weighted production of `t` in period `p`,
    /// if the data implies one.
    fn max_inflow(
        &self,
        scenario: &Scenario,
        p: PeriodId,
        t: ProductId,
    ) -> Result<Option<f64>, Error> {
        if self.config.demand_cap {
            return scenario.demand_mto.get((p, t)).map(Some);
        }

        let acquired = match (self.config.acquisition_limit, self.sets.Z.is_empty()) {
            (_, true) => 0.0,
            (Some(limit), false) => self.sets.Z.len() as f64 * f64::from(limit),
            (None, false) => return Ok(None),
        };
        let stock_limit = match self.config.stock_limit {
            Some(limit) => f64::from(limit),
            None => return Ok(None),
        };

        let params = self.parameters;
        let mut inflow = 0.0;
        for &m in &self.sets.M {
            let units = stock_limit.max(params.initial_testers.at(m)?) + acquired;
            inflow += units
                * params.tester_throughput.get((m, t))?
                * params.tester_work_hours.at((p, m))?
                * params.tester_util.at((p, m))?;
        }
        Ok(Some(inflow))
    }
}
