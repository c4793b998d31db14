use std::collections::BTreeMap;
use std::fmt::Debug;

use itertools::iproduct;
use log::debug;

use super::{Parameters, Scenario, Sets};
use crate::config::ModelConfig;
use crate::error::Error;
use crate::models::lp::{LinearProgram, VarType, Variable};
use crate::models::utils::{AddVars, ConvertVars, VarFamily};
use crate::problem::{
    CategoryId, ChannelId, HandlerId, Label, Period, PeriodId, ProductId, ScenarioId, TesterId,
};
use crate::solver::Solution;

/// Equipment stock of one kind of resource.
#[derive(Debug, Clone)]
pub enum Stock<K> {
    /// One variable per state of the horizon, the deterministic structure
    PerPeriod(VarFamily<(Period, K)>),
    /// A single decision taken before any scenario is revealed
    HereAndNow(VarFamily<K>),
}

impl<K: Label + Ord + Copy + Debug> Stock<K> {
    /// The stock available in `period`
    pub fn available(&self, period: Period, key: K) -> Result<Variable, Error> {
        match self {
            Stock::PerPeriod(family) => family.get((period, key)),
            Stock::HereAndNow(family) => family.get(key),
        }
    }

    /// The stock held at the end of the horizon
    pub fn terminal(&self, sets: &Sets, key: K) -> Result<Variable, Error> {
        self.available(sets.last_period(), key)
    }

    pub fn name(&self) -> &str {
        match self {
            Stock::PerPeriod(family) => family.name(),
            Stock::HereAndNow(family) => family.name(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Stock::PerPeriod(family) => family.len(),
            Stock::HereAndNow(family) => family.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Terminal stock per key
    pub fn convert_terminal(
        &self,
        sets: &Sets,
        keys: &[K],
        solution: &Solution,
    ) -> Result<BTreeMap<K, f64>, Error> {
        keys.iter()
            .map(|&k| Ok((k, self.terminal(sets, k)?.convert(solution)?)))
            .collect()
    }
}

#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct Variables {
    /// Capital at the end of every state of the horizon
    pub F: VarFamily<(ScenarioId, Period)>,
    /// Tester stock
    pub K: Stock<TesterId>,
    /// Handler stock
    pub KH: Stock<(CategoryId, HandlerId)>,
    /// Testers acquired through a channel in a period, shared by every scenario
    pub X: VarFamily<(PeriodId, TesterId, ChannelId)>,
    /// Handlers acquired through a channel in a period, shared by every scenario
    pub XH: VarFamily<(PeriodId, CategoryId, HandlerId, ChannelId)>,
    /// Production of a product on a tester type
    pub Q: VarFamily<(ScenarioId, PeriodId, TesterId, ProductId)>,
    /// Production of a product on a tester type served by a handler instance
    pub QH: VarFamily<(ScenarioId, PeriodId, TesterId, CategoryId, HandlerId, ProductId)>,
    /// Capacity loading of a product
    pub S: VarFamily<(ScenarioId, Period, ProductId)>,
    /// Positive part of the capacity loading
    pub S_pos: VarFamily<(ScenarioId, Period, ProductId)>,
    /// Negative part of the capacity loading
    pub S_neg: VarFamily<(ScenarioId, Period, ProductId)>,
    /// 1 if the capacity loading is in excess, 0 if it is short
    pub y: VarFamily<(ScenarioId, Period, ProductId)>,
    /// Cost of the capacity loading
    pub V: VarFamily<(ScenarioId, PeriodId, ProductId)>,
}

#[allow(non_snake_case)]
impl Variables {
    pub fn new(
        lp: &mut LinearProgram,
        sets: &Sets,
        parameters: &Parameters,
        scenarios: &[Scenario],
        config: &ModelConfig,
    ) -> Result<Variables, Error> {
        let s = || scenarios.iter().map(|scenario| scenario.id);
        let p = || sets.P.iter().copied();
        let horizon = || sets.horizon().into_iter();
        let m = || sets.M.iter().copied();
        let ha = || sets.handler_pairs().into_iter();
        let t = || sets.T.iter().copied();

        let initial_testers = parameters.initial_testers.get()?;
        let initial_handlers = parameters.initial_handlers.get()?;

        // the stock limit never cuts off the initial inventory
        let stock_bounds = |k0: f64| {
            let ub = config
                .stock_limit
                .map_or(f64::INFINITY, |limit| f64::from(limit).max(k0));
            (VarType::Integer, 0.0..ub)
        };
        let here_and_now_bounds = |k0: f64| {
            let (vtype, bounds) = stock_bounds(k0);
            (vtype, k0..bounds.end)
        };

        let (K, KH) = match config.is_stochastic() {
            false => (
                Stock::PerPeriod(iproduct!(horizon(), m()).vars_with(lp, "K", |(_, m)| {
                    Ok(stock_bounds(initial_testers.get(m)?))
                })?),
                Stock::PerPeriod(iproduct!(horizon(), ha()).vars_with(lp, "KH", |(_, ha)| {
                    Ok(stock_bounds(initial_handlers.get(ha)?))
                })?),
            ),
            true => (
                Stock::HereAndNow(m().vars_with(lp, "K", |m| {
                    Ok(here_and_now_bounds(initial_testers.get(m)?))
                })?),
                Stock::HereAndNow(ha().vars_with(lp, "KH", |ha| {
                    Ok(here_and_now_bounds(initial_handlers.get(ha)?))
                })?),
            ),
        };

        let F = iproduct!(s(), horizon()).free(lp, "F")?;
        let X = iproduct!(p(), m(), sets.Z.iter().copied()).integer(
            lp,
            "X",
            config.acquisition_limit,
        )?;
        let XH = iproduct!(p(), ha(), sets.Zh.iter().copied())
            .map(|(p, (h, a), z)| (p, h, a, z))
            .integer(lp, "XH", config.acquisition_limit)?;
        let Q = iproduct!(s(), p(), m(), t()).cont(lp, "Q")?;
        let QH = iproduct!(s(), p(), m(), ha(), t())
            .map(|(s, p, m, (h, a), t)| (s, p, m, h, a, t))
            .cont(lp, "QH")?;

        let S = iproduct!(s(), horizon(), t()).free(lp, "S")?;
        let S_pos = iproduct!(s(), horizon(), t()).cont(lp, "S_pos")?;
        let S_neg = iproduct!(s(), horizon(), t()).cont(lp, "S_neg")?;
        let y = iproduct!(s(), horizon(), t()).binary(lp, "y")?;
        let V = iproduct!(s(), p(), t()).free(lp, "V")?;

        let variables = Variables {
            F,
            K,
            KH,
            X,
            XH,
            Q,
            QH,
            S,
            S_pos,
            S_neg,
            y,
            V,
        };
        variables.log_sizes();
        Ok(variables)
    }

    fn log_sizes(&self) {
        debug!("{}: {} variables", self.F.name(), self.F.len());
        debug!("{}: {} variables", self.K.name(), self.K.len());
        debug!("{}: {} variables", self.KH.name(), self.KH.len());
        debug!("{}: {} variables", self.X.name(), self.X.len());
        debug!("{}: {} variables", self.XH.name(), self.XH.len());
        debug!("{}: {} variables", self.Q.name(), self.Q.len());
        debug!("{}: {} variables", self.QH.name(), self.QH.len());
        debug!("{}: {} variables", self.S.name(), self.S.len());
        debug!("{}: {} variables", self.S_pos.name(), self.S_pos.len());
        debug!("{}: {} variables", self.S_neg.name(), self.S_neg.len());
        debug!("{}: {} variables", self.y.name(), self.y.len());
        debug!("{}: {} variables", self.V.name(), self.V.len());
    }
}
