use itertools::iproduct;
use log::{info, warn};

use crate::error::Error;
use crate::problem::{
    CategoryId, ChannelId, HandlerId, Key, Period, PeriodId, ProductId, TesterId,
};
use crate::repository::{self, Param, Repository};
use crate::scalars::{self, ScalarConfig};

#[derive(Debug, Clone)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of planning periods, ascending
    pub P: Vec<PeriodId>,
    /// Set of tester types
    pub M: Vec<TesterId>,
    /// Set of handler categories
    pub H: Vec<CategoryId>,
    /// Set of handler instances, numbered within every category
    pub A: Vec<HandlerId>,
    /// Set of products
    pub T: Vec<ProductId>,
    /// Set of tester acquisition channels
    pub Z: Vec<ChannelId>,
    /// Set of handler acquisition channels
    pub Zh: Vec<ChannelId>,
}

impl Sets {
    pub fn new(repo: &Repository) -> Result<Sets, Error> {
        let sets = Sets {
            P: repo.table(repository::PRODUCT_PROFIT)?.distinct("p")?,
            M: repo.table(repository::TESTER_INITIAL_PRICE)?.distinct("m")?,
            H: repo.table(repository::HANDLER_THROUGHPUT)?.distinct("h")?,
            A: repo.table(repository::HANDLER_SALVAGE_PRICE)?.distinct("a")?,
            T: repo.table(repository::PRODUCT_PROFIT)?.distinct("t")?,
            Z: repo.table(repository::TESTER_BORROW_PRICE)?.distinct("z")?,
            Zh: repo.table(repository::HANDLER_BORROW_PRICE)?.distinct("z")?,
        };

        info!(
            "{} periods, {} testers, {} handler categories, {} handlers, {} products, \
             {}/{} channels",
            sets.P.len(),
            sets.M.len(),
            sets.H.len(),
            sets.A.len(),
            sets.T.len(),
            sets.Z.len(),
            sets.Zh.len()
        );
        Ok(sets)
    }

    /// The boundary state followed by every planning period
    pub fn horizon(&self) -> Vec<Period> {
        std::iter::once(Period::Initial)
            .chain(self.P.iter().map(|&p| Period::Planning(p)))
            .collect()
    }

    /// Every planning period paired with the state it follows
    pub fn transitions(&self) -> impl Iterator<Item = (Period, PeriodId)> + '_ {
        let previous = self.horizon();
        self.P.iter().zip(previous).map(|(&p, prev)| (prev, p))
    }

    /// The final period, or the boundary state for an empty horizon
    pub fn last_period(&self) -> Period {
        self.P.last().map_or(Period::Initial, |&p| Period::Planning(p))
    }

    /// Every (category, instance) pair
    pub fn handler_pairs(&self) -> Vec<(CategoryId, HandlerId)> {
        iproduct!(self.H.iter().copied(), self.A.iter().copied()).collect()
    }
}

/// A value derived from the scalar text, unset when the text did not define its label.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<T> {
    label: &'static str,
    value: Option<T>,
}

impl<T> Extracted<T> {
    fn new(label: &'static str, value: Option<T>) -> Self {
        Extracted { label, value }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub fn get(&self) -> Result<&T, Error> {
        self.value
            .as_ref()
            .ok_or(Error::MissingScalar { label: self.label })
    }
}

impl<K: Key> Extracted<Param<K>> {
    pub fn at(&self, key: K) -> Result<f64, Error> {
        self.get()?.get(key)
    }
}

/// Pairs the entries of a positional list with the sorted index set it refers to
fn by_position<K: Key>(
    name: &str,
    label: &'static str,
    list: &[f64],
    keys: &[K],
) -> Result<Param<K>, Error> {
    if list.len() != keys.len() {
        return Err(Error::ListLength {
            label,
            expected: keys.len(),
            actual: list.len(),
        });
    }
    Ok(Param::new(name, keys.iter().copied().zip(list.iter().copied())))
}

#[derive(Debug, Clone)]
pub struct Parameters {
    /// Purchase price of a tester
    pub tester_initial_price: Param<TesterId>,
    /// Resale value of a tester at the end of the horizon
    pub tester_salvage_price: Param<TesterId>,
    /// Unit price of acquiring a tester through a channel in a period
    pub tester_borrow_price: Param<(PeriodId, TesterId, ChannelId)>,
    /// Units of product a tester produces per unit of production
    pub tester_ability: Param<(TesterId, ProductId)>,
    /// Production per work hour of a tester
    pub tester_throughput: Param<(TesterId, ProductId)>,
    pub handler_initial_price: Param<(CategoryId, HandlerId)>,
    pub handler_salvage_price: Param<(CategoryId, HandlerId)>,
    pub handler_borrow_price: Param<(PeriodId, CategoryId, HandlerId, ChannelId)>,
    /// Ability of a handler when serving a tester on a product
    pub handler_ability: Param<(TesterId, CategoryId, HandlerId, ProductId)>,
    pub handler_throughput: Param<(TesterId, CategoryId, HandlerId, ProductId)>,
    /// Profit per unit of product sold
    pub profit: Param<(PeriodId, ProductId)>,
    /// Demand drawn from the capacity loading every period
    pub demand_mts: Param<(PeriodId, ProductId)>,
    /// Demand capping production every period. Read from the same table as `demand_mts`.
    pub demand_mto: Param<(PeriodId, ProductId)>,
    pub interest_rate: Extracted<Param<PeriodId>>,
    /// Cost per unit of excess capacity loading
    pub excess_cost: Extracted<Param<(PeriodId, ProductId)>>,
    /// Cost per unit of capacity loading shortage
    pub shortage_cost: Extracted<Param<(PeriodId, ProductId)>>,
    pub tester_util: Extracted<Param<(PeriodId, TesterId)>>,
    pub handler_util: Extracted<Param<(PeriodId, CategoryId, HandlerId)>>,
    pub tester_work_hours: Extracted<Param<(PeriodId, TesterId)>>,
    pub handler_work_hours: Extracted<Param<(PeriodId, CategoryId, HandlerId)>>,
    pub initial_testers: Extracted<Param<TesterId>>,
    pub initial_handlers: Extracted<Param<(CategoryId, HandlerId)>>,
    pub initial_capital: Extracted<f64>,
    pub initial_loading: Extracted<Param<ProductId>>,
}

impl Parameters {
    pub fn new(
        repo: &Repository,
        scalars: &ScalarConfig,
        sets: &Sets,
    ) -> Result<Parameters, Error> {
        let table = |name| repo.table(name);

        let demand = table(repository::DEMANDS)?.param(&["p", "t"], "demand")?;
        info!("{} supplies both make-to-stock and make-to-order demand", repository::DEMANDS);
        let profit = table(repository::PRODUCT_PROFIT)?.param(&["p", "t"], "profit")?;

        let tester_periods =
            iproduct!(sets.P.iter().copied(), sets.M.iter().copied()).collect::<Vec<_>>();
        let handler_periods = iproduct!(sets.P.iter().copied(), sets.handler_pairs())
            .map(|(p, (h, a))| (p, h, a))
            .collect::<Vec<_>>();

        let per_tester = |name: &str, value: Option<f64>| {
            value.map(|v| Param::broadcast(name, tester_periods.iter().copied(), v))
        };
        let per_handler = |name: &str, value: Option<f64>| {
            value.map(|v| Param::broadcast(name, handler_periods.iter().copied(), v))
        };

        let initial_testers = scalars
            .initial_testers
            .as_ref()
            .map(|list| by_position("initial_testers", scalars::INITIAL_TESTERS, list, &sets.M))
            .transpose()?;
        let initial_handlers = scalars
            .initial_handlers
            .as_ref()
            .map(|list| {
                by_position("initial_handlers", scalars::INITIAL_HANDLERS, list, &sets.A).map(
                    |per_instance| {
                        let per_instance = per_instance.iter().collect::<Vec<_>>();
                        Param::new(
                            "initial_handlers",
                            iproduct!(sets.H.iter().copied(), per_instance)
                                .map(|(h, (a, k))| ((h, a), k)),
                        )
                    },
                )
            })
            .transpose()?;
        let initial_loading = scalars
            .initial_loading
            .as_ref()
            .map(|list| by_position("initial_loading", scalars::INITIAL_LOADING, list, &sets.T))
            .transpose()?;

        Ok(Parameters {
            tester_initial_price: table(repository::TESTER_INITIAL_PRICE)?
                .param(&["m"], "initial_price")?,
            tester_salvage_price: table(repository::TESTER_SALVAGE_PRICE)?
                .param(&["m"], "salvage_price")?,
            tester_borrow_price: table(repository::TESTER_BORROW_PRICE)?
                .param(&["p", "m", "z"], "price")?,
            tester_ability: table(repository::TESTER_ABILITY)?.param(&["m", "t"], "ability")?,
            tester_throughput: table(repository::TESTER_THROUGHPUT)?
                .param(&["m", "t"], "throughput")?,
            handler_initial_price: table(repository::HANDLER_INITIAL_PRICE)?
                .param(&["h", "a"], "initial_price")?,
            handler_salvage_price: table(repository::HANDLER_SALVAGE_PRICE)?
                .param(&["h", "a"], "salvage_price")?,
            handler_borrow_price: table(repository::HANDLER_BORROW_PRICE)?
                .param(&["p", "h", "a", "z"], "price")?,
            handler_ability: table(repository::HANDLER_ABILITY)?
                .param(&["m", "h", "a", "t"], "ability")?,
            handler_throughput: table(repository::HANDLER_THROUGHPUT)?
                .param(&["m", "h", "a", "t"], "throughput")?,
            interest_rate: Extracted::new(
                scalars::INTEREST_RATE,
                scalars
                    .interest_rate
                    .map(|r| Param::broadcast("interest_rate", sets.P.iter().copied(), r)),
            ),
            excess_cost: Extracted::new(
                scalars::EXCESS_MULTIPLIER,
                scalars.excess_multiplier.map(|f| profit.scale("excess_cost", f)),
            ),
            shortage_cost: Extracted::new(
                scalars::SHORTAGE_MULTIPLIER,
                scalars.shortage_multiplier.map(|f| profit.scale("shortage_cost", f)),
            ),
            tester_util: Extracted::new(
                scalars::UTILIZATION,
                per_tester("tester_util", scalars.utilization),
            ),
            handler_util: Extracted::new(
                scalars::UTILIZATION,
                per_handler("handler_util", scalars.utilization),
            ),
            tester_work_hours: Extracted::new(
                scalars::WORK_HOURS,
                per_tester("tester_work_hours", scalars.work_hours),
            ),
            handler_work_hours: Extracted::new(
                scalars::WORK_HOURS,
                per_handler("handler_work_hours", scalars.work_hours),
            ),
            initial_testers: Extracted::new(scalars::INITIAL_TESTERS, initial_testers),
            initial_handlers: Extracted::new(scalars::INITIAL_HANDLERS, initial_handlers),
            initial_capital: Extracted::new(scalars::INITIAL_CAPITAL, scalars.initial_capital),
            initial_loading: Extracted::new(scalars::INITIAL_LOADING, initial_loading),
            demand_mts: Param::new("demand_mts", demand.iter()),
            demand_mto: Param::new("demand_mto", demand.iter()),
            profit,
        })
    }

    /// Checks that every parameter has a value over its whole index domain and
    /// that every scalar was extracted.
    pub fn ensure_complete(&self, sets: &Sets) -> Result<(), Error> {
        let m = || sets.M.iter().copied();
        let p = || sets.P.iter().copied();
        let t = || sets.T.iter().copied();
        let ha = || sets.handler_pairs().into_iter();

        let gaps = [
            (self.interest_rate.label(), self.interest_rate.is_set()),
            (self.excess_cost.label(), self.excess_cost.is_set()),
            (self.shortage_cost.label(), self.shortage_cost.is_set()),
            (self.tester_util.label(), self.tester_util.is_set()),
            (self.tester_work_hours.label(), self.tester_work_hours.is_set()),
            (self.initial_testers.label(), self.initial_testers.is_set()),
            (self.initial_handlers.label(), self.initial_handlers.is_set()),
            (self.initial_capital.label(), self.initial_capital.is_set()),
            (self.initial_loading.label(), self.initial_loading.is_set()),
        ];
        if let Some((label, _)) = gaps.iter().find(|(_, set)| !set) {
            warn!("scalar {} is required but was not extracted", label);
            return Err(Error::MissingScalar { label: *label });
        }

        self.tester_initial_price.ensure_total(m())?;
        self.tester_salvage_price.ensure_total(m())?;
        self.tester_borrow_price
            .ensure_total(iproduct!(p(), m(), sets.Z.iter().copied()))?;
        self.tester_ability.ensure_total(iproduct!(m(), t()))?;
        self.tester_throughput.ensure_total(iproduct!(m(), t()))?;

        self.handler_initial_price.ensure_total(ha())?;
        self.handler_salvage_price.ensure_total(ha())?;
        self.handler_borrow_price.ensure_total(
            iproduct!(p(), ha(), sets.Zh.iter().copied()).map(|(p, (h, a), z)| (p, h, a, z)),
        )?;
        let mhat = || iproduct!(m(), ha(), t()).map(|(m, (h, a), t)| (m, h, a, t));
        self.handler_ability.ensure_total(mhat())?;
        self.handler_throughput.ensure_total(mhat())?;

        self.profit.ensure_total(iproduct!(p(), t()))?;
        self.demand_mts.ensure_total(iproduct!(p(), t()))?;
        self.demand_mto.ensure_total(iproduct!(p(), t()))?;

        self.interest_rate.get()?.ensure_total(p())?;
        self.excess_cost.get()?.ensure_total(iproduct!(p(), t()))?;
        self.shortage_cost.get()?.ensure_total(iproduct!(p(), t()))?;
        self.initial_testers.get()?.ensure_total(m())?;
        self.initial_handlers.get()?.ensure_total(ha())?;
        self.initial_loading.get()?.ensure_total(t())?;
        Ok(())
    }
}
