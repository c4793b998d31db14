use std::collections::BTreeMap;
use std::fmt::Debug;
use std::ops::Range;

use crate::error::Error;
use crate::models::lp::{LinearProgram, VarType, Variable};
use crate::problem::Label;
use crate::solver::Solution;

/// All variables of one family, addressed by a typed index tuple.
#[derive(Debug, Clone)]
pub struct VarFamily<K> {
    name: String,
    vars: BTreeMap<K, Variable>,
}

impl<K: Label + Ord + Copy + Debug> VarFamily<K> {
    pub fn new(name: &str) -> Self {
        VarFamily {
            name: name.to_string(),
            vars: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds the variable `<name>_(<key>)` to `lp`. Each key can be declared once.
    pub fn declare(
        &mut self,
        lp: &mut LinearProgram,
        key: K,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Result<Variable, Error> {
        if self.vars.contains_key(&key) {
            return Err(Error::DuplicateVariable {
                family: self.name.clone(),
                key: key.label(),
            });
        }

        let var = lp.add_var(
            &format!("{}_({})", self.name, key.label()),
            vtype,
            bounds.start,
            bounds.end,
        );
        self.vars.insert(key, var);
        Ok(var)
    }

    pub fn get(&self, key: K) -> Result<Variable, Error> {
        self.vars
            .get(&key)
            .copied()
            .ok_or_else(|| Error::IndexDomain {
                family: self.name.clone(),
                key: key.label(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, Variable)> + '_ {
        self.vars.iter().map(|(&k, &v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

pub trait AddVars<K>: Sized {
    /// Create a variable per key, with type and bounds given by a closure
    fn vars_with<F>(
        self,
        lp: &mut LinearProgram,
        name: &str,
        func: F,
    ) -> Result<VarFamily<K>, Error>
    where
        F: FnMut(K) -> Result<(VarType, Range<f64>), Error>;

    /// Create a variable per key, all of the same type and bounds
    fn vars(
        self,
        lp: &mut LinearProgram,
        name: &str,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Result<VarFamily<K>, Error> {
        self.vars_with(lp, name, |_| Ok((vtype, bounds.clone())))
    }

    /// Binary variables
    fn binary(self, lp: &mut LinearProgram, name: &str) -> Result<VarFamily<K>, Error> {
        self.vars(lp, name, VarType::Binary, &(0.0..1.0))
    }

    /// A continuous non-negative variable
    fn cont(self, lp: &mut LinearProgram, name: &str) -> Result<VarFamily<K>, Error> {
        self.vars(lp, name, VarType::Continuous, &(0.0..f64::INFINITY))
    }

    /// A free continuous variable
    fn free(self, lp: &mut LinearProgram, name: &str) -> Result<VarFamily<K>, Error> {
        self.vars(
            lp,
            name,
            VarType::Continuous,
            &(f64::NEG_INFINITY..f64::INFINITY),
        )
    }

    /// A non-negative integer variable, optionally bounded above
    fn integer(
        self,
        lp: &mut LinearProgram,
        name: &str,
        limit: Option<u32>,
    ) -> Result<VarFamily<K>, Error> {
        let ub = limit.map_or(f64::INFINITY, f64::from);
        self.vars(lp, name, VarType::Integer, &(0.0..ub))
    }
}

impl<K, I> AddVars<K> for I
where
    K: Label + Ord + Copy + Debug,
    I: IntoIterator<Item = K>,
{
    fn vars_with<F>(
        self,
        lp: &mut LinearProgram,
        name: &str,
        mut func: F,
    ) -> Result<VarFamily<K>, Error>
    where
        F: FnMut(K) -> Result<(VarType, Range<f64>), Error>,
    {
        let mut family = VarFamily::new(name);
        for key in self {
            let (vtype, bounds) = func(key)?;
            family.declare(lp, key, vtype, &bounds)?;
        }
        Ok(family)
    }
}

/// Trait that reads the solution values of variables
pub trait ConvertVars {
    type Out;
    fn convert(&self, solution: &Solution) -> Result<Self::Out, Error>;
}

impl ConvertVars for Variable {
    type Out = f64;

    fn convert(&self, solution: &Solution) -> Result<Self::Out, Error> {
        solution.value(*self).ok_or_else(|| Error::IndexDomain {
            family: "solution".to_string(),
            key: format!("{:?}", self),
        })
    }
}

impl<T: ConvertVars> ConvertVars for Vec<T> {
    type Out = Vec<T::Out>;

    fn convert(&self, solution: &Solution) -> Result<Self::Out, Error> {
        self.iter().map(|e| e.convert(solution)).collect()
    }
}

impl<K: Label + Ord + Copy + Debug> ConvertVars for VarFamily<K> {
    type Out = BTreeMap<K, f64>;

    fn convert(&self, solution: &Solution) -> Result<Self::Out, Error> {
        self.iter()
            .map(|(k, v)| Ok((k, v.convert(solution)?)))
            .collect()
    }
}
