//! The seam between the model and the MILP solver that optimizes it. Every
//! backend is a `good_lp` solver, bundled microlp by default.

#[cfg(feature = "gurobi")]
mod gurobi;
mod microlp;

#[cfg(feature = "gurobi")]
pub use self::gurobi::Gurobi;
pub use self::microlp::MicroLp;

use std::collections::HashMap;

use derive_more::Display;

use crate::error::Error;
use crate::models::lp::{LinearProgram, Variable};

/// Termination status reported by a solver
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Status {
    #[display(fmt = "optimal")]
    Optimal,
    /// A solution was found, but optimality was not proven
    #[display(fmt = "feasible")]
    Feasible,
    #[display(fmt = "infeasible")]
    Infeasible,
    #[display(fmt = "unbounded")]
    Unbounded,
    #[display(fmt = "{}", _0)]
    Other(String),
}

impl Status {
    pub fn has_solution(&self) -> bool {
        matches!(self, Status::Optimal | Status::Feasible)
    }
}

/// The outcome of a successful solve: a value for every variable of the program
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: Status,
    pub objective: f64,
    values: HashMap<Variable, f64>,
}

impl Solution {
    pub fn new(status: Status, objective: f64, values: HashMap<Variable, f64>) -> Self {
        Solution {
            status,
            objective,
            values,
        }
    }

    pub fn value(&self, var: Variable) -> Option<f64> {
        self.values.get(&var).copied()
    }

    pub fn values(&self) -> &HashMap<Variable, f64> {
        &self.values
    }
}

/// A MILP solver. Statuses without a solution are returned as [`Error::SolverStatus`].
pub trait Solver {
    fn name(&self) -> &'static str;

    fn solve(&self, lp: &LinearProgram) -> Result<Solution, Error>;
}

/// The solver the binary was built with
pub fn default_solver(threads: i32) -> Box<dyn Solver> {
    #[cfg(feature = "gurobi")]
    {
        Box::new(Gurobi::new(threads))
    }
    #[cfg(not(feature = "gurobi"))]
    {
        let _ = threads;
        Box::new(MicroLp::default())
    }
}
