use std::collections::HashMap;

use good_lp::IntoAffineExpression;
use grb::{attr, c, expr::GurobiSum, param, Model, ModelSense, VarType as GrbVarType};
use log::info;

use super::{Solution, Solver, Status};
use crate::error::Error;
use crate::models::lp::{Expression, LinearProgram, ObjSense, Sense, VarType, Variable};

/// Solves through a local Gurobi installation.
#[derive(Debug, Clone, Copy)]
pub struct Gurobi {
    threads: i32,
}

impl Gurobi {
    pub fn new(threads: i32) -> Self {
        Gurobi { threads }
    }
}

fn other(err: grb::Error) -> Error {
    Error::SolverStatus(Status::Other(err.to_string()))
}

impl Gurobi {
    fn optimize(&self, lp: &LinearProgram) -> grb::Result<Result<Solution, Status>> {
        let mut model = Model::new(lp.name())?;
        model.set_param(param::OutputFlag, 0)?;
        model.set_param(param::Threads, self.threads)?;

        let mut vars = HashMap::with_capacity(lp.num_vars());
        for (var, def) in lp.vars() {
            let vtype = match def.vtype {
                VarType::Continuous => GrbVarType::Continuous,
                VarType::Integer => GrbVarType::Integer,
                VarType::Binary => GrbVarType::Binary,
            };
            let grb_var = model.add_var(&def.name, vtype, 0.0, def.lb, def.ub, std::iter::empty())?;
            vars.insert(var, grb_var);
        }
        model.update()?;

        let linear = |expr: &Expression| {
            IntoAffineExpression::linear_coefficients(expr)
                .map(|(v, coef)| coef * vars[&v])
                .grb_sum()
        };

        for constraint in lp.constraints() {
            let lhs = linear(&constraint.expr);
            let rhs = constraint.rhs();
            match constraint.sense {
                Sense::Le => model.add_constr(&constraint.name, c!(lhs <= rhs))?,
                Sense::Ge => model.add_constr(&constraint.name, c!(lhs >= rhs))?,
                Sense::Eq => model.add_constr(&constraint.name, c!(lhs == rhs))?,
            };
        }

        let objective = linear(lp.objective()) + lp.objective().constant();
        let sense = match lp.sense() {
            ObjSense::Maximize => ModelSense::Maximize,
            ObjSense::Minimize => ModelSense::Minimize,
        };
        model.set_objective(objective, sense)?;

        model.optimize()?;

        let status = match model.status()? {
            grb::Status::Optimal => Status::Optimal,
            grb::Status::Infeasible | grb::Status::InfOrUnbd => Status::Infeasible,
            grb::Status::Unbounded => Status::Unbounded,
            s if model.get_attr(attr::SolCount)? > 0 => {
                info!("gurobi stopped with status {:?} and a feasible solution", s);
                Status::Feasible
            }
            s => Status::Other(format!("{:?}", s)),
        };

        if !status.has_solution() {
            return Ok(Err(status));
        }

        let values = lp
            .vars()
            .map(|(var, _)| Ok((var, model.get_obj_attr(attr::X, &vars[&var])?)))
            .collect::<grb::Result<HashMap<Variable, f64>>>()?;
        let objective = model.get_attr(attr::ObjVal)?;

        Ok(Ok(Solution::new(status, objective, values)))
    }
}

impl Solver for Gurobi {
    fn name(&self) -> &'static str {
        "gurobi"
    }

    fn solve(&self, lp: &LinearProgram) -> Result<Solution, Error> {
        info!(
            "Solving {} with gurobi: {} variables, {} constraints, {} threads",
            lp.name(),
            lp.num_vars(),
            lp.num_constrs(),
            self.threads
        );

        self.optimize(lp)
            .map_err(other)?
            .map_err(Error::SolverStatus)
    }
}
