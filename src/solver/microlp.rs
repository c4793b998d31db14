use std::collections::HashMap;

use good_lp::solvers::microlp::microlp;
use good_lp::{ResolutionError, Solution as _, SolverModel};
use log::{debug, info, warn};

use super::{Solution, Solver, Status};
use crate::error::Error;
use crate::models::lp::{LinearProgram, ObjSense, Variable};

/// The bundled pure-Rust branch and bound solver. Single threaded.
#[derive(Debug, Default, Clone, Copy)]
pub struct MicroLp;

fn status(err: ResolutionError) -> Error {
    let status = match err {
        ResolutionError::Infeasible => Status::Infeasible,
        ResolutionError::Unbounded => Status::Unbounded,
        other => Status::Other(other.to_string()),
    };
    Error::SolverStatus(status)
}

impl Solver for MicroLp {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, lp: &LinearProgram) -> Result<Solution, Error> {
        info!(
            "Solving {} with microlp: {} variables, {} constraints",
            lp.name(),
            lp.num_vars(),
            lp.num_constrs()
        );

        let objective = lp.objective().clone();
        let unsolved = match lp.sense() {
            ObjSense::Maximize => lp.problem_variables().maximise(objective),
            ObjSense::Minimize => lp.problem_variables().minimise(objective),
        };
        let mut model = unsolved.using(microlp);

        for c in lp.constraints() {
            if c.is_constant() {
                if !c.is_satisfied(&HashMap::new(), 1e-9) {
                    warn!("constraint {} has no variables and cannot hold", c.name);
                    return Err(Error::SolverStatus(Status::Infeasible));
                }
                continue;
            }
            model.add_constraint(c.to_constraint());
        }

        let solved = model.solve().map_err(status)?;

        let values = lp
            .vars()
            .map(|(var, _)| (var, solved.value(var)))
            .collect::<HashMap<Variable, f64>>();
        let objective = lp.objective().clone().eval_with(&values);
        debug!("microlp objective: {}", objective);

        Ok(Solution::new(Status::Optimal, objective, values))
    }
}
