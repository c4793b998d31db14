//! A named mixed integer linear program on top of `good_lp`.
//!
//! Variables are allocated from [`ProblemVariables`] and combined into
//! [`Expression`]s with `good_lp`'s operators. Constraints keep the name of the
//! family and key they were generated for, which solver backends and the
//! solution checks report.

use std::collections::{HashMap, HashSet};
use std::fmt;

use derive_more::Display;
use good_lp::{constraint, variable, IntoAffineExpression, ProblemVariables, VariableDefinition};
use log::trace;

use crate::error::Error;

pub use good_lp::{Expression, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Continuous,
    Integer,
    Binary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub vtype: VarType,
    pub lb: f64,
    pub ub: f64,
}

impl VarDef {
    /// The `good_lp` declaration of this variable
    pub fn definition(&self) -> VariableDefinition {
        let def = variable().name(self.name.clone());
        let def = match self.vtype {
            VarType::Binary => return def.binary(),
            VarType::Integer => def.integer(),
            VarType::Continuous => def,
        };
        let def = match self.lb.is_finite() {
            true => def.min(self.lb),
            false => def,
        };
        match self.ub.is_finite() {
            true => def.max(self.ub),
            false => def,
        }
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    #[display(fmt = "<=")]
    Le,
    #[display(fmt = ">=")]
    Ge,
    #[display(fmt = "==")]
    Eq,
}

/// `expr (sense) 0`, the unnamed body of a constraint
#[derive(Debug, Clone)]
pub struct Relation {
    expr: Expression,
    sense: Sense,
}

/// Relates two affine expressions. Both sides are moved into a single expression compared to zero.
pub trait Relate: IntoAffineExpression + Sized {
    fn at_most(self, rhs: impl IntoAffineExpression) -> Relation {
        Relation {
            expr: self.into_expression() - rhs.into_expression(),
            sense: Sense::Le,
        }
    }

    fn at_least(self, rhs: impl IntoAffineExpression) -> Relation {
        Relation {
            expr: self.into_expression() - rhs.into_expression(),
            sense: Sense::Ge,
        }
    }

    fn equals(self, rhs: impl IntoAffineExpression) -> Relation {
        Relation {
            expr: self.into_expression() - rhs.into_expression(),
            sense: Sense::Eq,
        }
    }
}

impl<T: IntoAffineExpression + Sized> Relate for T {}

/// A named linear constraint `Σ coef·var (sense) rhs`.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub name: String,
    pub expr: Expression,
    pub sense: Sense,
}

impl Constraint {
    /// The right hand side once the constant part of the expression is moved over
    pub fn rhs(&self) -> f64 {
        -self.expr.constant()
    }

    pub fn is_constant(&self) -> bool {
        IntoAffineExpression::linear_coefficients(&self.expr)
            .all(|(_, coef)| coef == 0.0)
    }

    /// `values` must hold every variable of the constraint.
    pub fn is_satisfied(&self, values: &HashMap<Variable, f64>, tolerance: f64) -> bool {
        let lhs = self.expr.clone().eval_with(values);
        match self.sense {
            Sense::Le => lhs <= tolerance,
            Sense::Ge => lhs >= -tolerance,
            Sense::Eq => lhs.abs() <= tolerance,
        }
    }

    /// The unnamed `good_lp` constraint
    pub fn to_constraint(&self) -> good_lp::Constraint {
        let expr = self.expr.clone();
        match self.sense {
            Sense::Le => constraint!(expr <= 0.0),
            Sense::Ge => constraint!(expr >= 0.0),
            Sense::Eq => constraint!(expr == 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjSense {
    Minimize,
    Maximize,
}

/// Variables, named constraints and an objective.
pub struct LinearProgram {
    name: String,
    variables: ProblemVariables,
    defs: Vec<(Variable, VarDef)>,
    index: HashMap<Variable, usize>,
    constraints: Vec<Constraint>,
    constraint_names: HashSet<String>,
    objective: Expression,
    sense: ObjSense,
}

impl fmt::Debug for LinearProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearProgram")
            .field("name", &self.name)
            .field("variables", &"<ProblemVariables>")
            .field("defs", &format!("[{} variables]", self.defs.len()))
            .field("constraints", &format!("[{} constraints]", self.constraints.len()))
            .field("sense", &self.sense)
            .finish()
    }
}

impl LinearProgram {
    pub fn new(name: &str) -> Self {
        LinearProgram {
            name: name.to_string(),
            variables: ProblemVariables::new(),
            defs: Vec::new(),
            index: HashMap::new(),
            constraints: Vec::new(),
            constraint_names: HashSet::new(),
            objective: Expression::default(),
            sense: ObjSense::Maximize,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_var(&mut self, name: &str, vtype: VarType, lb: f64, ub: f64) -> Variable {
        let (lb, ub) = match vtype {
            VarType::Binary => (0.0, 1.0),
            _ => (lb, ub),
        };
        let def = VarDef {
            name: name.to_string(),
            vtype,
            lb,
            ub,
        };

        let var = self.variables.add(def.definition());
        self.index.insert(var, self.defs.len());
        self.defs.push((var, def));
        var
    }

    pub fn add_constr(&mut self, name: &str, relation: Relation) -> Result<(), Error> {
        if !self.constraint_names.insert(name.to_string()) {
            return Err(Error::DuplicateConstraint(name.to_string()));
        }

        trace!("{}: {:?} {} 0", name, relation.expr, relation.sense);
        self.constraints.push(Constraint {
            name: name.to_string(),
            expr: relation.expr,
            sense: relation.sense,
        });
        Ok(())
    }

    pub fn set_objective(&mut self, expr: impl IntoAffineExpression, sense: ObjSense) {
        self.objective = expr.into_expression();
        self.sense = sense;
    }

    /// A fresh set of `good_lp` variables for a solver backend. Variables are
    /// declared in the order they were added, so the handles of this program
    /// stay valid for it.
    pub fn problem_variables(&self) -> ProblemVariables {
        let mut variables = ProblemVariables::new();
        for (var, def) in &self.defs {
            let declared = variables.add(def.definition());
            debug_assert_eq!(declared, *var);
        }
        variables
    }

    pub fn var(&self, var: Variable) -> Option<&VarDef> {
        self.index.get(&var).map(|&i| &self.defs[i].1)
    }

    pub fn vars(&self) -> impl Iterator<Item = (Variable, &VarDef)> + '_ {
        self.defs.iter().map(|(var, def)| (*var, def))
    }

    pub fn num_vars(&self) -> usize {
        self.defs.len()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn num_constrs(&self) -> usize {
        self.constraints.len()
    }

    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    pub fn sense(&self) -> ObjSense {
        self.sense
    }

    /// Names of the constraints and variable bounds that `values` violate by more
    /// than `tolerance`. Variables without a value count as zero.
    pub fn violations(&self, values: &HashMap<Variable, f64>, tolerance: f64) -> Vec<String> {
        let values = self
            .vars()
            .map(|(var, _)| (var, values.get(&var).copied().unwrap_or(0.0)))
            .collect::<HashMap<_, _>>();

        let bounds = self.vars().filter_map(|(var, def)| {
            let x = values[&var];
            let integral = match def.vtype {
                VarType::Continuous => true,
                VarType::Integer | VarType::Binary => (x - x.round()).abs() <= tolerance,
            };
            match x >= def.lb - tolerance && x <= def.ub + tolerance && integral {
                true => None,
                false => Some(def.name.clone()),
            }
        });

        let constraints = self
            .constraints
            .iter()
            .filter(|c| !c.is_satisfied(&values, tolerance))
            .map(|c| c.name.clone());

        bounds.chain(constraints).collect()
    }
}
