//! Tester and handler capacity planning: a multi-period MILP choosing equipment
//! stock, acquisitions and production under capital and capacity loading constraints.

pub mod constraints;
pub mod model;
pub mod objective;
pub mod scenarios;
pub mod sets_and_parameters;
pub mod variables;

pub use constraints::{ConstraintGenerator, LoadingBounds};
pub use model::{CapacityModel, Plan};
pub use scenarios::{Distribution, Scenario, ScenarioConfig};
pub use sets_and_parameters::{Extracted, Parameters, Sets};
pub use variables::{Stock, Variables};
