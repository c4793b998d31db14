pub mod config;
pub mod error;
pub mod models;
pub mod problem;
pub mod repository;
pub mod scalars;
pub mod solver;
pub mod utils;

pub use config::{BigM, ModelConfig};
pub use error::{Error, ErrorKind};
pub use models::capacity::{CapacityModel, Parameters, Plan, Sets};
pub use repository::Repository;
pub use scalars::ScalarConfig;
