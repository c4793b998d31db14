pub mod capacity;
pub mod lp;
pub mod utils;

pub use capacity::CapacityModel;
