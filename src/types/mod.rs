pub mod dataset;
pub mod period;
pub mod registry;
