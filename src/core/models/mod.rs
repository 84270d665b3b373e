pub mod cost;
pub mod status;
pub mod task;
pub mod usage;
