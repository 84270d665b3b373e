pub mod backend;
pub mod config;
pub mod cost;
pub mod formatter;
pub mod models;
pub mod report;
pub mod workflow;
