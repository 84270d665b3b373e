pub mod config_cmd;
pub mod output;
pub mod pricing_cmd;
pub mod renderer;
pub mod report_cmd;
