pub mod aggregator;
pub mod assembler;
pub mod charts;
