pub mod normalizer;
pub mod pricing;
pub mod storage;
