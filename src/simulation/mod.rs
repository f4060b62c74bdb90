pub mod config;
pub mod disruption;
pub mod engine;
pub mod experiment;
