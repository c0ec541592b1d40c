//! Falcon-Intel: OSINT aggregation and threat scoring.

pub mod config;
pub mod core;
pub mod pipeline;
pub mod simulation;
pub mod sources;
