/// Simulation clock for tick management.
pub mod clock;
pub mod engine;
/// Threshold override windows.
pub mod event;
pub mod kpi;
/// Swap decision policies.
pub mod policy;
/// Time-varying threshold scheduling.
pub mod schedule;
pub mod station;
pub mod types;
