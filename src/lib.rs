//! Discrete-time simulator of an electric-vehicle fleet sharing one
//! battery-swap station.

#[cfg(feature = "api")]
pub mod api;
pub mod benchmark;
pub mod config;
pub mod error;
/// Batteries, vehicles, and their identifiers.
pub mod fleet;
pub mod io;
/// Simulation engine, station, policies, and scheduling.
pub mod sim;
