//! BDD step definitions for smokex-monitor

pub mod fixture_steps;
pub mod probe_steps;
pub mod series_steps;
