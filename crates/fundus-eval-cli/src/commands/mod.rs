//! CLI subcommand implementations.

pub mod baselines;
pub mod batch;
pub mod leaderboards;
pub mod single;
