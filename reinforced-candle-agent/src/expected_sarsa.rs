//! Expected SARSA agent.
mod base;
mod config;
pub use base::ExpectedSarsa;
pub use config::ExpectedSarsaConfig;
