//! DQN agent.
mod base;
mod config;
pub use base::{Dqn, DqnState};
pub use config::DqnConfig;
