//! Fixed-capacity replay buffer with uniform batched sampling.
mod base;
mod batch;
mod config;
pub use base::{ReplayBuffer, Transition};
pub use batch::Batch;
pub use config::ReplayBufferConfig;
