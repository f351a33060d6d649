#![warn(missing_docs)]
//! Core abstractions of reinforced.
//!
//! * [`Agent`]: the protocol every decision algorithm implements. State is an
//!   explicit value threaded through `init`, `update` and `sample`, and every
//!   stochastic call consumes a [`PrngKey`].
//! * [`replay_buffer`]: a fixed-capacity ring buffer of transitions.
//! * [`particle_filter`]: sequential Monte Carlo estimation of a latent scalar.
//! * [`record`]: records of observations, states and metrics, and their sinks.
//! * [`Runner`]: binds an agent to its state and a key stream.
pub mod error;
pub mod particle_filter;
pub mod record;
pub mod replay_buffer;
pub mod util;

mod base;
pub use base::{Agent, Configurable, ElemType, ObsValue, Observation, Space, SpaceDict};

mod rng;
pub use rng::PrngKey;

mod runner;
pub use runner::Runner;
