//! Rate adaptation for IEEE 802.11ax with a particle filter.
//!
//! [`WifiParticleFilter`] tracks the channel condition `theta = SINR - P_tx`
//! (in dB) of a link with a [`ParticleFilter`](reinforced_core::particle_filter::ParticleFilter).
//! Each update folds the numbers of successful and failed transmissions at
//! the chosen MCS into the particle weights; each decision draws one particle
//! and picks the MCS maximizing the expected data rate at that channel
//! condition.
//!
//! ```no_run
//! use reinforced_core::{Agent, Configurable, PrngKey};
//! use reinforced_wifi::{ParticleFilterConfig, TxContextObs, TxOutcomeObs, WifiParticleFilter};
//!
//! # fn main() -> anyhow::Result<()> {
//! let agent = WifiParticleFilter::build(ParticleFilterConfig::new(16.0))?;
//! let (init_key, key) = PrngKey::new(42).split();
//! let state = agent.init(init_key)?;
//! let (update_key, sample_key) = key.split();
//!
//! let outcome = TxOutcomeObs {
//!     action: 5,
//!     n_successful: 9,
//!     n_failed: 1,
//!     delta_time: 0.05,
//!     power: 16.0,
//!     cw: 15,
//! };
//! let state = agent.update(&state, update_key, &outcome)?;
//!
//! let context = TxContextObs {
//!     power: 16.0,
//!     rates: vec![7.3, 14.6, 21.9, 29.3, 43.9, 58.5, 65.8, 73.1, 87.8, 97.5, 109.7, 121.9],
//! };
//! let mcs = agent.sample(&state, sample_key, &context)?;
//! # Ok(())
//! # }
//! ```
mod base;
mod config;
mod model;
mod obs;
pub use base::WifiParticleFilter;
pub use config::ParticleFilterConfig;
pub use model::{WifiModel, MCS_SNR_THRESHOLDS, N_MCS};
pub use obs::{TxContextObs, TxOutcomeObs};
