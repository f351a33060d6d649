//! Update protocol shared by the value-learning agents.
mod base;
mod snapshot;
mod state;
mod target;
pub use base::{UpdateInfo, ValueLearner};
pub use snapshot::TargetSnapshot;
pub use state::ValueState;
pub use target::{BootstrapTarget, ExpectedTarget, MaxTarget};
