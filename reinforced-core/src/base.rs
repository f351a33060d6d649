//! Core functionalities.
mod agent;
mod observation;
mod policy;
mod space;
pub use agent::Agent;
pub use observation::{ObsValue, Observation};
pub use policy::Configurable;
pub use space::{ElemType, Space, SpaceDict};
