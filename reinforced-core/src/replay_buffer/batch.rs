//! Batch of transitions.
use ndarray::{Array1, Array2};

/// Transitions sampled from a [`ReplayBuffer`](super::ReplayBuffer), stored column-wise.
///
/// Row `i` of every column belongs to the same transition.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    /// Environment states `s_t`, one flattened state per row.
    pub obs: Array2<f32>,

    /// Actions `a_t`.
    pub act: Array1<i64>,

    /// Rewards `r_t`.
    pub reward: Array1<f32>,

    /// Terminal flags, `1` if the episode ended at `s_t+1`.
    pub is_terminated: Array1<i8>,

    /// Environment states `s_t+1`.
    pub next_obs: Array2<f32>,

    /// Buffer slots the rows were taken from.
    pub ix_sample: Vec<usize>,
}

impl Batch {
    /// Returns the number of transitions.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch has no transition.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }

    /// Returns `1 - is_terminated` as floats.
    pub fn not_terminated(&self) -> Vec<f32> {
        self.is_terminated.iter().map(|&d| 1f32 - d as f32).collect()
    }
}
