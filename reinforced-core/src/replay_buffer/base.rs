//! Ring buffer of transitions.
use super::{Batch, ReplayBufferConfig};
use crate::{error::RlError, PrngKey};
use anyhow::Result;
use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One environment interaction `(s_t, a_t, r_t, terminal, s_t+1)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// Environment state `s_t`.
    pub obs: Vec<f32>,

    /// Action `a_t`.
    pub act: i64,

    /// Reward `r_t`.
    pub reward: f32,

    /// `true` if the episode ended at `s_t+1`.
    pub is_terminated: bool,

    /// Environment state `s_t+1`.
    pub next_obs: Vec<f32>,
}

/// A fixed-capacity ring buffer of transitions.
///
/// Transitions are written at a cursor advancing modulo `capacity`; once the
/// buffer is full the oldest transition is overwritten. The buffer is a plain
/// value: [`ReplayBuffer::append`] consumes it and returns the updated one, so
/// a copy held elsewhere never changes behind its owner's back.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ReplayBuffer {
    capacity: usize,
    batch_size: usize,
    obs_shape: Vec<usize>,

    // Next slot to be written.
    i: usize,

    // Number of populated slots, saturating at `capacity`.
    size: usize,

    obs: Array2<f32>,
    act: Array1<i64>,
    reward: Array1<f32>,
    is_terminated: Array1<i8>,
    next_obs: Array2<f32>,
}

impl ReplayBuffer {
    /// Allocates an empty buffer.
    pub fn build(config: &ReplayBufferConfig) -> Result<Self> {
        config.validate()?;
        let capacity = config.capacity;
        let obs_dim = config.obs_dim();

        Ok(Self {
            capacity,
            batch_size: config.batch_size,
            obs_shape: config.obs_shape.clone(),
            i: 0,
            size: 0,
            obs: Array2::zeros((capacity, obs_dim)),
            act: Array1::zeros(capacity),
            reward: Array1::zeros(capacity),
            is_terminated: Array1::zeros(capacity),
            next_obs: Array2::zeros((capacity, obs_dim)),
        })
    }

    /// The maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of transitions in a sampled batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Shape of an environment state.
    pub fn obs_shape(&self) -> &[usize] {
        &self.obs_shape
    }

    /// The number of transitions currently held.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if no transition has been written.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns `true` if enough transitions are held to sample a full batch.
    ///
    /// This is the only predicate deciding whether learning happens.
    pub fn is_ready(&self) -> bool {
        self.size >= self.batch_size
    }

    /// Writes a transition at the cursor and returns the updated buffer.
    pub fn append(
        mut self,
        obs: &[f32],
        act: i64,
        reward: f32,
        is_terminated: bool,
        next_obs: &[f32],
    ) -> Result<Self> {
        let obs_dim = self.obs.ncols();
        if obs.len() != obs_dim {
            return Err(RlError::invalid_field(
                "state",
                format!("expected {} values, got {}", obs_dim, obs.len()),
            )
            .into());
        }
        if next_obs.len() != obs_dim {
            return Err(RlError::invalid_field(
                "next_state",
                format!("expected {} values, got {}", obs_dim, next_obs.len()),
            )
            .into());
        }

        let i = self.i;
        self.obs.row_mut(i).assign(&ArrayView1::from(obs));
        self.act[i] = act;
        self.reward[i] = reward;
        self.is_terminated[i] = is_terminated as i8;
        self.next_obs.row_mut(i).assign(&ArrayView1::from(next_obs));

        self.i = (self.i + 1) % self.capacity;
        self.size = (self.size + 1).min(self.capacity);

        Ok(self)
    }

    /// Draws `batch_size` transitions uniformly with replacement from the populated slots.
    pub fn sample(&self, key: PrngKey) -> Result<Batch> {
        if self.size == 0 {
            return Err(RlError::EmptyBuffer.into());
        }

        let mut rng = key.rng();
        let ixs = (0..self.batch_size)
            .map(|_| rng.gen_range(0..self.size))
            .collect::<Vec<_>>();

        Ok(Batch {
            obs: self.obs.select(Axis(0), &ixs),
            act: self.act.select(Axis(0), &ixs),
            reward: self.reward.select(Axis(0), &ixs),
            is_terminated: self.is_terminated.select(Axis(0), &ixs),
            next_obs: self.next_obs.select(Axis(0), &ixs),
            ix_sample: ixs,
        })
    }

    /// Returns the transition stored in slot `ix`, if populated.
    pub fn transition(&self, ix: usize) -> Option<Transition> {
        if ix >= self.size {
            return None;
        }

        Some(Transition {
            obs: self.obs.slice(s![ix, ..]).to_vec(),
            act: self.act[ix],
            reward: self.reward[ix],
            is_terminated: self.is_terminated[ix] == 1,
            next_obs: self.next_obs.slice(s![ix, ..]).to_vec(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn config(capacity: usize, batch_size: usize) -> ReplayBufferConfig {
        ReplayBufferConfig::default()
            .capacity(capacity)
            .batch_size(batch_size)
            .obs_shape(vec![2])
    }

    fn push(buffer: ReplayBuffer, t: usize) -> ReplayBuffer {
        let x = t as f32;
        buffer
            .append(&[x, -x], t as i64, x, t % 2 == 0, &[x + 1.0, -x - 1.0])
            .unwrap()
    }

    #[test]
    fn test_invalid_config() {
        assert!(ReplayBuffer::build(&config(8, 8)).is_err());
        assert!(ReplayBuffer::build(&config(8, 0)).is_err());
        assert!(ReplayBuffer::build(&config(8, 4).obs_shape(vec![])).is_err());

        let err = ReplayBuffer::build(&config(4, 8)).unwrap_err();
        match err.downcast_ref::<RlError>() {
            Some(RlError::InvalidParameter { name, .. }) => assert_eq!(name, "capacity"),
            e => panic!("unexpected error: {:?}", e),
        }
    }

    #[test]
    fn test_bounds_and_fifo_eviction() {
        let mut buffer = ReplayBuffer::build(&config(5, 2)).unwrap();
        for t in 0..12 {
            buffer = push(buffer, t);
            assert!(buffer.len() <= 5);
            assert_eq!(buffer.len(), (t + 1).min(5));
            assert_eq!(buffer.is_ready(), buffer.len() >= 2);
        }

        // The five most recent transitions survive.
        let mut rewards = (0..5)
            .map(|ix| buffer.transition(ix).unwrap().reward as usize)
            .collect::<Vec<_>>();
        rewards.sort_unstable();
        assert_eq!(rewards, vec![7, 8, 9, 10, 11]);
        assert!(buffer.transition(5).is_none());
    }

    #[test]
    fn test_append_does_not_touch_other_copies() {
        let buffer = push(ReplayBuffer::build(&config(4, 2)).unwrap(), 0);
        let copy = buffer.clone();
        let buffer = push(buffer, 1);
        assert_eq!(copy.len(), 1);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_sample_empty_buffer() {
        let buffer = ReplayBuffer::build(&config(4, 2)).unwrap();
        assert!(!buffer.is_ready());
        let err = buffer.sample(PrngKey::new(0)).unwrap_err();
        assert_eq!(err.downcast_ref::<RlError>(), Some(&RlError::EmptyBuffer));
    }

    #[test]
    fn test_sample_only_populated_slots() {
        let mut buffer = ReplayBuffer::build(&config(100, 8)).unwrap();
        for t in 0..10 {
            buffer = push(buffer, t);
        }

        for seed in 0..50 {
            let batch = buffer.sample(PrngKey::new(seed)).unwrap();
            assert_eq!(batch.len(), 8);
            for (row, &ix) in batch.ix_sample.iter().enumerate() {
                assert!(ix < 10);
                let tr = buffer.transition(ix).unwrap();
                assert_eq!(batch.obs.row(row).to_vec(), tr.obs);
                assert_eq!(batch.next_obs.row(row).to_vec(), tr.next_obs);
                assert_eq!(batch.act[row], tr.act);
                assert_eq!(batch.reward[row], tr.reward);
                assert_eq!(batch.is_terminated[row] == 1, tr.is_terminated);
            }
        }
    }

    #[test]
    fn test_sample_is_deterministic() {
        let mut buffer = ReplayBuffer::build(&config(16, 4)).unwrap();
        for t in 0..16 {
            buffer = push(buffer, t);
        }
        let key = PrngKey::new(123);
        assert_eq!(buffer.sample(key).unwrap(), buffer.sample(key).unwrap());
    }

    #[test]
    fn test_append_rejects_wrong_shape() {
        let buffer = ReplayBuffer::build(&config(4, 2)).unwrap();
        let err = buffer
            .append(&[0.0], 0, 0.0, false, &[0.0, 0.0])
            .unwrap_err();
        match err.downcast_ref::<RlError>() {
            Some(RlError::InvalidField { name, .. }) => assert_eq!(name, "state"),
            e => panic!("unexpected error: {:?}", e),
        }
    }
}
