//! Experience replay.
//!
//! [`ReplayBuffer`] is a fixed-capacity FIFO store: once full, every insertion
//! evicts the single oldest experience. Sampling is uniform and without
//! replacement inside one draw; draws are independent of each other.

use std::collections::VecDeque;

use log::trace;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::error::{DqnError, Result};

/// One environment transition.
#[derive(Clone, Debug, PartialEq)]
pub struct Experience {
    pub state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub done: bool,
}

impl Experience {
    pub fn new(state: Array1<f32>, action: usize, reward: f32, next_state: Array1<f32>, done: bool) -> Self {
        Experience { state, action, reward, next_state, done }
    }
}

/// A minibatch collated into parallel arrays, one row per experience.
#[derive(Clone, Debug, PartialEq)]
pub struct ExperienceBatch {
    /// `(batch, state_size)`
    pub states: Array2<f32>,
    pub actions: Vec<usize>,
    pub rewards: Array1<f32>,
    /// `(batch, state_size)`
    pub next_states: Array2<f32>,
    /// `1.0` for terminal transitions, `0.0` otherwise
    pub dones: Array1<f32>,
}

impl ExperienceBatch {
    /// Stack experiences row by row. All states must share one length.
    pub fn collate(experiences: &[&Experience]) -> Result<Self> {
        let first = experiences
            .first()
            .ok_or_else(|| DqnError::invalid_parameter("experiences", "cannot collate an empty batch"))?;
        let batch_size = experiences.len();
        let state_size = first.state.len();

        let mut states = Array2::zeros((batch_size, state_size));
        let mut next_states = Array2::zeros((batch_size, state_size));
        let mut actions = Vec::with_capacity(batch_size);
        let mut rewards = Array1::zeros(batch_size);
        let mut dones = Array1::zeros(batch_size);

        for (i, exp) in experiences.iter().enumerate() {
            if exp.state.len() != state_size || exp.next_state.len() != state_size {
                return Err(DqnError::dimension_mismatch(
                    format!("state length {}", state_size),
                    format!("{} / {} in row {}", exp.state.len(), exp.next_state.len(), i),
                ));
            }
            states.row_mut(i).assign(&exp.state);
            next_states.row_mut(i).assign(&exp.next_state);
            actions.push(exp.action);
            rewards[i] = exp.reward;
            dones[i] = if exp.done { 1.0 } else { 0.0 };
        }

        Ok(ExperienceBatch { states, actions, rewards, next_states, dones })
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Fixed-size buffer to store experience tuples.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<Experience>,
    capacity: usize,
    rng: StdRng,
}

impl ReplayBuffer {
    /// Buffer drawing its samples from `rng`.
    pub fn new(capacity: usize, rng: StdRng) -> Result<Self> {
        if capacity == 0 {
            return Err(DqnError::invalid_parameter("capacity", "must be greater than 0"));
        }
        Ok(ReplayBuffer {
            // Large capacities grow on demand instead of reserving up front.
            buffer: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
            rng,
        })
    }

    pub fn with_seed(capacity: usize, seed: u64) -> Result<Self> {
        Self::new(capacity, StdRng::seed_from_u64(seed))
    }

    pub fn add(&mut self, experience: Experience) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
            trace!("replay buffer full ({}), evicted oldest experience", self.capacity);
        }
        self.buffer.push_back(experience);
    }

    pub fn push(&mut self, state: Array1<f32>, action: usize, reward: f32, next_state: Array1<f32>, done: bool) {
        self.add(Experience::new(state, action, reward, next_state, done));
    }

    fn sample_indices(&mut self, batch_size: usize) -> Result<Vec<usize>> {
        if batch_size == 0 {
            return Err(DqnError::invalid_parameter("batch_size", "must be greater than 0"));
        }
        if batch_size > self.buffer.len() {
            return Err(DqnError::InsufficientData {
                requested: batch_size,
                available: self.buffer.len(),
            });
        }
        Ok(index::sample(&mut self.rng, self.buffer.len(), batch_size).into_vec())
    }

    /// Draw `batch_size` distinct experiences uniformly at random.
    pub fn sample_experiences(&mut self, batch_size: usize) -> Result<Vec<&Experience>> {
        let indices = self.sample_indices(batch_size)?;
        Ok(indices.into_iter().map(|i| &self.buffer[i]).collect())
    }

    /// Draw `batch_size` distinct experiences and collate them for batched processing.
    pub fn sample(&mut self, batch_size: usize) -> Result<ExperienceBatch> {
        let experiences = self.sample_experiences(batch_size)?;
        ExperienceBatch::collate(&experiences)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored experiences from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Experience> {
        self.buffer.iter()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
