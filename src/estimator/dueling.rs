use ndarray::{Array2, ArrayView2, ArrayViewD, Axis};
use rand::Rng;

use super::{Mode, ParamMut, ValueEstimator};
use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::layers::{DenseLayer, LayerTrait, Sequential};

/// Dueling action-value network.
///
/// A shared ReLU trunk feeds two linear heads: a scalar state value `V(s)` and
/// per-action advantages `A(s, a)`. They are recombined as
/// `Q(s, a) = V(s) + A(s, a) - mean_a A(s, a)`, which keeps the split identifiable.
#[derive(Clone)]
pub struct DuelingQNetwork {
    trunk: Sequential,
    value_head: DenseLayer,
    advantage_head: DenseLayer,
    state_size: usize,
    action_size: usize,
    mode: Mode,
}

impl DuelingQNetwork {
    pub fn new<R: Rng + ?Sized>(trunk_sizes: &[usize], action_size: usize, dropout: f32, rng: &mut R) -> Result<Self> {
        let trunk = Sequential::relu_trunk(trunk_sizes, dropout, rng)?;
        let state_size = trunk_sizes[0];
        let features = trunk_sizes.last().copied().unwrap_or(state_size);
        let value_head = DenseLayer::new(features, 1, Activation::Linear, rng);
        let advantage_head = DenseLayer::new(features, action_size, Activation::Linear, rng);
        Ok(DuelingQNetwork {
            trunk,
            value_head,
            advantage_head,
            state_size,
            action_size,
            mode: Mode::Training,
        })
    }

    /// State-value stream for a batch, `(batch, 1)`.
    pub fn state_values(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        let features = self.trunk.forward_batch(states, self.mode)?;
        self.value_head.forward_batch(features.view(), self.mode)
    }
}

fn row_mean(values: &Array2<f32>) -> Result<Array2<f32>> {
    values
        .mean_axis(Axis(1))
        .map(|mean| mean.insert_axis(Axis(1)))
        .ok_or_else(|| DqnError::dimension_mismatch("at least one action", "zero actions"))
}

impl ValueEstimator for DuelingQNetwork {
    fn state_size(&self) -> usize {
        self.state_size
    }

    fn action_size(&self) -> usize {
        self.action_size
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn forward(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        let features = self.trunk.forward_batch(states, self.mode)?;
        let values = self.value_head.forward_batch(features.view(), self.mode)?;
        let advantages = self.advantage_head.forward_batch(features.view(), self.mode)?;
        let centered = &advantages - &row_mean(&advantages)?;
        Ok(centered + &values)
    }

    fn backward(&mut self, output_grad: ArrayView2<f32>) -> Result<()> {
        if self.mode != Mode::Training {
            return Err(DqnError::TrainingError("backward() requires training mode".to_string()));
        }
        // dQ/dV sums over actions; dQ/dA removes the per-row mean of the incoming gradient.
        let value_grad = output_grad.sum_axis(Axis(1)).insert_axis(Axis(1));
        let output_grad = output_grad.to_owned();
        let advantage_grad = &output_grad - &row_mean(&output_grad)?;

        let from_value = self.value_head.backward_batch(value_grad.view())?;
        let from_advantage = self.advantage_head.backward_batch(advantage_grad.view())?;
        self.trunk.backward_batch((from_value + &from_advantage).view())?;
        Ok(())
    }

    fn parameters(&self) -> Vec<ArrayViewD<'_, f32>> {
        let mut params = self.trunk.parameters();
        params.extend(self.value_head.parameters());
        params.extend(self.advantage_head.parameters());
        params
    }

    fn parameters_mut(&mut self) -> Vec<ParamMut<'_>> {
        let DuelingQNetwork { trunk, value_head, advantage_head, .. } = self;
        let mut params = trunk.parameters_mut();
        params.extend(value_head.parameters_mut());
        params.extend(advantage_head.parameters_mut());
        params
    }
}
