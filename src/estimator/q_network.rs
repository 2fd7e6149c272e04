use ndarray::{Array2, ArrayView2, ArrayViewD};
use rand::Rng;

use super::{Mode, ParamMut, ValueEstimator};
use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::layers::{DenseLayer, Sequential};

/// Plain action-value network: ReLU trunk and a linear head with one output per action.
#[derive(Clone)]
pub struct QNetwork {
    layers: Sequential,
    state_size: usize,
    action_size: usize,
    mode: Mode,
}

impl QNetwork {
    /// `trunk_sizes` starts with the state width and lists every hidden width.
    pub fn new<R: Rng + ?Sized>(trunk_sizes: &[usize], action_size: usize, dropout: f32, rng: &mut R) -> Result<Self> {
        let mut layers = Sequential::relu_trunk(trunk_sizes, dropout, rng)?;
        let state_size = trunk_sizes[0];
        let head_input = trunk_sizes.last().copied().unwrap_or(state_size);
        layers.push(DenseLayer::new(head_input, action_size, Activation::Linear, rng));
        Ok(QNetwork {
            layers,
            state_size,
            action_size,
            mode: Mode::Training,
        })
    }
}

impl ValueEstimator for QNetwork {
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
        self.layers.forward_batch(states, self.mode)
    }

    fn backward(&mut self, output_grad: ArrayView2<f32>) -> Result<()> {
        if self.mode != Mode::Training {
            return Err(DqnError::TrainingError("backward() requires training mode".to_string()));
        }
        self.layers.backward_batch(output_grad)?;
        Ok(())
    }

    fn parameters(&self) -> Vec<ArrayViewD<'_, f32>> {
        self.layers.parameters()
    }

    fn parameters_mut(&mut self) -> Vec<ParamMut<'_>> {
        self.layers.parameters_mut()
    }
}
