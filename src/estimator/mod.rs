//! # Value Estimators
//!
//! The agent consumes its function approximator only through the
//! [`ValueEstimator`] capability: map a batch of states to a batch of action
//! values, backpropagate a gradient on those values, and expose an ordered
//! parameter list so the target copy can be synchronized.
//!
//! Two concrete variants are provided and selected once, at construction, by
//! [`Estimator::from_config`]:
//!
//! - [`QNetwork`]: dense ReLU trunk followed by a linear action-value head
//! - [`DuelingQNetwork`]: shared trunk split into a state-value stream and an
//!   advantage stream, recombined as `Q = V + A - mean(A)`
//!
//! Both keep a [`Mode`]. In [`Mode::Training`] a forward pass caches what the
//! backward pass needs and dropout is active; in [`Mode::Inference`] nothing is
//! cached, so values computed there can never receive a gradient.

mod dueling;
mod q_network;

pub use dueling::DuelingQNetwork;
pub use q_network::QNetwork;

use ndarray::{Array2, ArrayView2, ArrayViewD, ArrayViewMutD};
use rand::Rng;

use crate::config::AgentConfig;
use crate::error::{DqnError, Result};

/// Whether forward passes record state for backpropagation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Training,
    Inference,
}

/// A trainable parameter and its accumulated gradient.
pub struct ParamMut<'a> {
    pub value: ArrayViewMutD<'a, f32>,
    pub grad: ArrayViewMutD<'a, f32>,
}

/// Capability interface for action-value function approximators.
pub trait ValueEstimator {
    fn state_size(&self) -> usize;

    fn action_size(&self) -> usize;

    fn mode(&self) -> Mode;

    fn set_mode(&mut self, mode: Mode);

    /// Map a `(batch, state_size)` array to `(batch, action_size)` action values.
    fn forward(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Accumulate parameter gradients for `d loss / d output` of the most recent
    /// training-mode forward pass.
    fn backward(&mut self, output_grad: ArrayView2<f32>) -> Result<()>;

    /// Parameters in a fixed order shared by every structurally identical estimator.
    fn parameters(&self) -> Vec<ArrayViewD<'_, f32>>;

    /// Same order as [`parameters`](ValueEstimator::parameters), with gradients.
    fn parameters_mut(&mut self) -> Vec<ParamMut<'_>>;

    fn parameter_count(&self) -> usize {
        self.parameters().iter().map(|p| p.len()).sum()
    }

    fn parameter_shapes(&self) -> Vec<Vec<usize>> {
        self.parameters().iter().map(|p| p.shape().to_vec()).collect()
    }
}

/// Fail with `StructuralMismatch` unless both estimators have identical
/// parameter count, order and shapes.
pub fn check_structure<A, B>(online: &A, target: &B) -> Result<()>
where
    A: ValueEstimator + ?Sized,
    B: ValueEstimator + ?Sized,
{
    let expected = online.parameter_shapes();
    let actual = target.parameter_shapes();
    if expected != actual {
        return Err(DqnError::structural_mismatch(
            format!("{} parameters {:?}", expected.len(), expected),
            format!("{} parameters {:?}", actual.len(), actual),
        ));
    }
    if online.state_size() != target.state_size() || online.action_size() != target.action_size() {
        return Err(DqnError::structural_mismatch(
            format!("{} -> {}", online.state_size(), online.action_size()),
            format!("{} -> {}", target.state_size(), target.action_size()),
        ));
    }
    Ok(())
}

/// The estimator variants shipped with the crate.
#[derive(Clone)]
pub enum Estimator {
    Plain(QNetwork),
    Dueling(DuelingQNetwork),
}

impl Estimator {
    /// Build the variant selected by `config.dueling`, drawing initial weights from `rng`.
    pub fn from_config<R: Rng + ?Sized>(config: &AgentConfig, rng: &mut R) -> Result<Self> {
        if config.dueling {
            Ok(Estimator::Dueling(DuelingQNetwork::new(
                &config.trunk_sizes(),
                config.action_size,
                config.dropout,
                rng,
            )?))
        } else {
            Ok(Estimator::Plain(QNetwork::new(
                &config.trunk_sizes(),
                config.action_size,
                config.dropout,
                rng,
            )?))
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Estimator::Plain(_) => "plain",
            Estimator::Dueling(_) => "dueling",
        }
    }
}

impl ValueEstimator for Estimator {
    fn state_size(&self) -> usize {
        match self {
            Estimator::Plain(net) => net.state_size(),
            Estimator::Dueling(net) => net.state_size(),
        }
    }

    fn action_size(&self) -> usize {
        match self {
            Estimator::Plain(net) => net.action_size(),
            Estimator::Dueling(net) => net.action_size(),
        }
    }

    fn mode(&self) -> Mode {
        match self {
            Estimator::Plain(net) => net.mode(),
            Estimator::Dueling(net) => net.mode(),
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        match self {
            Estimator::Plain(net) => net.set_mode(mode),
            Estimator::Dueling(net) => net.set_mode(mode),
        }
    }

    fn forward(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        match self {
            Estimator::Plain(net) => net.forward(states),
            Estimator::Dueling(net) => net.forward(states),
        }
    }

    fn backward(&mut self, output_grad: ArrayView2<f32>) -> Result<()> {
        match self {
            Estimator::Plain(net) => net.backward(output_grad),
            Estimator::Dueling(net) => net.backward(output_grad),
        }
    }

    fn parameters(&self) -> Vec<ArrayViewD<'_, f32>> {
        match self {
            Estimator::Plain(net) => net.parameters(),
            Estimator::Dueling(net) => net.parameters(),
        }
    }

    fn parameters_mut(&mut self) -> Vec<ParamMut<'_>> {
        match self {
            Estimator::Plain(net) => net.parameters_mut(),
            Estimator::Dueling(net) => net.parameters_mut(),
        }
    }
}
