use ndarray::{Array2, ArrayView2, ArrayViewD};
use rand::Rng;

use super::dense::DenseLayer;
use super::dropout::DropoutLayer;
use super::traits::Layer as LayerTrait;
use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::estimator::{Mode, ParamMut};

/// An ordered stack of layers applied one after another.
#[derive(Clone, Default)]
pub struct Sequential {
    layers: Vec<Box<dyn LayerTrait>>,
}

impl Sequential {
    pub fn new() -> Self {
        Sequential { layers: Vec::new() }
    }

    /// Dense ReLU layers over `sizes` (`sizes[0]` is the input width), each
    /// followed by dropout when `dropout > 0`.
    pub fn relu_trunk<R: Rng + ?Sized>(sizes: &[usize], dropout: f32, rng: &mut R) -> Result<Self> {
        if sizes.is_empty() {
            return Err(DqnError::invalid_parameter("sizes", "must contain the input width"));
        }
        let mut trunk = Sequential::new();
        for window in sizes.windows(2) {
            trunk.push(DenseLayer::new(window[0], window[1], Activation::Relu, rng));
            if dropout > 0.0 {
                trunk.push(DropoutLayer::new(window[1], dropout, rng.gen())?);
            }
        }
        Ok(trunk)
    }

    pub fn push<L: LayerTrait + 'static>(&mut self, layer: L) {
        self.layers.push(Box::new(layer));
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Width of the output; `None` for an empty stack.
    pub fn output_size(&self) -> Option<usize> {
        self.layers.last().map(|layer| layer.output_size())
    }

    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>, mode: Mode) -> Result<Array2<f32>> {
        let mut current_output = inputs.to_owned();
        for layer in &mut self.layers {
            current_output = layer.forward_batch(current_output.view(), mode)?;
        }
        Ok(current_output)
    }

    pub fn backward_batch(&mut self, output_grad: ArrayView2<f32>) -> Result<Array2<f32>> {
        let mut current_grad = output_grad.to_owned();
        for layer in self.layers.iter_mut().rev() {
            current_grad = layer.backward_batch(current_grad.view())?;
        }
        Ok(current_grad)
    }

    pub fn parameters(&self) -> Vec<ArrayViewD<'_, f32>> {
        self.layers.iter().flat_map(|layer| layer.parameters()).collect()
    }

    pub fn parameters_mut(&mut self) -> Vec<ParamMut<'_>> {
        self.layers.iter_mut().flat_map(|layer| layer.parameters_mut()).collect()
    }
}
