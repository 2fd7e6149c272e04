use ndarray::{Array2, ArrayView2, ArrayViewD};

use crate::error::Result;
use crate::estimator::{Mode, ParamMut};

/// Trait defining the interface for neural network layers
pub trait Layer: Send + Sync {
    /// Forward propagation for a batch. Training mode caches what `backward_batch` needs.
    fn forward_batch(&mut self, inputs: ArrayView2<f32>, mode: Mode) -> Result<Array2<f32>>;

    /// Accumulate parameter gradients and return the gradient with respect to the inputs.
    fn backward_batch(&mut self, output_grad: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Learnable parameters, weights before biases
    fn parameters(&self) -> Vec<ArrayViewD<'_, f32>>;

    fn parameters_mut(&mut self) -> Vec<ParamMut<'_>>;

    /// Get the output size of the layer
    fn output_size(&self) -> usize;

    /// Get the input size of the layer
    fn input_size(&self) -> usize;

    /// Clone the layer into a boxed trait object
    fn clone_box(&self) -> Box<dyn Layer>;
}

impl Clone for Box<dyn Layer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
