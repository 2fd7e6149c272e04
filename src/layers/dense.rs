use ndarray::{Array1, Array2, ArrayView2, ArrayViewD, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

use super::traits::Layer as LayerTrait;
use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::estimator::{Mode, ParamMut};

/// A fully connected (dense) layer in a neural network
#[derive(Clone, Debug)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    weight_grad: Array2<f32>,
    bias_grad: Array1<f32>,
    pre_activation_output: Option<Array2<f32>>,
    inputs: Option<Array2<f32>>,
}

impl DenseLayer {
    /// Create a new dense layer with the given input size, output size, and activation function.
    /// Weights and biases are drawn from `U(-1/sqrt(input_size), 1/sqrt(input_size))` using `rng`.
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, activation: Activation, rng: &mut R) -> Self {
        let bound = 1.0 / (input_size.max(1) as f32).sqrt();
        let distribution = Uniform::new(-bound, bound);
        let weights = Array2::random_using((input_size, output_size), distribution, rng);
        let biases = Array1::random_using(output_size, distribution, rng);
        DenseLayer {
            weight_grad: Array2::zeros((input_size, output_size)),
            bias_grad: Array1::zeros(output_size),
            weights,
            biases,
            activation,
            pre_activation_output: None,
            inputs: None,
        }
    }

    pub fn with_weights(mut self, weights: Array2<f32>) -> Result<Self> {
        if weights.dim() != self.weights.dim() {
            return Err(DqnError::dimension_mismatch(
                format!("{:?}", self.weights.dim()),
                format!("{:?}", weights.dim()),
            ));
        }
        self.weights = weights;
        Ok(self)
    }

    pub fn with_biases(mut self, biases: Array1<f32>) -> Result<Self> {
        if biases.dim() != self.biases.dim() {
            return Err(DqnError::dimension_mismatch(
                format!("{}", self.biases.len()),
                format!("{}", biases.len()),
            ));
        }
        self.biases = biases;
        Ok(self)
    }

    pub fn weight_grad(&self) -> &Array2<f32> {
        &self.weight_grad
    }

    pub fn bias_grad(&self) -> &Array1<f32> {
        &self.bias_grad
    }
}

impl LayerTrait for DenseLayer {
    fn forward_batch(&mut self, inputs: ArrayView2<f32>, mode: Mode) -> Result<Array2<f32>> {
        if inputs.ncols() != self.input_size() {
            return Err(DqnError::dimension_mismatch(
                format!("{} input features", self.input_size()),
                format!("{} input features", inputs.ncols()),
            ));
        }
        let mut outputs = inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0));
        match mode {
            Mode::Training => {
                self.inputs = Some(inputs.to_owned());
                self.pre_activation_output = Some(outputs.clone());
            }
            Mode::Inference => {
                self.inputs = None;
                self.pre_activation_output = None;
            }
        }
        self.activation.apply_batch(&mut outputs);
        Ok(outputs)
    }

    fn backward_batch(&mut self, output_grad: ArrayView2<f32>) -> Result<Array2<f32>> {
        let (inputs, pre_activation_output) = match (&self.inputs, &self.pre_activation_output) {
            (Some(inputs), Some(pre)) => (inputs, pre),
            _ => {
                return Err(DqnError::TrainingError(
                    "backward_batch() called without a preceding training-mode forward_batch()".to_string(),
                ))
            }
        };
        if output_grad.dim() != pre_activation_output.dim() {
            return Err(DqnError::dimension_mismatch(
                format!("{:?}", pre_activation_output.dim()),
                format!("{:?}", output_grad.dim()),
            ));
        }

        let activation_deriv = self.activation.derivative_batch(pre_activation_output.view());
        let adjusted_error = &output_grad * &activation_deriv;
        self.weight_grad += &inputs.t().dot(&adjusted_error);
        self.bias_grad += &adjusted_error.sum_axis(Axis(0));

        Ok(adjusted_error.dot(&self.weights.t()))
    }

    fn parameters(&self) -> Vec<ArrayViewD<'_, f32>> {
        vec![self.weights.view().into_dyn(), self.biases.view().into_dyn()]
    }

    fn parameters_mut(&mut self) -> Vec<ParamMut<'_>> {
        let DenseLayer { weights, biases, weight_grad, bias_grad, .. } = self;
        vec![
            ParamMut { value: weights.view_mut().into_dyn(), grad: weight_grad.view_mut().into_dyn() },
            ParamMut { value: biases.view_mut().into_dyn(), grad: bias_grad.view_mut().into_dyn() },
        ]
    }

    fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    fn clone_box(&self) -> Box<dyn LayerTrait> {
        Box::new(self.clone())
    }
}
