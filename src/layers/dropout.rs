use ndarray::{Array2, ArrayView2, ArrayViewD};
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Bernoulli;

use super::traits::Layer as LayerTrait;
use crate::error::{DqnError, Result};
use crate::estimator::{Mode, ParamMut};

/// Dropout Layer
///
/// Zeroes each unit with probability `dropout_rate` in training mode and
/// scales the survivors by `1 / (1 - dropout_rate)`. Inference mode is the
/// identity.
#[derive(Clone, Debug)]
pub struct DropoutLayer {
    pub dropout_rate: f32,
    size: usize,
    rng: StdRng,
    cached_mask: Option<Array2<f32>>,
}

impl DropoutLayer {
    pub fn new(size: usize, dropout_rate: f32, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&dropout_rate) {
            return Err(DqnError::invalid_parameter("dropout_rate", "must be in [0, 1)"));
        }
        Ok(DropoutLayer {
            dropout_rate,
            size,
            rng: StdRng::seed_from_u64(seed),
            cached_mask: None,
        })
    }
}

impl LayerTrait for DropoutLayer {
    fn forward_batch(&mut self, inputs: ArrayView2<f32>, mode: Mode) -> Result<Array2<f32>> {
        if mode == Mode::Inference || self.dropout_rate == 0.0 {
            self.cached_mask = None;
            return Ok(inputs.to_owned());
        }

        let keep = Bernoulli::new(1.0 - self.dropout_rate as f64)
            .map_err(|e| DqnError::invalid_parameter("dropout_rate".to_string(), e.to_string()))?;
        let scale = 1.0 / (1.0 - self.dropout_rate);
        let mask = Array2::<bool>::random_using(inputs.dim(), keep, &mut self.rng)
            .mapv(|kept| if kept { scale } else { 0.0 });

        let outputs = &inputs * &mask;
        self.cached_mask = Some(mask);
        Ok(outputs)
    }

    fn backward_batch(&mut self, output_grad: ArrayView2<f32>) -> Result<Array2<f32>> {
        if self.dropout_rate == 0.0 {
            return Ok(output_grad.to_owned());
        }
        match &self.cached_mask {
            Some(mask) => Ok(&output_grad * mask),
            None => Err(DqnError::TrainingError(
                "dropout backward without a training-mode forward".to_string(),
            )),
        }
    }

    fn parameters(&self) -> Vec<ArrayViewD<'_, f32>> {
        Vec::new()
    }

    fn parameters_mut(&mut self) -> Vec<ParamMut<'_>> {
        Vec::new()
    }

    fn output_size(&self) -> usize {
        self.size
    }

    fn input_size(&self) -> usize {
        self.size
    }

    fn clone_box(&self) -> Box<dyn LayerTrait> {
        Box::new(self.clone())
    }
}
