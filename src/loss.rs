//! Loss functions for the temporal-difference regression.

use ndarray::{Array1, ArrayView1};

use crate::error::{DqnError, Result};

/// Trait defining the interface for loss functions over per-sample predictions
pub trait Loss: Send + Sync {
    /// Compute the loss for a batch of predictions and (constant) targets
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Result<f32>;

    /// Gradient of the loss with respect to the predictions only
    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Result<Array1<f32>>;
}

/// Mean Squared Error: `mean((prediction - target)^2)`
#[derive(Clone, Copy, Debug, Default)]
pub struct MeanSquaredError;

fn check_lengths(predictions: &ArrayView1<f32>, targets: &ArrayView1<f32>) -> Result<()> {
    if predictions.len() != targets.len() || predictions.is_empty() {
        return Err(DqnError::dimension_mismatch(
            format!("{} non-empty targets", predictions.len()),
            format!("{}", targets.len()),
        ));
    }
    Ok(())
}

impl Loss for MeanSquaredError {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Result<f32> {
        check_lengths(&predictions, &targets)?;
        let diff = &predictions - &targets;
        Ok(diff.mapv(|x| x * x).sum() / predictions.len() as f32)
    }

    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Result<Array1<f32>> {
        check_lengths(&predictions, &targets)?;
        Ok((&predictions - &targets) * (2.0 / predictions.len() as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mse_value_and_gradient() {
        let predictions = array![1.0, 2.0, 3.0, 4.0];
        let targets = array![1.0, 0.0, 3.0, 6.0];
        let loss = MeanSquaredError.compute(predictions.view(), targets.view()).unwrap();
        assert!((loss - 2.0).abs() < 1e-6);

        let grad = MeanSquaredError.gradient(predictions.view(), targets.view()).unwrap();
        assert_eq!(grad, array![0.0, 1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_mse_length_mismatch() {
        let predictions = array![1.0, 2.0];
        let targets = array![1.0];
        assert!(MeanSquaredError.compute(predictions.view(), targets.view()).is_err());
        let empty = Array1::<f32>::zeros(0);
        assert!(MeanSquaredError.gradient(empty.view(), empty.view()).is_err());
    }
}
