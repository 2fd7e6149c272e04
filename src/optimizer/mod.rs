//! # Optimizers
//!
//! Gradient-descent steps over an estimator's ordered parameter list. The
//! optimizer is bound to one estimator: Adam keeps one pair of moment buffers
//! per parameter position and rejects a parameter list whose shapes change.

use ndarray::{ArrayD, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{DqnError, Result};
use crate::estimator::ParamMut;

pub trait Optimizer {
    /// Reset every accumulated gradient to zero.
    fn zero_gradients(&mut self, params: &mut [ParamMut<'_>]) {
        for param in params.iter_mut() {
            param.grad.fill(0.0);
        }
    }

    /// Apply one update using the accumulated gradients. Fails without
    /// touching any parameter if a gradient is NaN or infinite.
    fn step(&mut self, params: &mut [ParamMut<'_>]) -> Result<()>;

    fn learning_rate(&self) -> f32;
}

fn ensure_finite_gradients(params: &[ParamMut<'_>]) -> Result<()> {
    for (index, param) in params.iter().enumerate() {
        if param.grad.iter().any(|g| !g.is_finite()) {
            return Err(DqnError::NonFiniteValue(format!("gradient of parameter {}", index)));
        }
    }
    Ok(())
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
}

impl Optimizer for OptimizerWrapper {
    fn zero_gradients(&mut self, params: &mut [ParamMut<'_>]) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.zero_gradients(params),
            OptimizerWrapper::Adam(optimizer) => optimizer.zero_gradients(params),
        }
    }

    fn step(&mut self, params: &mut [ParamMut<'_>]) -> Result<()> {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.step(params),
            OptimizerWrapper::Adam(optimizer) => optimizer.step(params),
        }
    }

    fn learning_rate(&self) -> f32 {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.learning_rate(),
            OptimizerWrapper::Adam(optimizer) => optimizer.learning_rate(),
        }
    }
}

/// Plain stochastic gradient descent
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SGD {
    pub learning_rate: f32,
}

impl SGD {
    pub fn new(learning_rate: f32) -> SGD {
        SGD { learning_rate }
    }
}

impl Optimizer for SGD {
    fn step(&mut self, params: &mut [ParamMut<'_>]) -> Result<()> {
        ensure_finite_gradients(params)?;
        let lr = self.learning_rate;
        for param in params.iter_mut() {
            Zip::from(param.value.view_mut())
                .and(param.grad.view())
                .for_each(|w, &g| *w -= lr * g);
        }
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }
}

/// Adam with bias-corrected first and second moment estimates
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Adam {
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    /// Number of steps applied so far
    pub t: i32,
    #[serde(skip)]
    m: Vec<ArrayD<f32>>,
    #[serde(skip)]
    v: Vec<ArrayD<f32>>,
}

impl Adam {
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    pub fn default(learning_rate: f32) -> Self {
        Self::new(learning_rate, 0.9, 0.999, 1e-8)
    }

    fn ensure_state(&mut self, params: &[ParamMut<'_>]) -> Result<()> {
        if self.m.is_empty() {
            self.m = params.iter().map(|p| ArrayD::zeros(p.value.raw_dim())).collect();
            self.v = params.iter().map(|p| ArrayD::zeros(p.value.raw_dim())).collect();
            return Ok(());
        }
        let expected: Vec<&[usize]> = self.m.iter().map(|m| m.shape()).collect();
        let actual: Vec<&[usize]> = params.iter().map(|p| p.value.shape()).collect();
        if expected != actual {
            return Err(DqnError::structural_mismatch(format!("{:?}", expected), format!("{:?}", actual)));
        }
        Ok(())
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [ParamMut<'_>]) -> Result<()> {
        ensure_finite_gradients(params)?;
        self.ensure_state(params)?;

        self.t += 1;
        let (lr, beta1, beta2, epsilon) = (self.learning_rate, self.beta1, self.beta2, self.epsilon);
        let bias1 = 1.0 - beta1.powi(self.t);
        let bias2 = 1.0 - beta2.powi(self.t);

        for ((param, m), v) in params.iter_mut().zip(self.m.iter_mut()).zip(self.v.iter_mut()) {
            Zip::from(param.value.view_mut())
                .and(param.grad.view())
                .and(m)
                .and(v)
                .for_each(|w, &g, m, v| {
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    let m_hat = *m / bias1;
                    let v_hat = *v / bias2;
                    *w -= lr * m_hat / (v_hat.sqrt() + epsilon);
                });
        }
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }
}
