//! Agent configuration.
//!
//! Every hyper-parameter of the learning loop is fixed at agent construction
//! through [`AgentConfig`]. The reference values are exported as constants and
//! used as serde defaults, so a JSON config only needs the problem dimensions:
//!
//! ```rust
//! use deepq::config::AgentConfig;
//!
//! let config = AgentConfig::from_json_str(
//!     r#"{ "state_size": 8, "action_size": 4, "seed": 0, "double_dqn": true }"#,
//! ).unwrap();
//! assert_eq!(config.batch_size, deepq::config::BATCH_SIZE);
//! assert!(config.double_dqn);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DqnError, Result};

/// Replay buffer size
pub const BUFFER_SIZE: usize = 100_000;
/// Minibatch size
pub const BATCH_SIZE: usize = 64;
/// Discount factor
pub const GAMMA: f32 = 0.99;
/// Interpolation factor for the soft update of target parameters
pub const TAU: f32 = 1e-3;
/// Learning rate
pub const LR: f32 = 5e-4;
/// How often (in `step` calls) to run a learning step
pub const UPDATE_EVERY: usize = 4;

fn default_hidden_layers() -> Vec<usize> {
    vec![64, 64]
}

fn default_buffer_size() -> usize {
    BUFFER_SIZE
}

fn default_batch_size() -> usize {
    BATCH_SIZE
}

fn default_gamma() -> f32 {
    GAMMA
}

fn default_tau() -> f32 {
    TAU
}

fn default_learning_rate() -> f32 {
    LR
}

fn default_update_every() -> usize {
    UPDATE_EVERY
}

/// Construction parameters for a [`DqnAgent`](crate::agent::DqnAgent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Dimension of each state
    pub state_size: usize,

    /// Number of discrete actions
    pub action_size: usize,

    /// Seed for weight init, replay sampling and exploration
    #[serde(default)]
    pub seed: u64,

    /// Select bootstrap actions with the online estimator
    #[serde(default)]
    pub double_dqn: bool,

    /// Use the value/advantage stream split
    #[serde(default)]
    pub dueling: bool,

    /// Hidden layer widths of the estimator trunk
    #[serde(default = "default_hidden_layers")]
    pub hidden_layers: Vec<usize>,

    /// Dropout rate after each hidden layer (training mode only)
    #[serde(default)]
    pub dropout: f32,

    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_gamma")]
    pub gamma: f32,

    #[serde(default = "default_tau")]
    pub tau: f32,

    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,

    #[serde(default = "default_update_every")]
    pub update_every: usize,
}

impl AgentConfig {
    /// Reference configuration for the given problem dimensions.
    pub fn new(state_size: usize, action_size: usize, seed: u64) -> Self {
        AgentConfig {
            state_size,
            action_size,
            seed,
            double_dqn: false,
            dueling: false,
            hidden_layers: default_hidden_layers(),
            dropout: 0.0,
            buffer_size: BUFFER_SIZE,
            batch_size: BATCH_SIZE,
            gamma: GAMMA,
            tau: TAU,
            learning_rate: LR,
            update_every: UPDATE_EVERY,
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AgentConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Layer widths from input to output, excluding the head(s).
    pub fn trunk_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_layers.len() + 1);
        sizes.push(self.state_size);
        sizes.extend_from_slice(&self.hidden_layers);
        sizes
    }

    /// Check every value is inside its legal range.
    pub fn validate(&self) -> Result<()> {
        if self.state_size == 0 {
            return Err(DqnError::invalid_parameter("state_size", "must be > 0"));
        }
        if self.action_size == 0 {
            return Err(DqnError::invalid_parameter("action_size", "must be > 0"));
        }
        if self.hidden_layers.iter().any(|&width| width == 0) {
            return Err(DqnError::invalid_parameter("hidden_layers", "widths must be > 0"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(DqnError::invalid_parameter("dropout", "must be in [0, 1)"));
        }
        if self.buffer_size == 0 {
            return Err(DqnError::invalid_parameter("buffer_size", "must be > 0"));
        }
        if self.batch_size == 0 {
            return Err(DqnError::invalid_parameter("batch_size", "must be > 0"));
        }
        if self.batch_size > self.buffer_size {
            return Err(DqnError::invalid_parameter("batch_size", "must be <= buffer_size"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(DqnError::invalid_parameter("gamma", "must be in [0, 1]"));
        }
        if !(self.tau > 0.0 && self.tau <= 1.0) {
            return Err(DqnError::invalid_parameter("tau", "must be in (0, 1]"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(DqnError::invalid_parameter("learning_rate", "must be a positive finite number"));
        }
        if self.update_every == 0 {
            return Err(DqnError::invalid_parameter("update_every", "must be > 0"));
        }
        Ok(())
    }
}
