//! # deepq - Deep Q-Network agent
//!
//! A value-based reinforcement learning agent for discrete action spaces,
//! built on `ndarray`. It combines experience replay, a soft-updated target
//! estimator, optional Double DQN targets and an optional dueling estimator.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deepq::agent::DqnAgent;
//! use deepq::config::AgentConfig;
//! use ndarray::array;
//!
//! let mut config = AgentConfig::new(4, 2, 42);
//! config.dueling = true;
//! let mut agent = DqnAgent::new(config).unwrap();
//!
//! let state = array![0.1, 0.2, -0.3, 0.4];
//! let action = agent.act(state.view(), 0.1).unwrap();
//! let next_state = array![0.1, 0.25, -0.3, 0.35];
//! let loss = agent.step(state, action, 1.0, next_state, false).unwrap();
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions used by the estimators
//! - [`agent`] - The DQN agent and its builder
//! - [`config`] - Hyperparameters, defaults and JSON loading
//! - [`error`] - Error types and result handling
//! - [`estimator`] - Action-value estimators (plain and dueling)
//! - [`layers`] - Dense and dropout layers and their sequential container
//! - [`loss`] - Loss functions for training
//! - [`optimizer`] - Optimization algorithms
//! - [`replay_buffer`] - Experience replay

pub mod activations;
pub mod agent;
pub mod config;
pub mod error;
pub mod estimator;
pub mod layers;
pub mod loss;
pub mod optimizer;
pub mod replay_buffer;

pub use agent::{DqnAgent, DqnAgentBuilder};
pub use config::AgentConfig;
pub use error::{DqnError, Result};
pub use estimator::{Estimator, Mode, ValueEstimator};
pub use replay_buffer::{Experience, ExperienceBatch, ReplayBuffer};

#[cfg(test)]
mod tests;
