//! # DQN Agent
//!
//! [`DqnAgent`] interacts with an environment and learns from it:
//!
//! - **act**: epsilon-greedy action selection from the online estimator
//! - **step**: store a transition and, every `update_every` calls, learn from a
//!   sampled minibatch once the replay buffer holds more than `batch_size` experiences
//! - **learn**: one TD-error gradient step followed by a soft target update
//!
//! Bootstrap values come from the target estimator. With `double_dqn` enabled
//! the online estimator picks the next action and the target estimator
//! evaluates it, which reduces the overestimation of plain max-based targets.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use deepq::agent::DqnAgentBuilder;
//! use ndarray::array;
//!
//! let mut agent = DqnAgentBuilder::new()
//!     .state_size(4)
//!     .action_size(2)
//!     .hidden_layers(&[128, 128])
//!     .double_dqn(true)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! let state = array![0.1, 0.2, -0.3, 0.4];
//! let action = agent.act(state.view(), 0.05).unwrap();
//! ```

mod dqn;
pub use dqn::{argmax, DqnAgent, DqnAgentBuilder};
