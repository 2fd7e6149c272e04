use log::{debug, info, trace, warn};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::AgentConfig;
use crate::error::{DqnError, Result};
use crate::estimator::{check_structure, Estimator, Mode, ValueEstimator};
use crate::loss::{Loss, MeanSquaredError};
use crate::optimizer::{Adam, Optimizer, OptimizerWrapper};
use crate::replay_buffer::{ExperienceBatch, ReplayBuffer};

/// Index of the largest value; ties resolve to the lowest index.
pub fn argmax(values: ArrayView1<f32>) -> Result<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &value) in values.iter().enumerate() {
        if value.is_nan() {
            return Err(DqnError::NonFiniteValue(format!("action value {} is NaN", index)));
        }
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
        .ok_or_else(|| DqnError::dimension_mismatch("at least one action value", "none"))
}

/// Largest value of a row; NaN is an error, as in [`argmax`].
fn row_max(values: ArrayView1<f32>) -> Result<f32> {
    values.iter().enumerate().try_fold(f32::NEG_INFINITY, |max, (index, &value)| {
        if value.is_nan() {
            Err(DqnError::NonFiniteValue(format!("action value {} is NaN", index)))
        } else {
            Ok(max.max(value))
        }
    })
}

/// Deep Q-Network agent with a soft-updated target network and optional Double DQN
///
/// The agent owns two structurally identical estimators. The online estimator
/// is trained by gradient descent; the target estimator is only ever moved
/// towards it by Polyak averaging (`θ_target ← τ·θ_online + (1 − τ)·θ_target`)
/// after every learning step, and supplies the bootstrap values.
///
/// # Example
///
/// ```rust
/// use deepq::agent::DqnAgent;
/// use deepq::config::AgentConfig;
/// use ndarray::array;
///
/// let mut config = AgentConfig::new(4, 2, 0);
/// config.double_dqn = true;
/// config.batch_size = 8;
/// let mut agent = DqnAgent::new(config).unwrap();
///
/// let state = array![0.1, -0.2, 0.3, -0.1];
/// let action = agent.act(state.view(), 0.1).unwrap();
///
/// // After the environment step...
/// let next_state = array![0.15, -0.25, 0.35, -0.05];
/// agent.step(state, action, 1.0, next_state, false).unwrap();
/// ```
pub struct DqnAgent<E = Estimator, O = OptimizerWrapper> {
    config: AgentConfig,

    /// Estimator trained by gradient descent
    online: E,

    /// Lagged copy supplying bootstrap values
    target: E,

    /// Bound to the online estimator's parameters
    optimizer: O,

    memory: ReplayBuffer,

    loss: MeanSquaredError,

    /// Steps since the last learning opportunity, modulo `update_every`
    t_step: usize,

    /// Number of learning steps performed
    learn_steps: usize,

    last_loss: Option<f32>,

    /// Exploration randomness
    rng: StdRng,
}

impl DqnAgent {
    /// Create an agent with the estimator variant selected by `config.dueling`
    /// and an Adam optimizer using `config.learning_rate`.
    ///
    /// Online and target start with identical parameters.
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let online = Estimator::from_config(&config, &mut rng)?;
        let target = online.clone();
        let optimizer = OptimizerWrapper::Adam(Adam::default(config.learning_rate));

        info!(
            "DQN agent: {} estimator, {} parameters, double DQN: {}, dueling: {}",
            online.kind(),
            online.parameter_count(),
            config.double_dqn,
            config.dueling
        );
        Self::from_parts(config, online, target, optimizer, rng)
    }
}

impl<E: ValueEstimator, O: Optimizer> DqnAgent<E, O> {
    /// Create an agent around caller-provided estimators and optimizer.
    ///
    /// Fails with `StructuralMismatch` if the two estimators differ in
    /// parameter layout, and with `DimensionMismatch` if they disagree with
    /// the configured state or action size.
    pub fn with_estimators(config: AgentConfig, online: E, target: E, optimizer: O) -> Result<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        info!(
            "DQN agent: custom estimator, {} parameters, double DQN: {}",
            online.parameter_count(),
            config.double_dqn
        );
        Self::from_parts(config, online, target, optimizer, rng)
    }

    fn from_parts(config: AgentConfig, mut online: E, mut target: E, optimizer: O, mut rng: StdRng) -> Result<Self> {
        check_structure(&online, &target)?;
        if online.state_size() != config.state_size || online.action_size() != config.action_size {
            return Err(DqnError::dimension_mismatch(
                format!("estimator {} -> {}", config.state_size, config.action_size),
                format!("estimator {} -> {}", online.state_size(), online.action_size()),
            ));
        }
        online.set_mode(Mode::Training);
        target.set_mode(Mode::Inference);

        let memory = ReplayBuffer::new(config.buffer_size, StdRng::seed_from_u64(rng.gen()))?;

        Ok(DqnAgent {
            config,
            online,
            target,
            optimizer,
            memory,
            loss: MeanSquaredError,
            t_step: 0,
            learn_steps: 0,
            last_loss: None,
            rng,
        })
    }

    fn check_state(&self, len: usize) -> Result<()> {
        if len != self.config.state_size {
            return Err(DqnError::dimension_mismatch(
                format!("state of length {}", self.config.state_size),
                format!("state of length {}", len),
            ));
        }
        Ok(())
    }

    /// Run the online estimator in inference mode, restoring its previous mode afterwards.
    fn online_inference(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        let previous = self.online.mode();
        self.online.set_mode(Mode::Inference);
        let values = self.online.forward(states);
        self.online.set_mode(previous);
        values
    }

    /// Select an action for `state` with an epsilon-greedy policy.
    ///
    /// With probability `eps` a uniformly random action is returned, otherwise
    /// the greedy action under the online estimator (lowest index on ties).
    pub fn act(&mut self, state: ArrayView1<f32>, eps: f32) -> Result<usize> {
        if !(0.0..=1.0).contains(&eps) {
            return Err(DqnError::invalid_parameter("eps", "must be in [0, 1]"));
        }
        self.check_state(state.len())?;

        let action_values = self.online_inference(state.insert_axis(Axis(0)))?;

        if self.rng.gen::<f32>() < eps {
            Ok(self.rng.gen_range(0..self.config.action_size))
        } else {
            argmax(action_values.row(0))
        }
    }

    /// Store a transition and learn every `update_every` calls once the buffer
    /// holds more than `batch_size` experiences.
    ///
    /// Returns the loss when a learning step ran. Invalid transitions are
    /// rejected before anything is stored. A learning step that fails after
    /// validation leaves the transition stored and the step counter advanced.
    pub fn step(
        &mut self,
        state: Array1<f32>,
        action: usize,
        reward: f32,
        next_state: Array1<f32>,
        done: bool,
    ) -> Result<Option<f32>> {
        if action >= self.config.action_size {
            return Err(DqnError::InvalidAction {
                action,
                max_actions: self.config.action_size,
            });
        }
        self.check_state(state.len())?;
        self.check_state(next_state.len())?;
        if !reward.is_finite() {
            return Err(DqnError::NonFiniteValue(format!("reward {}", reward)));
        }
        if state.iter().chain(next_state.iter()).any(|v| !v.is_finite()) {
            return Err(DqnError::NonFiniteValue("state component".to_string()));
        }

        self.memory.push(state, action, reward, next_state, done);

        self.t_step = (self.t_step + 1) % self.config.update_every;
        if self.t_step == 0 && self.memory.len() > self.config.batch_size {
            let batch = self.memory.sample(self.config.batch_size)?;
            let loss = self.learn(&batch, self.config.gamma)?;
            return Ok(Some(loss));
        }
        Ok(None)
    }

    /// Value of the best next action for every row of `next_states`.
    ///
    /// Standard DQN takes the maximum of the target estimator's values. Double
    /// DQN picks the action with the online estimator and reads its value from
    /// the target estimator. Neither path records anything for backpropagation.
    pub fn bootstrap_values(&mut self, next_states: ArrayView2<f32>) -> Result<Array1<f32>> {
        let target_values = self.target.forward(next_states)?;

        if self.config.double_dqn {
            let online_values = self.online_inference(next_states)?;
            online_values
                .outer_iter()
                .zip(target_values.outer_iter())
                .map(|(online_row, target_row)| argmax(online_row).map(|best| target_row[best]))
                .collect()
        } else {
            target_values.outer_iter().map(row_max).collect()
        }
    }

    /// TD targets `reward + gamma * bootstrap * (1 - done)` for a batch.
    ///
    /// Terminal rows are exactly `reward`, whatever the bootstrap value is.
    pub fn compute_targets(&mut self, batch: &ExperienceBatch, gamma: f32) -> Result<Array1<f32>> {
        let next_values = self.bootstrap_values(batch.next_states.view())?;
        Ok(Zip::from(&batch.rewards)
            .and(&next_values)
            .and(&batch.dones)
            .map_collect(|&reward, &next, &done| if done == 1.0 { reward } else { reward + gamma * next }))
    }

    fn check_batch(&self, batch: &ExperienceBatch) -> Result<()> {
        if batch.is_empty() {
            return Err(DqnError::invalid_parameter("batch", "must not be empty"));
        }
        self.check_state(batch.states.ncols())?;
        self.check_state(batch.next_states.ncols())?;
        if let Some(&action) = batch.actions.iter().find(|&&a| a >= self.config.action_size) {
            return Err(DqnError::InvalidAction {
                action,
                max_actions: self.config.action_size,
            });
        }
        Ok(())
    }

    /// One gradient step on the online estimator followed by a soft update of
    /// the target estimator. Returns the minibatch loss.
    ///
    /// Either both the optimizer step and the soft update happen, or neither:
    /// all validation (structure, finite loss and gradients) runs before the
    /// first parameter is written.
    pub fn learn(&mut self, batch: &ExperienceBatch, gamma: f32) -> Result<f32> {
        self.check_batch(batch)?;
        check_structure(&self.online, &self.target)?;

        let targets = self.compute_targets(batch, gamma)?;

        self.online.set_mode(Mode::Training);
        let q_all = self.online.forward(batch.states.view())?;
        let q: Array1<f32> = batch
            .actions
            .iter()
            .enumerate()
            .map(|(i, &action)| q_all[[i, action]])
            .collect();

        let loss = self.loss.compute(q.view(), targets.view())?;
        if !loss.is_finite() {
            warn!("learning step skipped: loss is {}", loss);
            return Err(DqnError::NonFiniteValue(format!("loss {}", loss)));
        }

        // Only the taken action's column receives a gradient; the targets are constants.
        let dq = self.loss.gradient(q.view(), targets.view())?;
        let mut output_grad = Array2::zeros(q_all.raw_dim());
        for (i, &action) in batch.actions.iter().enumerate() {
            output_grad[[i, action]] = dq[i];
        }

        self.optimizer.zero_gradients(&mut self.online.parameters_mut());
        self.online.backward(output_grad.view())?;
        if let Err(err) = self.optimizer.step(&mut self.online.parameters_mut()) {
            warn!("learning step rejected by optimizer: {}", err);
            return Err(err);
        }

        self.soft_update(self.config.tau)?;

        self.learn_steps += 1;
        self.last_loss = Some(loss);
        debug!("learning step {}: loss {:.6}", self.learn_steps, loss);
        Ok(loss)
    }

    /// Blend target parameters towards the online ones:
    /// `θ_target ← tau·θ_online + (1 − tau)·θ_target`.
    pub fn soft_update(&mut self, tau: f32) -> Result<()> {
        if !(tau > 0.0 && tau <= 1.0) {
            return Err(DqnError::invalid_parameter("tau", "must be in (0, 1]"));
        }
        check_structure(&self.online, &self.target)?;

        let online_params = self.online.parameters();
        for (mut target_param, online_param) in self.target.parameters_mut().into_iter().zip(online_params) {
            Zip::from(target_param.value.view_mut())
                .and(online_param.view())
                .for_each(|t, &o| *t = tau * o + (1.0 - tau) * *t);
        }
        trace!("soft update with tau {}", tau);
        Ok(())
    }

    /// Copy the online parameters into the target estimator.
    pub fn hard_update(&mut self) -> Result<()> {
        self.soft_update(1.0)
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn online(&self) -> &E {
        &self.online
    }

    pub fn target(&self) -> &E {
        &self.target
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    pub fn memory(&self) -> &ReplayBuffer {
        &self.memory
    }

    pub fn learn_steps(&self) -> usize {
        self.learn_steps
    }

    pub fn last_loss(&self) -> Option<f32> {
        self.last_loss
    }
}

/// Builder pattern for DqnAgent
pub struct DqnAgentBuilder {
    state_size: Option<usize>,
    action_size: Option<usize>,
    config: AgentConfig,
}

impl DqnAgentBuilder {
    pub fn new() -> Self {
        DqnAgentBuilder {
            state_size: None,
            action_size: None,
            config: AgentConfig::new(0, 0, 0),
        }
    }

    pub fn state_size(mut self, size: usize) -> Self {
        self.state_size = Some(size);
        self
    }

    pub fn action_size(mut self, size: usize) -> Self {
        self.action_size = Some(size);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn double_dqn(mut self, enabled: bool) -> Self {
        self.config.double_dqn = enabled;
        self
    }

    pub fn dueling(mut self, enabled: bool) -> Self {
        self.config.dueling = enabled;
        self
    }

    pub fn hidden_layers(mut self, sizes: &[usize]) -> Self {
        self.config.hidden_layers = sizes.to_vec();
        self
    }

    pub fn dropout(mut self, rate: f32) -> Self {
        self.config.dropout = rate;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.config.gamma = gamma;
        self
    }

    pub fn tau(mut self, tau: f32) -> Self {
        self.config.tau = tau;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.config.learning_rate = learning_rate;
        self
    }

    pub fn update_every(mut self, steps: usize) -> Self {
        self.config.update_every = steps;
        self
    }

    /// The configuration the builder would use, validated.
    pub fn config(&self) -> Result<AgentConfig> {
        let state_size = self.state_size.ok_or_else(|| DqnError::InvalidParameter {
            name: "state_size".to_string(),
            reason: "State size must be specified".to_string(),
        })?;
        let action_size = self.action_size.ok_or_else(|| DqnError::InvalidParameter {
            name: "action_size".to_string(),
            reason: "Action size must be specified".to_string(),
        })?;
        let config = AgentConfig {
            state_size,
            action_size,
            ..self.config.clone()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn build(self) -> Result<DqnAgent> {
        DqnAgent::new(self.config()?)
    }
}

impl Default for DqnAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
