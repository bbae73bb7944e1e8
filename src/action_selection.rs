use rand::distributions::Uniform;
use rand::prelude::Distribution;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::env::N_ACTIONS;
use crate::utils::argmax;

/// How the exploration rate moves once an episode completes.
#[derive(Debug, Clone)]
pub enum EpsilonUpdateStrategy {
    /// Multiplicative decay towards a floor, applied once per episode.
    EpsilonDecreasing { final_epsilon: f64, epsilon_decay: f64 },
    /// Constant exploration.
    None,
}

impl EpsilonUpdateStrategy {
    fn update(&self, current_epsilon: f64) -> f64 {
        match self {
            EpsilonUpdateStrategy::EpsilonDecreasing {
                final_epsilon,
                epsilon_decay,
            } => (current_epsilon * epsilon_decay).max(*final_epsilon),
            EpsilonUpdateStrategy::None => current_epsilon,
        }
    }
}

/// Epsilon-greedy selection over a state's action values.
///
/// All randomness flows from the seed handed to the constructor, so runs are
/// reproducible.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    initial_epsilon: f64,
    epsilon: f64,
    exploration_decider: Uniform<f64>,
    rand_action_selecter: Uniform<usize>,
    rng: SmallRng,
    update_strategy: EpsilonUpdateStrategy,
}

impl EpsilonGreedy {
    pub fn new(epsilon: f64, seed: u64, update_strategy: EpsilonUpdateStrategy) -> Self {
        Self {
            initial_epsilon: epsilon,
            epsilon,
            exploration_decider: Uniform::from(0.0..1.0),
            rand_action_selecter: Uniform::from(0..N_ACTIONS),
            rng: SmallRng::seed_from_u64(seed),
            update_strategy,
        }
    }

    fn should_explore(&mut self) -> bool {
        self.epsilon != 0.0 && self.exploration_decider.sample(&mut self.rng) < self.epsilon
    }

    /// Pick an action index for `values`. Exploration only happens while
    /// training; evaluation is always greedy, without touching the RNG.
    pub fn get_action(&mut self, values: &[f64; N_ACTIONS], training: bool) -> usize {
        if training && self.should_explore() {
            self.rand_action_selecter.sample(&mut self.rng)
        } else {
            argmax(values)
        }
    }

    /// Episode-completion hook: applies the configured decay.
    pub fn update(&mut self) {
        self.epsilon = self.update_strategy.update(self.epsilon);
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn reset(&mut self) {
        self.epsilon = self.initial_epsilon;
    }
}
