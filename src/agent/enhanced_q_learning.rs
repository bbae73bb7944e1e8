use std::path::Path;

use super::{check_epsilon, check_rates, q_learning_step, Agent, ParamError};
use crate::action_selection::{EpsilonGreedy, EpsilonUpdateStrategy};
use crate::env::{BlackJackAction, BlackJackObservation};
use crate::q_table::{PersistenceError, QTable};

/// Tabular Q-learning whose exploration rate decays multiplicatively after
/// every completed episode, from `epsilon_start` down to the `epsilon_end`
/// floor.
#[derive(Debug, Clone)]
pub struct EnhancedQLearningAgent {
    q_table: QTable,
    learning_rate: f64,
    discount_factor: f64,
    action_selection: EpsilonGreedy,
}

impl EnhancedQLearningAgent {
    pub fn new(
        learning_rate: f64,
        discount_factor: f64,
        epsilon_start: f64,
        epsilon_end: f64,
        epsilon_decay: f64,
        seed: u64,
    ) -> Result<Self, ParamError> {
        check_rates(learning_rate, discount_factor)?;
        check_epsilon(epsilon_start)?;
        check_epsilon(epsilon_end)?;
        if epsilon_start < epsilon_end {
            return Err(ParamError::EpsilonRange {
                start: epsilon_start,
                end: epsilon_end,
            });
        }
        if !(epsilon_decay > 0.0 && epsilon_decay < 1.0) {
            return Err(ParamError::EpsilonDecay(epsilon_decay));
        }
        Ok(Self {
            q_table: QTable::new(),
            learning_rate,
            discount_factor,
            action_selection: EpsilonGreedy::new(
                epsilon_start,
                seed,
                EpsilonUpdateStrategy::EpsilonDecreasing {
                    final_epsilon: epsilon_end,
                    epsilon_decay,
                },
            ),
        })
    }
}

impl Agent for EnhancedQLearningAgent {
    fn get_action(&mut self, obs: &BlackJackObservation, training: bool) -> BlackJackAction {
        let values = self.q_table.action_values(obs);
        BlackJackAction::from(self.action_selection.get_action(&values, training))
    }

    fn update(
        &mut self,
        obs: &BlackJackObservation,
        action: BlackJackAction,
        reward: f64,
        terminated: bool,
        next_obs: &BlackJackObservation,
    ) -> f64 {
        let temporal_difference = q_learning_step(
            &mut self.q_table,
            obs,
            action,
            reward,
            terminated,
            next_obs,
            self.learning_rate,
            self.discount_factor,
        );
        if terminated {
            self.action_selection.update();
        }
        temporal_difference
    }

    fn epsilon(&self) -> f64 {
        self.action_selection.epsilon()
    }

    fn q_table(&self) -> &QTable {
        &self.q_table
    }

    fn save_q_table(&self, path: &Path) -> Result<(), PersistenceError> {
        self.q_table.save(path)
    }

    fn load_q_table(&mut self, path: &Path) {
        self.q_table.load(path)
    }

    fn reset(&mut self) {
        self.q_table.clear();
        self.action_selection.reset();
    }
}
