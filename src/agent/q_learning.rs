use std::path::Path;

use super::{check_epsilon, check_rates, q_learning_step, Agent, ParamError};
use crate::action_selection::{EpsilonGreedy, EpsilonUpdateStrategy};
use crate::env::{BlackJackAction, BlackJackObservation};
use crate::q_table::{PersistenceError, QTable};

/// Tabular Q-learning with a constant exploration rate.
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    q_table: QTable,
    learning_rate: f64,
    discount_factor: f64,
    action_selection: EpsilonGreedy,
}

impl QLearningAgent {
    pub fn new(
        learning_rate: f64,
        discount_factor: f64,
        epsilon: f64,
        seed: u64,
    ) -> Result<Self, ParamError> {
        check_rates(learning_rate, discount_factor)?;
        check_epsilon(epsilon)?;
        Ok(Self {
            q_table: QTable::new(),
            learning_rate,
            discount_factor,
            action_selection: EpsilonGreedy::new(epsilon, seed, EpsilonUpdateStrategy::None),
        })
    }
}

impl Agent for QLearningAgent {
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
        q_learning_step(
            &mut self.q_table,
            obs,
            action,
            reward,
            terminated,
            next_obs,
            self.learning_rate,
            self.discount_factor,
        )
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

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(p_score: u8, d_score: u8, p_ace: bool) -> BlackJackObservation {
        BlackJackObservation::new(p_score, d_score, p_ace)
    }

    fn agent() -> QLearningAgent {
        QLearningAgent::new(0.1, 0.95, 0.1, 42).unwrap()
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        assert_eq!(
            QLearningAgent::new(0.0, 0.95, 0.1, 0).unwrap_err(),
            ParamError::LearningRate(0.0)
        );
        assert!(QLearningAgent::new(1.5, 0.95, 0.1, 0).is_err());
        assert!(QLearningAgent::new(0.1, 0.0, 0.1, 0).is_err());
        assert!(QLearningAgent::new(0.1, 1.01, 0.1, 0).is_err());
        assert!(QLearningAgent::new(0.1, 0.95, -0.1, 0).is_err());
        assert!(QLearningAgent::new(0.1, 0.95, 1.2, 0).is_err());
        assert!(QLearningAgent::new(0.1, 0.95, f64::NAN, 0).is_err());
    }

    #[test]
    fn terminal_update_moves_towards_the_reward() {
        let mut agent = agent();
        let state = obs(15, 10, false);
        agent.update(&state, BlackJackAction::Hit, -1.0, true, &state);
        assert_eq!(agent.q_table().get(&state).unwrap()[1], -0.1);

        agent.update(&state, BlackJackAction::Hit, -1.0, true, &state);
        let value = agent.q_table().get(&state).unwrap()[1];
        assert_eq!(value, -0.1 + 0.1 * (-1.0 - (-0.1)));
        assert!((value - (-0.19)).abs() < 1e-12);
    }

    #[test]
    fn repeated_terminal_updates_converge_monotonically() {
        let mut agent = agent();
        let state = obs(12, 6, false);
        let mut distance = 1.0;
        for _ in 0..50 {
            agent.update(&state, BlackJackAction::Stand, 1.0, true, &state);
            let value = agent.q_table().get(&state).unwrap()[0];
            let next_distance = (1.0 - value).abs();
            assert!(next_distance < distance);
            distance = next_distance;
        }
    }

    #[test]
    fn non_terminal_update_bootstraps_from_the_next_state() {
        let mut agent = agent();
        let state = obs(12, 6, false);
        let next = obs(15, 6, false);
        let terminal = obs(22, 6, false);

        agent.update(&next, BlackJackAction::Stand, 1.0, true, &terminal);
        let max_next = agent.q_table().get(&next).unwrap()[0];
        assert!(max_next > 0.0);

        agent.update(&state, BlackJackAction::Hit, 0.5, false, &next);
        let expected = 0.1 * (0.5 + 0.95 * max_next);
        assert_eq!(agent.q_table().get(&state).unwrap()[1], expected);
    }

    #[test]
    fn unseen_states_are_implicit_zero_entries() {
        let mut agent = agent();
        let state = obs(20, 2, true);
        assert_eq!(agent.get_action(&state, false), BlackJackAction::Stand);
        agent.update(&state, BlackJackAction::Hit, 0.0, false, &obs(21, 2, true));
        assert_eq!(agent.q_table().get(&state).unwrap()[1], 0.0);
    }

    #[test]
    fn greedy_actions_follow_the_learned_values() {
        let mut agent = agent();
        let state = obs(15, 10, false);
        agent.update(&state, BlackJackAction::Hit, -1.0, true, &state);
        agent.update(&state, BlackJackAction::Stand, 1.0, true, &state);
        assert_eq!(agent.get_action(&state, false), BlackJackAction::Stand);
    }

    #[test]
    fn same_seed_same_training_decisions() {
        let mut a = QLearningAgent::new(0.1, 0.95, 0.5, 9).unwrap();
        let mut b = QLearningAgent::new(0.1, 0.95, 0.5, 9).unwrap();
        let state = obs(15, 10, false);
        for _ in 0..200 {
            assert_eq!(a.get_action(&state, true), b.get_action(&state, true));
        }
    }

    #[test]
    fn epsilon_stays_constant_across_episodes() {
        let mut agent = agent();
        let state = obs(15, 10, false);
        for _ in 0..100 {
            agent.update(&state, BlackJackAction::Hit, -1.0, true, &state);
        }
        assert_eq!(agent.epsilon(), 0.1);
    }

    #[test]
    fn reset_clears_the_table() {
        let mut agent = agent();
        let state = obs(15, 10, false);
        agent.update(&state, BlackJackAction::Hit, -1.0, true, &state);
        assert!(!agent.q_table().is_empty());
        agent.reset();
        assert!(agent.q_table().is_empty());
    }
}
