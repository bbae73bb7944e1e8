mod enhanced_q_learning;
mod q_learning;

pub use enhanced_q_learning::EnhancedQLearningAgent;
pub use q_learning::QLearningAgent;

use std::fmt;
use std::path::Path;

use enum_dispatch::enum_dispatch;

use crate::env::{BlackJackAction, BlackJackObservation};
use crate::q_table::{PersistenceError, QTable};

/// Construction parameter outside its valid range.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    LearningRate(f64),
    DiscountFactor(f64),
    Epsilon(f64),
    EpsilonRange { start: f64, end: f64 },
    EpsilonDecay(f64),
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::LearningRate(v) => {
                write!(f, "learning rate must be in (0, 1], got {}", v)
            }
            ParamError::DiscountFactor(v) => {
                write!(f, "discount factor must be in (0, 1], got {}", v)
            }
            ParamError::Epsilon(v) => {
                write!(f, "exploration rate must be in [0, 1], got {}", v)
            }
            ParamError::EpsilonRange { start, end } => {
                write!(f, "exploration bounds are inverted: start {} is below end {}", start, end)
            }
            ParamError::EpsilonDecay(v) => {
                write!(f, "epsilon decay must be in (0, 1), got {}", v)
            }
        }
    }
}

impl std::error::Error for ParamError {}

pub(crate) fn check_rates(learning_rate: f64, discount_factor: f64) -> Result<(), ParamError> {
    if !(learning_rate > 0.0 && learning_rate <= 1.0) {
        return Err(ParamError::LearningRate(learning_rate));
    }
    if !(discount_factor > 0.0 && discount_factor <= 1.0) {
        return Err(ParamError::DiscountFactor(discount_factor));
    }
    Ok(())
}

pub(crate) fn check_epsilon(epsilon: f64) -> Result<(), ParamError> {
    if !(0.0..=1.0).contains(&epsilon) {
        return Err(ParamError::Epsilon(epsilon));
    }
    Ok(())
}

/// One-step tabular Q-learning update. Returns the temporal-difference
/// error. On terminal transitions the target is the raw reward, with no
/// bootstrap term; both state keys are lazily inserted.
pub fn q_learning_step(
    q_table: &mut QTable,
    obs: &BlackJackObservation,
    action: BlackJackAction,
    reward: f64,
    terminated: bool,
    next_obs: &BlackJackObservation,
    learning_rate: f64,
    discount_factor: f64,
) -> f64 {
    let next_q_values = q_table.action_values(next_obs);
    let future_q_value: f64 = if terminated {
        0.0
    } else {
        next_q_values
            .iter()
            .skip(1)
            .fold(next_q_values[0], |acc, x| acc.max(*x))
    };
    let curr_q_values = q_table.entry_mut(obs);
    let temporal_difference: f64 =
        reward + discount_factor * future_q_value - curr_q_values[usize::from(action)];
    curr_q_values[usize::from(action)] += learning_rate * temporal_difference;
    temporal_difference
}

/// Behaviour shared by the two Q-learning variants.
#[enum_dispatch]
pub trait Agent {
    /// Epsilon-greedy while training, pure greedy otherwise.
    fn get_action(&mut self, obs: &BlackJackObservation, training: bool) -> BlackJackAction;

    /// Consume one transition; returns the temporal-difference error.
    fn update(
        &mut self,
        obs: &BlackJackObservation,
        action: BlackJackAction,
        reward: f64,
        terminated: bool,
        next_obs: &BlackJackObservation,
    ) -> f64;

    /// Current exploration rate.
    fn epsilon(&self) -> f64;

    fn q_table(&self) -> &QTable;

    fn save_q_table(&self, path: &Path) -> Result<(), PersistenceError>;

    /// Fail-soft: a missing or corrupt artifact leaves the table untouched.
    fn load_q_table(&mut self, path: &Path);

    /// Forget everything learned and restore the initial exploration rate.
    fn reset(&mut self);
}

/// The agent variants known to the experiment binaries.
#[enum_dispatch(Agent)]
#[derive(Debug, Clone)]
pub enum EnumAgent {
    QLearning(QLearningAgent),
    EnhancedQLearning(EnhancedQLearningAgent),
}
