use std::cmp::Ordering;

use rand::distributions::Uniform;
use rand::prelude::Distribution;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{Env, EnvError};

pub const N_ACTIONS: usize = 2;

/// The two moves available to the player, in value-table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlackJackAction {
    Stand = 0,
    Hit = 1,
}

impl BlackJackAction {
    pub const LABELS: [&'static str; N_ACTIONS] = ["STAND", "HIT"];

    pub fn label(&self) -> &'static str {
        Self::LABELS[*self as usize]
    }
}

impl From<BlackJackAction> for usize {
    fn from(action: BlackJackAction) -> usize {
        action as usize
    }
}

impl From<usize> for BlackJackAction {
    fn from(repr: usize) -> Self {
        match repr {
            0 => BlackJackAction::Stand,
            1 => BlackJackAction::Hit,
            repr => panic!("invalid action index {}, only {} actions exist", repr, N_ACTIONS),
        }
    }
}

/// What the player can see: their score, the dealer's up card and whether
/// they hold a usable ace. Doubles as the value-table key.
#[derive(Hash, Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BlackJackObservation {
    pub p_score: u8,
    pub d_score: u8,
    pub p_ace: bool,
}

impl BlackJackObservation {
    pub fn new(p_score: u8, d_score: u8, p_ace: bool) -> Self {
        Self {
            p_score,
            d_score,
            p_ace,
        }
    }
}

/// Simplified casino BlackJack drawn from an infinite deck: cards are worth
/// 1-10, an ace counts 10 extra while that keeps the hand at 21 or below,
/// and the dealer draws until reaching 17.
#[derive(Debug, Clone)]
pub struct BlackJackEnv {
    ready: bool,
    player: [u8; 16],
    player_i: usize,
    dealer: [u8; 16],
    dealer_i: usize,
    player_has_ace: bool,
    dealer_has_ace: bool,
    dist: Uniform<u8>,
    rng: SmallRng,
}

impl BlackJackEnv {
    pub fn new(seed: u64) -> Self {
        let mut env: BlackJackEnv = Self {
            ready: false,
            player: [0; 16],
            player_i: 0,
            dealer: [0; 16],
            dealer_i: 0,
            player_has_ace: false,
            dealer_has_ace: false,
            dist: Uniform::from(1..11),
            rng: SmallRng::seed_from_u64(seed),
        };
        env.initialize_hands();
        env
    }

    fn initialize_hands(&mut self) {
        self.player[0] = self.get_new_card();
        self.player[1] = self.get_new_card();
        self.player_i = 2;
        self.dealer[0] = self.get_new_card();
        self.dealer[1] = self.get_new_card();
        self.dealer_i = 2;
        self.player_has_ace = (self.player[0] == 1) || (self.player[1] == 1);
        self.dealer_has_ace = (self.dealer[0] == 1) || (self.dealer[1] == 1);
    }

    fn get_dealer_card(&self) -> u8 {
        self.dealer[0]
    }

    fn get_new_card(&mut self) -> u8 {
        self.dist.sample(&mut self.rng)
    }

    fn compute_player_score(&self) -> u8 {
        let score: u8 = self.player.iter().sum();
        if self.player_has_ace && score + 10 <= 21 {
            score + 10
        } else {
            score
        }
    }

    fn compute_dealer_score(&self) -> u8 {
        let score: u8 = self.dealer.iter().sum();
        if self.dealer_has_ace && score + 10 <= 21 {
            score + 10
        } else {
            score
        }
    }

    fn observe(&self, p_score: u8, d_score: u8) -> BlackJackObservation {
        BlackJackObservation::new(p_score, d_score, self.player_has_ace)
    }
}

impl Default for BlackJackEnv {
    fn default() -> Self {
        Self::new(42)
    }
}

impl Env<BlackJackObservation, BlackJackAction> for BlackJackEnv {
    fn reset(&mut self) -> BlackJackObservation {
        self.player = [0; 16];
        self.dealer = [0; 16];
        self.initialize_hands();
        self.ready = true;
        self.observe(self.compute_player_score(), self.get_dealer_card())
    }

    fn step(
        &mut self,
        action: BlackJackAction,
    ) -> Result<(BlackJackObservation, f64, bool), EnvError> {
        if !self.ready {
            return Err(EnvError::EnvNotReady);
        }
        match action {
            BlackJackAction::Hit => {
                self.player[self.player_i] = self.get_new_card();
                self.player_i += 1;
                let p_score: u8 = self.compute_player_score();
                if p_score > 21 {
                    self.ready = false;
                    return Ok((self.observe(p_score, self.compute_dealer_score()), -1.0, true));
                }
                Ok((self.observe(p_score, self.get_dealer_card()), 0.0, false))
            }
            BlackJackAction::Stand => {
                self.ready = false;
                let mut d_score: u8 = self.compute_dealer_score();
                while d_score < 17 {
                    self.dealer[self.dealer_i] = self.get_new_card();
                    self.dealer_i += 1;
                    d_score = self.compute_dealer_score();
                }
                let p_score: u8 = self.compute_player_score();
                let obs = self.observe(p_score, d_score);
                if d_score > 21 {
                    return Ok((obs, 1.0, true));
                }
                let reward: f64 = match p_score.cmp(&d_score) {
                    Ordering::Greater => 1.0,
                    Ordering::Less => -1.0,
                    Ordering::Equal => 0.0,
                };
                Ok((obs, reward, true))
            }
        }
    }

    fn render(&self) -> String {
        let mut result;
        if self.ready {
            result = format!("Dealer: {} \nPlayer: ", self.dealer[0]);
        } else {
            let mut dealer_cards = "".to_string();
            for i in &self.dealer[0..self.dealer_i] {
                dealer_cards.push_str(i.to_string().as_str());
                dealer_cards.push(' ');
            }
            result = format!("Dealer: {} \nPlayer: ", dealer_cards);
        }
        let mut player_cards = "".to_string();
        for i in &self.player[0..self.player_i] {
            player_cards.push_str(i.to_string().as_str());
            player_cards.push(' ');
        }
        result.push_str(&player_cards);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_episode() {
        let mut a = BlackJackEnv::new(7);
        let mut b = BlackJackEnv::new(7);
        for _ in 0..100 {
            assert_eq!(a.reset(), b.reset());
            loop {
                let (obs_a, reward_a, done_a) = a.step(BlackJackAction::Hit).unwrap();
                let (obs_b, reward_b, done_b) = b.step(BlackJackAction::Hit).unwrap();
                assert_eq!(obs_a, obs_b);
                assert_eq!(reward_a, reward_b);
                assert_eq!(done_a, done_b);
                if done_a {
                    break;
                }
            }
        }
    }

    #[test]
    fn reset_observation_is_in_range() {
        for seed in 0..50 {
            let mut env = BlackJackEnv::new(seed);
            let obs = env.reset();
            assert!((4..=21).contains(&obs.p_score), "player score {}", obs.p_score);
            assert!((1..=10).contains(&obs.d_score), "dealer card {}", obs.d_score);
        }
    }

    #[test]
    fn standing_terminates_with_game_outcome() {
        let mut env = BlackJackEnv::new(3);
        for _ in 0..100 {
            env.reset();
            let (_, reward, terminated) = env.step(BlackJackAction::Stand).unwrap();
            assert!(terminated);
            assert!(reward == 1.0 || reward == -1.0 || reward == 0.0);
        }
    }

    #[test]
    fn hitting_terminates_within_a_handful_of_cards() {
        let mut env = BlackJackEnv::new(11);
        for _ in 0..100 {
            env.reset();
            let mut steps = 0;
            loop {
                steps += 1;
                assert!(steps <= 20, "episode did not terminate");
                let (_, _, terminated) = env.step(BlackJackAction::Hit).unwrap();
                if terminated {
                    break;
                }
            }
        }
    }

    #[test]
    fn step_before_reset_is_rejected() {
        let mut env = BlackJackEnv::new(0);
        assert!(env.step(BlackJackAction::Hit).is_err());
    }

    #[test]
    fn step_after_terminal_is_rejected() {
        let mut env = BlackJackEnv::new(0);
        env.reset();
        env.step(BlackJackAction::Stand).unwrap();
        assert!(env.step(BlackJackAction::Hit).is_err());
    }

    #[test]
    fn action_round_trips_through_usize() {
        assert_eq!(BlackJackAction::from(0), BlackJackAction::Stand);
        assert_eq!(BlackJackAction::from(1), BlackJackAction::Hit);
        assert_eq!(usize::from(BlackJackAction::Stand), 0);
        assert_eq!(usize::from(BlackJackAction::Hit), 1);
    }

    #[test]
    #[should_panic(expected = "invalid action index")]
    fn out_of_range_action_panics() {
        let _ = BlackJackAction::from(2);
    }
}
