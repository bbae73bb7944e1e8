use kdam::tqdm;
use log::info;

use crate::agent::{Agent, EnumAgent};
use crate::basic_strategy::basic_strategy;
use crate::env::{BlackJackAction, BlackJackEnv, BlackJackObservation, Env};

/// Which policy is holding the cards for an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    Learner,
    Baseline,
}

/// Win rates observed for each batch size, for the learner and the fixed
/// baseline.
#[derive(Debug, Clone, Default)]
pub struct ComparisonResults {
    pub game_counts: Vec<usize>,
    pub rl_win_rates: Vec<f64>,
    pub basic_win_rates: Vec<f64>,
}

/// Drives episodes of one environment with one learning agent.
///
/// The runner owns both collaborators, so independent experiments can run
/// side by side in the same process without sharing state.
pub struct GameRunner {
    env: BlackJackEnv,
    agent: EnumAgent,
    results: ComparisonResults,
}

impl GameRunner {
    pub fn new(agent: EnumAgent, env: BlackJackEnv) -> Self {
        Self {
            env,
            agent,
            results: ComparisonResults::default(),
        }
    }

    pub fn agent(&self) -> &EnumAgent {
        &self.agent
    }

    pub fn results(&self) -> &ComparisonResults {
        &self.results
    }

    /// Play a single episode to completion and return its final reward.
    /// Transitions reach the agent only when the learner plays in training
    /// mode.
    pub fn play_episode(&mut self, player: Player, training: bool) -> f64 {
        let mut obs: BlackJackObservation = self.env.reset();
        loop {
            let action: BlackJackAction = match player {
                Player::Learner => self.agent.get_action(&obs, training),
                Player::Baseline => basic_strategy(obs.p_score),
            };
            let (next_obs, reward, terminated) = self.env.step(action).unwrap();
            if training && player == Player::Learner {
                self.agent.update(&obs, action, reward, terminated, &next_obs);
            }
            obs = next_obs;
            if terminated {
                return reward;
            }
        }
    }

    /// Win rate over `num_games` fresh episodes.
    pub fn run_games(&mut self, num_games: usize, player: Player, training: bool) -> f64 {
        let mut wins: usize = 0;
        for _ in tqdm!(0..num_games) {
            if self.play_episode(player, training) > 0.0 {
                wins += 1;
            }
        }
        wins as f64 / num_games as f64
    }

    /// Train-then-measure sweep: for each batch size the learner trains for
    /// that many games, then the learner and the baseline are each measured
    /// greedily over the same number of games.
    pub fn collect_data(&mut self, game_counts: &[usize]) -> &ComparisonResults {
        for &num_games in game_counts {
            info!("running batch of {} games", num_games);
            self.run_games(num_games, Player::Learner, true);
            let rl_win_rate = self.run_games(num_games, Player::Learner, false);
            let basic_win_rate = self.run_games(num_games, Player::Baseline, false);
            info!(
                "batch {}: learner {:.3}, baseline {:.3} (epsilon {:.3}, {} states seen)",
                num_games,
                rl_win_rate,
                basic_win_rate,
                self.agent.epsilon(),
                self.agent.q_table().len()
            );
            self.results.game_counts.push(num_games);
            self.results.rl_win_rates.push(rl_win_rate);
            self.results.basic_win_rates.push(basic_win_rate);
        }
        &self.results
    }

    /// Play one greedy episode, narrating each move.
    pub fn show_example(&mut self) {
        let mut obs: BlackJackObservation = self.env.reset();
        let mut epi_reward = 0.0;
        let mut steps: i32 = 0;
        loop {
            steps += 1;
            println!("{}", self.env.render());
            let action = self.agent.get_action(&obs, false);
            println!("action: {}", action.label());
            let (next_obs, reward, terminated) = self.env.step(action).unwrap();
            println!("step reward {:?}", reward);
            epi_reward += reward;
            obs = next_obs;
            if terminated {
                println!("{}", self.env.render());
                println!("episode reward {:?}", epi_reward);
                println!("terminated with {:?} steps", steps);
                break;
            }
        }
    }

    /// Per-batch win rates plus overall averages, as a plain text table.
    pub fn summary(&self) -> String {
        let results = &self.results;
        if results.game_counts.is_empty() {
            return "no results collected yet".to_string();
        }
        let mut out = String::new();
        out.push_str(&"=".repeat(60));
        out.push('\n');
        out.push_str("WIN RATE COMPARISON SUMMARY\n");
        out.push_str(&"=".repeat(60));
        out.push('\n');
        out.push_str(&format!(
            "{:<8} {:<12} {:<15} {:<12}\n",
            "Games", "RL Agent", "Basic Strategy", "Difference"
        ));
        out.push_str(&"-".repeat(60));
        out.push('\n');
        for (i, num_games) in results.game_counts.iter().enumerate() {
            let rl_rate = results.rl_win_rates[i];
            let basic_rate = results.basic_win_rates[i];
            out.push_str(&format!(
                "{:<8} {:<12.3} {:<15.3} {:<12.3}\n",
                num_games,
                rl_rate,
                basic_rate,
                rl_rate - basic_rate
            ));
        }
        out.push_str(&"-".repeat(60));
        out.push('\n');
        let batches = results.game_counts.len() as f64;
        let avg_rl: f64 = results.rl_win_rates.iter().sum::<f64>() / batches;
        let avg_basic: f64 = results.basic_win_rates.iter().sum::<f64>() / batches;
        out.push_str(&format!(
            "{:<8} {:<12.3} {:<15.3} {:<12.3}\n",
            "AVERAGE",
            avg_rl,
            avg_basic,
            avg_rl - avg_basic
        ));
        out.push_str(&"=".repeat(60));
        out
    }

    pub fn print_summary(&self) {
        println!("{}", self.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::QLearningAgent;

    fn runner(seed: u64) -> GameRunner {
        let agent = QLearningAgent::new(0.1, 0.95, 0.1, seed).unwrap();
        GameRunner::new(EnumAgent::from(agent), BlackJackEnv::new(seed))
    }

    #[test]
    fn episodes_end_with_a_game_outcome() {
        let mut runner = runner(5);
        for _ in 0..50 {
            let reward = runner.play_episode(Player::Baseline, false);
            assert!(reward == 1.0 || reward == -1.0 || reward == 0.0);
        }
    }

    #[test]
    fn training_grows_the_value_table() {
        let mut runner = runner(5);
        runner.run_games(200, Player::Learner, true);
        assert!(!runner.agent().q_table().is_empty());
    }

    #[test]
    fn evaluation_leaves_values_untouched() {
        let mut runner = runner(5);
        runner.run_games(100, Player::Learner, true);
        let before = runner.agent().q_table().clone();
        runner.run_games(100, Player::Baseline, false);
        assert_eq!(runner.agent().q_table(), &before);
    }

    #[test]
    fn collect_data_records_one_rate_pair_per_batch() {
        let mut runner = runner(5);
        let counts = [5, 10, 20];
        let results = runner.collect_data(&counts).clone();
        assert_eq!(results.game_counts, counts);
        assert_eq!(results.rl_win_rates.len(), counts.len());
        assert_eq!(results.basic_win_rates.len(), counts.len());
        for rate in results.rl_win_rates.iter().chain(&results.basic_win_rates) {
            assert!((0.0..=1.0).contains(rate));
        }
    }

    #[test]
    fn identical_seeds_reproduce_the_whole_experiment() {
        let mut a = runner(123);
        let mut b = runner(123);
        let counts = [10, 20];
        let results_a = a.collect_data(&counts).clone();
        let results_b = b.collect_data(&counts).clone();
        assert_eq!(results_a.rl_win_rates, results_b.rl_win_rates);
        assert_eq!(results_a.basic_win_rates, results_b.basic_win_rates);
        assert_eq!(a.agent().q_table(), b.agent().q_table());
    }

    #[test]
    fn summary_reports_every_batch() {
        let mut runner = runner(5);
        runner.collect_data(&[5, 10]);
        let summary = runner.summary();
        assert!(summary.contains("WIN RATE COMPARISON SUMMARY"));
        assert!(summary.contains("AVERAGE"));
    }
}
