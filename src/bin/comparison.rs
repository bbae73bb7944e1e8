use std::error::Error;

use blackjack_rl::env::BlackJackEnv;
use blackjack_rl::runner::{ComparisonResults, GameRunner};
use blackjack_rl::utils::{plot_win_rates, save_json};
use blackjack_rl::{EnhancedQLearningAgent, EnumAgent, QLearningAgent};

use plotters::style::{BLUE, GREEN, RED};
use serde_json::json;
use structopt::StructOpt;

/// Compare the basic and enhanced Q-learning agents against the fixed basic
/// strategy on the same batch schedule
#[derive(StructOpt, Debug)]
#[structopt(name = "blackjack_rl - comparison")]
struct Cli {
    /// Batch sizes to train and measure on
    #[structopt(
        long = "game_counts",
        use_delimiter = true,
        default_value = "5,10,20,50,100,200,500,1000"
    )]
    game_counts: Vec<usize>,

    /// Learning rate of the Q-learning update
    #[structopt(long = "learning_rate", default_value = "0.1")]
    learning_rate: f64,

    /// Discount factor used on the temporal difference calculation
    #[structopt(long = "discount_factor", default_value = "0.95")]
    discount_factor: f64,

    /// Exploration ratio of the basic agent
    #[structopt(long = "epsilon", default_value = "0.1")]
    epsilon: f64,

    /// Initial exploration ratio of the enhanced agent
    #[structopt(long = "epsilon_start", default_value = "1.0")]
    epsilon_start: f64,

    /// Exploration floor of the enhanced agent
    #[structopt(long = "epsilon_end", default_value = "0.01")]
    epsilon_end: f64,

    /// Per-episode multiplicative decay of the enhanced agent's exploration
    #[structopt(long = "epsilon_decay", default_value = "0.995")]
    epsilon_decay: f64,

    /// Seed for the agent and environment random sources
    #[structopt(long = "seed", default_value = "42")]
    seed: u64,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli: Cli = Cli::from_args();

    let agents: Vec<(&str, EnumAgent)> = vec![
        (
            "Basic Q-Learning",
            EnumAgent::from(QLearningAgent::new(
                cli.learning_rate,
                cli.discount_factor,
                cli.epsilon,
                cli.seed,
            )?),
        ),
        (
            "Enhanced Q-Learning",
            EnumAgent::from(EnhancedQLearningAgent::new(
                cli.learning_rate,
                cli.discount_factor,
                cli.epsilon_start,
                cli.epsilon_end,
                cli.epsilon_decay,
                cli.seed,
            )?),
        ),
    ];

    let mut all_results: Vec<(&str, ComparisonResults)> = vec![];
    for (name, agent) in agents {
        println!("Testing {}...", name);
        let mut runner = GameRunner::new(agent, BlackJackEnv::new(cli.seed));
        runner.collect_data(&cli.game_counts);
        runner.print_summary();
        all_results.push((name, runner.results().clone()));
    }

    // the baseline is measured identically for every agent; chart the first
    let baseline = &all_results[0].1.basic_win_rates;
    plot_win_rates(
        "agent_comparison.png",
        "Comparison of RL Agents vs Basic Strategy",
        &cli.game_counts,
        &[
            ("Basic Strategy", baseline.as_slice(), RED),
            (all_results[0].0, all_results[0].1.rl_win_rates.as_slice(), BLUE),
            (all_results[1].0, all_results[1].1.rl_win_rates.as_slice(), GREEN),
        ],
    )?;

    save_json(
        "agent_comparison.json",
        json!({
            "game_counts": &cli.game_counts,
            "basic_strategy_win_rates": baseline,
            "agents": all_results
                .iter()
                .map(|(name, results)| json!({
                    "name": name,
                    "rl_win_rates": &results.rl_win_rates,
                }))
                .collect::<Vec<_>>(),
        }),
    )?;

    println!("\nAGENT PERFORMANCE SUMMARY");
    for (name, results) in &all_results {
        let avg_rl = mean(&results.rl_win_rates);
        let avg_basic = mean(&results.basic_win_rates);
        println!("\n{}:", name);
        println!("Average RL Win Rate: {:.3}", avg_rl);
        println!("Average Basic Strategy Win Rate: {:.3}", avg_basic);
        println!("Improvement over Basic Strategy: {:.3}", avg_rl - avg_basic);
        if let Some((games, best)) = results
            .game_counts
            .iter()
            .zip(&results.rl_win_rates)
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        {
            println!("Best RL Performance: {:.3} ({} games)", best, games);
        }
    }

    println!("\nComparison plot saved to 'agent_comparison.png'");
    Ok(())
}
