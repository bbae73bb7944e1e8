use std::error::Error;
use std::path::Path;

use blackjack_rl::env::BlackJackEnv;
use blackjack_rl::runner::GameRunner;
use blackjack_rl::utils::{plot_win_rates, save_json};
use blackjack_rl::{Agent, EnhancedQLearningAgent, EnumAgent, QLearningAgent};

use plotters::style::{BLUE, RED};
use serde_json::json;
use structopt::StructOpt;

/// Train a Q-learning agent on BlackJack and compare its win rate against the
/// fixed basic strategy
#[derive(StructOpt, Debug)]
#[structopt(name = "blackjack_rl")]
struct Cli {
    /// Which agent to run: basic, enhanced or both
    #[structopt(long = "agent", default_value = "basic")]
    agent: String,

    /// Show an example episode after training
    #[structopt(long = "show_example")]
    show_example: bool,

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

    /// Load a previously saved Q-table before training
    #[structopt(long = "load")]
    load: Option<String>,
}

fn build_agent(cli: &Cli, kind: &str) -> Result<EnumAgent, Box<dyn Error>> {
    let agent = match kind {
        "basic" => EnumAgent::from(QLearningAgent::new(
            cli.learning_rate,
            cli.discount_factor,
            cli.epsilon,
            cli.seed,
        )?),
        "enhanced" => EnumAgent::from(EnhancedQLearningAgent::new(
            cli.learning_rate,
            cli.discount_factor,
            cli.epsilon_start,
            cli.epsilon_end,
            cli.epsilon_decay,
            cli.seed,
        )?),
        other => {
            return Err(format!("unknown agent kind '{}', expected basic or enhanced", other).into())
        }
    };
    Ok(agent)
}

fn run_experiment(cli: &Cli, kind: &str) -> Result<(), Box<dyn Error>> {
    println!("Running {} Q-learning agent", kind);

    let mut agent = build_agent(cli, kind)?;
    if let Some(path) = &cli.load {
        agent.load_q_table(Path::new(path));
    }

    let mut runner = GameRunner::new(agent, BlackJackEnv::new(cli.seed));
    runner.collect_data(&cli.game_counts);
    runner.print_summary();
    if cli.show_example {
        runner.show_example();
    }

    let results = runner.results();
    let chart_path = format!("{}_win_rate_comparison.png", kind);
    plot_win_rates(
        &chart_path,
        "RL Agent vs Basic Strategy Win Rate Comparison",
        &results.game_counts,
        &[
            ("RL Agent", results.rl_win_rates.as_slice(), BLUE),
            ("Basic Strategy", results.basic_win_rates.as_slice(), RED),
        ],
    )?;

    let results_path = format!("{}_results.json", kind);
    save_json(
        &results_path,
        json!({
            "agent": kind,
            "game_counts": &results.game_counts,
            "rl_win_rates": &results.rl_win_rates,
            "basic_win_rates": &results.basic_win_rates,
        }),
    )?;

    let table_path = match kind {
        "enhanced" => "enhanced_q_table.json",
        _ => "q_table.json",
    };
    runner.agent().save_q_table(Path::new(table_path))?;

    println!("Results saved to '{}'", results_path);
    println!("Chart saved to '{}'", chart_path);
    println!("Q-table saved to '{}'", table_path);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli: Cli = Cli::from_args();
    match cli.agent.as_str() {
        "both" => {
            run_experiment(&cli, "basic")?;
            run_experiment(&cli, "enhanced")?;
        }
        kind => run_experiment(&cli, kind)?,
    }
    Ok(())
}
