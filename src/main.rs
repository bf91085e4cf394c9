//! Timetable search CLI.
//!
//! Runs one algorithm on a YAML descriptor a number of times, appends a
//! summary to the run history and writes the best timetable found to
//! `outputs/<descriptor-stem>.txt`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use log::{error, info};

use u_timetable::env::Environment;
use u_timetable::hc::HcConfig;
use u_timetable::mcts::MctsConfig;
use u_timetable::trial::{
    append_history, render_soft_report, render_timetable, run_trials, Algorithm, TrialConfig,
    HISTORY_FILE,
};
use u_timetable::Result;

#[derive(Parser)]
#[command(name = "u-timetable")]
#[command(about = "Weekly university timetabling with hill climbing and MCTS")]
struct Cli {
    /// Search algorithm
    #[arg(value_enum)]
    algorithm: Algorithm,

    /// YAML descriptor of days, intervals, rooms, subjects and professors
    input: PathBuf,

    /// Number of independent trials
    #[arg(default_value = "1")]
    trials: usize,

    /// Base random seed (trial k uses seed + k)
    #[arg(long)]
    seed: Option<u64>,

    /// Run trials in parallel
    #[arg(long)]
    parallel: bool,

    /// Maximum descent steps per hill climb
    #[arg(long, default_value = "200")]
    max_iterations: usize,

    /// Improving neighbors collected per first-X step
    #[arg(long, default_value = "50")]
    first_x: i64,

    /// Restarts of the random-restart hill climber
    #[arg(long, default_value = "10")]
    max_restarts: usize,

    /// Simulations per MCTS decision
    #[arg(long, default_value = "50")]
    budget: usize,

    /// Directory the best timetable is written to
    #[arg(long, default_value = "outputs")]
    output_dir: PathBuf,

    /// File the run summary is appended to
    #[arg(long, default_value = HISTORY_FILE)]
    history: PathBuf,

    /// Print each professor's preferences against the best timetable
    #[arg(long)]
    soft_report: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let env = Arc::new(Environment::from_path(&cli.input)?);
    info!(
        "loaded {}: {} days, {} intervals, {} rooms, {} subjects, {} professors",
        cli.input.display(),
        env.num_days(),
        env.num_intervals(),
        env.num_rooms(),
        env.subjects().len(),
        env.professors().len()
    );

    let mut hc = HcConfig::default()
        .with_max_iterations(cli.max_iterations)
        .with_first_x(cli.first_x)
        .with_max_restarts(cli.max_restarts);
    let mut mcts = MctsConfig::default().with_budget(cli.budget);
    if let Some(seed) = cli.seed {
        hc = hc.with_seed(seed);
        mcts = mcts.with_seed(seed);
    }

    let mut config = TrialConfig::default()
        .with_trials(cli.trials)
        .with_parallel(cli.parallel)
        .with_hc(hc)
        .with_mcts(mcts);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let start = Instant::now();
    let summary = run_trials(&env, cli.algorithm, &config)?;
    let elapsed = start.elapsed();

    let input = cli.input.display().to_string();
    append_history(&cli.history, &input, cli.algorithm, &summary)?;

    let out_file = output_path(&cli.output_dir, &cli.input);
    fs::create_dir_all(&cli.output_dir)?;
    info!("writing best state to {}", out_file.display());
    fs::write(&out_file, render_timetable(&summary.best))?;

    println!("Wins: {} | Fails: {}", summary.wins, summary.fails);
    println!("Win percentage: {:.2}", summary.win_rate());
    println!(
        "Average number of states explored: {:.2}",
        summary.average_states()
    );
    println!("Average end fitness: {:.2}", summary.average_end_fitness());
    println!("Best state has fitness {}", summary.best_fitness());
    println!("Execution time: {:.2} seconds", elapsed.as_secs_f64());

    if cli.soft_report {
        print!("{}", render_soft_report(&summary.best));
    }
    Ok(())
}

fn output_path(dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "timetable".to_string());
    dir.join(format!("{stem}.txt"))
}
