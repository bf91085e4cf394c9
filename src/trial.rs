//! Repeated runs of one algorithm on one environment, and their reports.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use clap::ValueEnum;
use log::info;

use crate::env::{DayId, Environment, Interval, IntervalId};
use crate::error::{Result, TimetableError};
use crate::hc::{HcConfig, HcRunner, HcVariant};
use crate::mcts::{MctsConfig, MctsRunner};
use crate::state::{
    State, INTERVALS_PENALTY, MULT_PENALTY, SOFT_PENALTY, STUD_LEFT_PENALTY,
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Default file the run history is appended to.
pub const HISTORY_FILE: &str = "results_timeline";

/// A search algorithm selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Algorithm {
    /// Random-restart first-X hill climbing.
    #[value(name = "hc")]
    Hc,
    /// First-X hill climbing.
    #[value(name = "hc_first")]
    HcFirst,
    /// Steepest-descent hill climbing.
    #[value(name = "hc_classic")]
    HcClassic,
    /// Monte Carlo tree search.
    #[value(name = "mcts")]
    Mcts,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => Ok(()),
        }
    }
}

impl FromStr for Algorithm {
    type Err = TimetableError;

    fn from_str(s: &str) -> Result<Self> {
        <Self as ValueEnum>::from_str(s, false).map_err(TimetableError::InvalidConfig)
    }
}

/// Configuration for a batch of trials.
#[derive(Debug, Clone)]
pub struct TrialConfig {
    /// Independent runs to perform.
    pub trials: usize,

    /// Whether to run trials in parallel (needs the `parallel` feature).
    pub parallel: bool,

    /// Base seed; trial `k` uses `seed + k`.
    pub seed: Option<u64>,

    /// Parameters of the hill-climbing variants.
    pub hc: HcConfig,

    /// Parameters of MCTS.
    pub mcts: MctsConfig,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            trials: 1,
            parallel: false,
            seed: None,
            hc: HcConfig::default(),
            mcts: MctsConfig::default(),
        }
    }
}

impl TrialConfig {
    pub fn with_trials(mut self, n: usize) -> Self {
        self.trials = n;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_hc(mut self, hc: HcConfig) -> Self {
        self.hc = hc;
        self
    }

    pub fn with_mcts(mut self, mcts: MctsConfig) -> Self {
        self.mcts = mcts;
        self
    }

    /// Validates the configuration and the nested search configurations.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.trials == 0 {
            return Err("trials must be at least 1".into());
        }
        self.hc.validate()?;
        self.mcts.validate()
    }
}

/// What one trial produced.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub reached_final: bool,
    pub iterations: usize,
    pub states_explored: usize,
    pub state: State,
}

/// Aggregate of a batch of trials.
#[derive(Debug, Clone)]
pub struct TrialSummary {
    /// Trials that reached a final timetable.
    pub wins: usize,

    /// Trials that did not.
    pub fails: usize,

    /// End fitness per trial; 0 for wins.
    pub end_fitness: Vec<i64>,

    /// States explored, summed over trials.
    pub total_states: usize,

    /// The lowest-fitness state over all trials (earliest on ties).
    pub best: State,
}

impl TrialSummary {
    pub fn trials(&self) -> usize {
        self.wins + self.fails
    }

    /// Share of winning trials, in percent.
    pub fn win_rate(&self) -> f64 {
        self.wins as f64 / self.trials() as f64 * 100.0
    }

    pub fn average_states(&self) -> f64 {
        self.total_states as f64 / self.trials() as f64
    }

    /// Mean end fitness, counting wins as 0.
    pub fn average_end_fitness(&self) -> f64 {
        self.end_fitness.iter().sum::<i64>() as f64 / self.trials() as f64
    }

    pub fn best_fitness(&self) -> i64 {
        self.best.total_fitness()
    }
}

/// Runs one trial of `algorithm` from an empty timetable.
pub fn run_trial(
    env: &Arc<Environment>,
    algorithm: Algorithm,
    config: &TrialConfig,
    index: usize,
) -> Result<TrialOutcome> {
    let initial = State::new(Arc::clone(env))?;
    let seed = config.seed.map(|s| s.wrapping_add(index as u64));

    let outcome = match algorithm {
        Algorithm::Mcts => {
            let mut mcts = config.mcts.clone();
            mcts.seed = seed;
            let r = MctsRunner::run(&initial, &mcts)?;
            TrialOutcome {
                reached_final: r.reached_final,
                iterations: r.iterations,
                states_explored: r.states_explored,
                state: r.state,
            }
        }
        hc => {
            let variant = match hc {
                Algorithm::HcFirst => HcVariant::FirstX,
                Algorithm::HcClassic => HcVariant::Classic,
                _ => HcVariant::RandomRestart,
            };
            let mut hc_config = config.hc.clone();
            hc_config.seed = seed;
            let r = HcRunner::run(&initial, variant, &hc_config)?;
            TrialOutcome {
                reached_final: r.reached_final,
                iterations: r.iterations,
                states_explored: r.states_explored,
                state: r.best,
            }
        }
    };

    info!(
        "trial {} | {} | iters {} | states {} | fitness {}",
        index + 1,
        if outcome.reached_final { "W" } else { "L" },
        outcome.iterations,
        outcome.states_explored,
        outcome.state.total_fitness()
    );
    Ok(outcome)
}

/// Runs `config.trials` independent trials and aggregates them.
pub fn run_trials(
    env: &Arc<Environment>,
    algorithm: Algorithm,
    config: &TrialConfig,
) -> Result<TrialSummary> {
    config.validate().map_err(TimetableError::InvalidConfig)?;

    let outcomes: Vec<TrialOutcome> = if config.parallel {
        run_parallel(env, algorithm, config)?
    } else {
        (0..config.trials)
            .map(|k| run_trial(env, algorithm, config, k))
            .collect::<Result<_>>()?
    };

    summarize(outcomes)
}

#[cfg(feature = "parallel")]
fn run_parallel(
    env: &Arc<Environment>,
    algorithm: Algorithm,
    config: &TrialConfig,
) -> Result<Vec<TrialOutcome>> {
    (0..config.trials)
        .into_par_iter()
        .map(|k| run_trial(env, algorithm, config, k))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn run_parallel(
    env: &Arc<Environment>,
    algorithm: Algorithm,
    config: &TrialConfig,
) -> Result<Vec<TrialOutcome>> {
    log::warn!("built without the `parallel` feature; running trials sequentially");
    (0..config.trials)
        .map(|k| run_trial(env, algorithm, config, k))
        .collect()
}

fn summarize(outcomes: Vec<TrialOutcome>) -> Result<TrialSummary> {
    let mut wins = 0;
    let mut fails = 0;
    let mut end_fitness = Vec::with_capacity(outcomes.len());
    let mut total_states = 0;
    let mut best: Option<State> = None;

    for outcome in outcomes {
        total_states += outcome.states_explored;
        if outcome.reached_final {
            wins += 1;
            end_fitness.push(0);
        } else {
            fails += 1;
            end_fitness.push(outcome.state.total_fitness());
        }
        let fitness = outcome.state.total_fitness();
        if best.as_ref().map_or(true, |b| fitness < b.total_fitness()) {
            best = Some(outcome.state);
        }
    }

    let best = best.ok_or_else(|| TimetableError::InvalidConfig("no trials were run".into()))?;
    Ok(TrialSummary {
        wins,
        fails,
        end_fitness,
        total_states,
        best,
    })
}

/// Appends a dated summary block for a batch of trials to `path`.
pub fn append_history(
    path: impl AsRef<Path>,
    input: &str,
    algorithm: Algorithm,
    summary: &TrialSummary,
) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())?;
    file.write_all(history_entry(input, algorithm, summary).as_bytes())?;
    Ok(())
}

fn history_entry(input: &str, algorithm: Algorithm, summary: &TrialSummary) -> String {
    let params = [
        INTERVALS_PENALTY,
        STUD_LEFT_PENALTY,
        MULT_PENALTY,
        SOFT_PENALTY,
        SOFT_PENALTY,
    ];
    format!(
        "-- {} --\nversion: {}\nparams: {:?}\nnum_trials: {}\n\
         file: {} | alg: {} | W: {} | L: {} | avg_fit: {:.2} | best_fit: {}\n\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f"),
        env!("CARGO_PKG_VERSION"),
        params,
        summary.trials(),
        input,
        algorithm,
        summary.wins,
        summary.fails,
        summary.average_end_fitness(),
        summary.best_fitness(),
    )
}

/// Renders a timetable as text, one block per day.
///
/// ```text
/// Luni
///   8-10   | EG301: Ana : IA | EG390: -
/// ```
pub fn render_timetable(state: &State) -> String {
    let env = state.environment();
    let mut out = String::new();

    for (day, day_name) in env.days().iter().enumerate() {
        out.push_str(day_name);
        out.push('\n');
        for (interval, span) in env.intervals().iter().enumerate() {
            let cells: Vec<String> = env
                .rooms()
                .iter()
                .enumerate()
                .map(|(room, r)| match state.occupant(day, interval, room) {
                    Some(o) => format!(
                        "{}: {} : {}",
                        r.name,
                        env.professor(o.professor).name,
                        env.subject(o.subject).name
                    ),
                    None => format!("{}: -", r.name),
                })
                .collect();
            out.push_str(&format!("  {:<6} | {}\n", span.to_string(), cells.join(" | ")));
        }
        out.push('\n');
    }

    out.push_str(&format!("fitness: {}\n", state.fitness()));
    out
}

/// Lists every professor's preferences against the slots they teach.
///
/// One line per distinct busy day and interval, one per day with two or
/// more classes when a pause limit is set, then the soft-violation total.
pub fn render_soft_report(state: &State) -> String {
    let env = state.environment();
    let mut out = String::new();

    for (p, prof) in env.professors().iter().enumerate() {
        let slots = state.professor_slots(p);
        let subjects: Vec<&str> = prof
            .subjects
            .iter()
            .map(|&s| env.subject(s).name.as_str())
            .collect();
        out.push_str(&format!("{} ({})\n", prof.name, subjects.join(", ")));

        let days: BTreeSet<DayId> = slots.iter().map(|&(d, _)| d).collect();
        let intervals: BTreeSet<IntervalId> = slots.iter().map(|&(_, i)| i).collect();
        for &d in &days {
            out.push_str(&format!(
                "  {} -> {}\n",
                env.days()[d],
                verdict(!env.forbids_day(p, d))
            ));
        }
        for &i in &intervals {
            out.push_str(&format!(
                "  {} -> {}\n",
                env.intervals()[i],
                verdict(!env.forbids_interval(p, i))
            ));
        }

        if let Some(limit) = env.max_pause(p) {
            for &d in &days {
                let mut today: Vec<Interval> = slots
                    .iter()
                    .filter(|&&(day, _)| day == d)
                    .map(|&(_, i)| env.intervals()[i])
                    .collect();
                if today.len() < 2 {
                    continue;
                }
                today.sort();
                let longest = today
                    .windows(2)
                    .map(|w| w[1].start as i64 - w[0].end as i64)
                    .max()
                    .unwrap_or(0);
                out.push_str(&format!(
                    "  pause on {}: {}h (max {}h) -> {}\n",
                    env.days()[d],
                    longest,
                    limit,
                    verdict(longest <= limit as i64)
                ));
            }
        }
    }

    out.push_str(&format!("soft violations: {}\n", state.fitness().soft()));
    out
}

fn verdict(satisfied: bool) -> &'static str {
    if satisfied {
        "satisfied"
    } else {
        "NOT satisfied"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::ProfConstraints;
    use crate::state::Action;

    fn easy_env() -> Arc<Environment> {
        Arc::new(
            Environment::builder()
                .with_day("Luni")
                .with_interval(8, 10)
                .with_interval(10, 12)
                .with_room("A", 30, &["IA"])
                .with_room("B", 30, &["PCOM"])
                .with_subject("IA", 60)
                .with_subject("PCOM", 30)
                .with_professor("Ana", &["IA"], ProfConstraints::default())
                .with_professor("Dan", &["PCOM"], ProfConstraints::default())
                .build()
                .unwrap(),
        )
    }

    fn outcome(state: State) -> TrialOutcome {
        TrialOutcome {
            reached_final: state.is_final(),
            iterations: 1,
            states_explored: 10,
            state,
        }
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("hc".parse::<Algorithm>().unwrap(), Algorithm::Hc);
        assert_eq!("hc_first".parse::<Algorithm>().unwrap(), Algorithm::HcFirst);
        assert_eq!("hc_classic".parse::<Algorithm>().unwrap(), Algorithm::HcClassic);
        assert_eq!("mcts".parse::<Algorithm>().unwrap(), Algorithm::Mcts);
        assert!("bfs".parse::<Algorithm>().is_err());
        assert!("HC".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_algorithm_names_round_trip() {
        for algorithm in Algorithm::value_variants() {
            let name = algorithm.to_string();
            assert_eq!(name.parse::<Algorithm>().unwrap(), *algorithm);
        }
        assert_eq!(Algorithm::HcFirst.to_string(), "hc_first");
        assert_eq!(Algorithm::HcClassic.to_string(), "hc_classic");
    }

    #[test]
    fn test_config_validate() {
        assert!(TrialConfig::default().validate().is_ok());
        assert!(TrialConfig::default().with_trials(0).validate().is_err());
        let bad = TrialConfig::default().with_mcts(MctsConfig::default().with_budget(0));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_summarize_counts_and_best() {
        let empty = State::new(easy_env()).unwrap();
        let partial = empty.apply(&Action::new(0, 0, 0, 0, 0), 1);
        let full = partial
            .apply(&Action::new(0, 1, 0, 0, 0), 2)
            .apply(&Action::new(0, 0, 1, 1, 1), 3);
        assert!(full.is_final());

        let summary = summarize(vec![
            outcome(empty.clone()),
            outcome(full),
            outcome(partial.clone()),
        ])
        .unwrap();

        assert_eq!(summary.wins, 1);
        assert_eq!(summary.fails, 2);
        assert_eq!(
            summary.end_fitness,
            vec![empty.total_fitness(), 0, partial.total_fitness()]
        );
        assert_eq!(summary.total_states, 30);
        assert_eq!(summary.best_fitness(), 0);
        assert!((summary.average_states() - 10.0).abs() < 1e-12);
        assert!((summary.win_rate() - 100.0 / 3.0).abs() < 1e-9);
        let avg = (empty.total_fitness() + partial.total_fitness()) as f64 / 3.0;
        assert!((summary.average_end_fitness() - avg).abs() < 1e-9);
    }

    #[test]
    fn test_run_trials_hc() {
        let config = TrialConfig::default().with_trials(3).with_seed(42);
        let summary = run_trials(&easy_env(), Algorithm::Hc, &config).unwrap();

        assert_eq!(summary.trials(), 3);
        assert_eq!(summary.wins, 3);
        assert_eq!(summary.best_fitness(), 0);
    }

    #[test]
    fn test_run_trials_mcts() {
        let config = TrialConfig::default()
            .with_trials(2)
            .with_seed(7)
            .with_mcts(MctsConfig::default().with_budget(10));
        let summary = run_trials(&easy_env(), Algorithm::Mcts, &config).unwrap();

        assert_eq!(summary.wins, 2);
        assert!(summary.total_states > 0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let base = TrialConfig::default().with_trials(4).with_seed(3);
        let seq = run_trials(&easy_env(), Algorithm::HcClassic, &base).unwrap();
        let par = run_trials(&easy_env(), Algorithm::HcClassic, &base.clone().with_parallel(true))
            .unwrap();

        assert_eq!(seq.end_fitness, par.end_fitness);
        assert_eq!(seq.total_states, par.total_states);
    }

    #[test]
    fn test_render_soft_report() {
        let env = Arc::new(
            Environment::builder()
                .with_day("Luni")
                .with_day("Marti")
                .with_interval(8, 10)
                .with_interval(10, 12)
                .with_interval(14, 16)
                .with_room("A", 30, &["IA"])
                .with_subject("IA", 90)
                .with_professor(
                    "Ana",
                    &["IA"],
                    ProfConstraints::default()
                        .with_day("Marti")
                        .with_interval(10, 12)
                        .with_max_pause(2),
                )
                .build()
                .unwrap(),
        );
        let state = State::new(env)
            .unwrap()
            .apply(&Action::new(0, 0, 0, 0, 0), 1)
            .apply(&Action::new(0, 2, 0, 0, 0), 2)
            .apply(&Action::new(1, 1, 0, 0, 0), 3);

        let report = render_soft_report(&state);

        assert!(report.starts_with("Ana (IA)\n"));
        assert!(report.contains("  Luni -> satisfied\n"));
        assert!(report.contains("  Marti -> NOT satisfied\n"));
        assert!(report.contains("  8-10 -> satisfied\n"));
        assert!(report.contains("  10-12 -> NOT satisfied\n"));
        assert!(report.contains("  pause on Luni: 4h (max 2h) -> NOT satisfied\n"));
        assert!(!report.contains("pause on Marti"));
        // Marti, 10-12 and two hours of excess pause
        assert_eq!(state.fitness().soft(), 4);
        assert!(report.ends_with("soft violations: 4\n"));
    }

    #[test]
    fn test_render_timetable() {
        let state = State::new(easy_env())
            .unwrap()
            .apply(&Action::new(0, 0, 0, 0, 0), 1);

        let text = render_timetable(&state);

        assert!(text.starts_with("Luni\n"));
        assert!(text.contains("8-10"));
        assert!(text.contains("A: Ana : IA"));
        assert!(text.contains("B: -"));
        assert!(text.contains("fitness:"));
    }

    #[test]
    fn test_append_history() {
        let dir = std::env::temp_dir().join(format!("u-timetable-history-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(HISTORY_FILE);
        let _ = std::fs::remove_file(&path);

        let state = State::new(easy_env()).unwrap();
        let summary = summarize(vec![outcome(state)]).unwrap();
        append_history(&path, "inputs/tiny.yaml", Algorithm::Mcts, &summary).unwrap();
        append_history(&path, "inputs/tiny.yaml", Algorithm::Hc, &summary).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("-- ").count(), 2);
        assert!(text.contains("num_trials: 1"));
        assert!(text.contains("params: [200, 40, 150, 1, 1]"));
        assert!(text.contains("file: inputs/tiny.yaml | alg: mcts | W: 0 | L: 1"));
        assert!(text.contains("alg: hc |"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
