//! Hill climbing execution loops.
//!
//! # Variants
//!
//! - **Classic**: every step scans the whole neighborhood and descends to
//!   the best strictly improving neighbor; stops at a local optimum.
//! - **First-X**: every step stops scanning after `X` strictly improving
//!   neighbors and descends to the best of those.
//! - **Random restart**: runs first-X from the initial state up to
//!   `max_restarts` times. The width starts at a polynomial fit of the
//!   environment's branching factor and grows geometrically by
//!   `R = 10^(1 / max_restarts)`, so the last restart scans about ten
//!   times wider than the first. Returns on the first final state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};
use rand::Rng;

use super::config::{HcConfig, HcVariant};
use crate::error::{Result, TimetableError};
use crate::random::rng_from;
use crate::state::State;

/// Coefficients of the start-width polynomial, lowest degree first.
const START_WIDTH_COEFFS: [f64; 6] = [
    7.862_379_115_780_930_4e0,
    7.002_663_000_374_526e-2,
    -5.120_605_779_788_638_8e-5,
    1.877_805_020_554_896_3e-8,
    -3.315_216_266_665_255_4e-12,
    2.758_633_598_246_414_9e-16,
];

/// Result of a hill-climbing run.
#[derive(Debug, Clone)]
pub struct HcResult {
    /// Whether `best` is a final (zero-fitness) timetable.
    pub reached_final: bool,

    /// Descent steps executed, summed over restarts.
    pub iterations: usize,

    /// Neighbor states generated, summed over restarts.
    pub states_explored: usize,

    /// The state the search ended on (best across restarts).
    pub best: State,

    /// Whether cancelled externally.
    pub cancelled: bool,
}

/// Executes the hill-climbing variants.
pub struct HcRunner;

impl HcRunner {
    /// Runs one hill-climbing variant from `initial`.
    pub fn run(initial: &State, variant: HcVariant, config: &HcConfig) -> Result<HcResult> {
        Self::run_with_cancel(initial, variant, config, None)
    }

    /// Runs one variant with an optional cancellation token.
    ///
    /// A cancelled run still returns the best state found so far.
    pub fn run_with_cancel(
        initial: &State,
        variant: HcVariant,
        config: &HcConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<HcResult> {
        config.validate().map_err(TimetableError::InvalidConfig)?;

        let mut rng = rng_from(config.seed);
        let cancel = cancel.as_deref();

        let result = match variant {
            HcVariant::Classic => classic(initial, config.max_iterations, &mut rng, cancel),
            HcVariant::FirstX => first_x(
                initial,
                config.max_iterations,
                config.first_x,
                &mut rng,
                cancel,
            ),
            HcVariant::RandomRestart => random_restart(
                initial,
                config.max_iterations,
                config.max_restarts,
                &mut rng,
                cancel,
            ),
        };
        Ok(result)
    }

    pub fn classic(initial: &State, config: &HcConfig) -> Result<HcResult> {
        Self::run(initial, HcVariant::Classic, config)
    }

    pub fn first_x(initial: &State, config: &HcConfig) -> Result<HcResult> {
        Self::run(initial, HcVariant::FirstX, config)
    }

    pub fn random_restart(initial: &State, config: &HcConfig) -> Result<HcResult> {
        Self::run(initial, HcVariant::RandomRestart, config)
    }
}

/// Initial first-X width for a branching factor, `round(sum q_k * b^k)`.
///
/// Not clamped: small or huge branching factors may give a width `<= 0`.
/// A negative width scans whole neighborhoods; a width of 0 ends a step
/// at the first non-improving neighbor.
pub fn start_width(bfactor: i64) -> i64 {
    let b = bfactor as f64;
    let poly: f64 = START_WIDTH_COEFFS
        .iter()
        .enumerate()
        .map(|(k, q)| q * b.powi(k as i32))
        .sum();
    poly.round_ties_even() as i64
}

/// Per-restart growth factor `10^(1 / max_restarts)`.
pub fn rise_factor(max_restarts: usize) -> f64 {
    10f64.powf(1.0 / max_restarts as f64)
}

/// Width of the next restart, `round(x * r)`.
pub fn next_width(x: i64, r: f64) -> i64 {
    (x as f64 * r).round_ties_even() as i64
}

/// The widths every restart would use, in order.
pub fn width_schedule(bfactor: i64, max_restarts: usize) -> Vec<i64> {
    let r = rise_factor(max_restarts);
    let mut x = start_width(bfactor);
    let mut schedule = Vec::with_capacity(max_restarts);
    for _ in 0..max_restarts {
        schedule.push(x);
        x = next_width(x, r);
    }
    schedule
}

// Checked after every examined neighbor: X = 0 stops at the first
// non-improving one, a negative X never fills.
fn width_filled(found: usize, x: i64) -> bool {
    i64::try_from(found).is_ok_and(|found| found == x)
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
}

pub(crate) fn classic<R: Rng>(
    initial: &State,
    max_iterations: usize,
    rng: &mut R,
    cancel: Option<&AtomicBool>,
) -> HcResult {
    let mut state = initial.clone();
    let mut iterations = 0;
    let mut states_explored = 0;
    let mut cancelled = false;

    while iterations < max_iterations {
        if is_cancelled(cancel) {
            cancelled = true;
            break;
        }
        iterations += 1;

        let mut bar = state.total_fitness();
        let mut best = None;
        for next in state.get_next_states_hc(rng) {
            states_explored += 1;
            if next.total_fitness() < bar {
                bar = next.total_fitness();
                best = Some(next);
            }
        }

        match best {
            Some(next) => state = next,
            None => break,
        }
        debug!("classic step {iterations}: fitness {}", state.total_fitness());
    }

    HcResult {
        reached_final: state.is_final(),
        iterations,
        states_explored,
        best: state,
        cancelled,
    }
}

pub(crate) fn first_x<R: Rng>(
    initial: &State,
    max_iterations: usize,
    x: i64,
    rng: &mut R,
    cancel: Option<&AtomicBool>,
) -> HcResult {
    let mut state = initial.clone();
    let mut iterations = 0;
    let mut states_explored = 0;
    let mut cancelled = false;

    while iterations < max_iterations {
        if is_cancelled(cancel) {
            cancelled = true;
            break;
        }
        iterations += 1;

        let current = state.total_fitness();
        let mut better = Vec::new();
        for next in state.get_next_states_hc(rng) {
            states_explored += 1;
            if next.total_fitness() < current {
                better.push(next);
            }
            if width_filled(better.len(), x) {
                break;
            }
        }

        // first of the best on ties
        let best = better.into_iter().reduce(|best, next| {
            if next.total_fitness() < best.total_fitness() {
                next
            } else {
                best
            }
        });
        match best {
            Some(next) => state = next,
            None => break,
        }
        debug!("first-{x} step {iterations}: fitness {}", state.total_fitness());
    }

    HcResult {
        reached_final: state.is_final(),
        iterations,
        states_explored,
        best: state,
        cancelled,
    }
}

pub(crate) fn random_restart<R: Rng>(
    initial: &State,
    max_iterations: usize,
    max_restarts: usize,
    rng: &mut R,
    cancel: Option<&AtomicBool>,
) -> HcResult {
    let bfactor = initial.environment().bfactor();
    let r = rise_factor(max_restarts);
    let mut x = start_width(bfactor);
    debug!("branching factor {bfactor}: start width {x}, rise factor {r:.4}");

    let mut best = initial.clone();
    let mut iterations = 0;
    let mut states_explored = 0;
    let mut cancelled = false;

    for restart in 0..max_restarts {
        let run = first_x(initial, max_iterations, x, rng, cancel);
        iterations += run.iterations;
        states_explored += run.states_explored;

        info!(
            "finished restart {}/{} [first {} states] -> fitness {}",
            restart + 1,
            max_restarts,
            x,
            run.best.total_fitness()
        );

        if run.reached_final {
            return HcResult {
                reached_final: true,
                iterations,
                states_explored,
                best: run.best,
                cancelled: run.cancelled,
            };
        }
        if run.best.total_fitness() < best.total_fitness() {
            best = run.best;
        }
        if run.cancelled {
            cancelled = true;
            break;
        }

        x = next_width(x, r);
    }

    HcResult {
        reached_final: false,
        iterations,
        states_explored,
        best,
        cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Environment, ProfConstraints};
    use crate::random::create_rng;

    // One feasible shape: each subject has exactly one room and one
    // professor, and nothing conflicts.
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

    fn medium_env() -> Arc<Environment> {
        Arc::new(
            Environment::builder()
                .with_day("Luni")
                .with_day("Marti")
                .with_day("Miercuri")
                .with_interval(8, 10)
                .with_interval(10, 12)
                .with_interval(12, 14)
                .with_room("EG301", 30, &["IA", "PCOM", "SO"])
                .with_room("EG390", 60, &["IA", "SO"])
                .with_subject("IA", 120)
                .with_subject("PCOM", 60)
                .with_subject("SO", 90)
                .with_professor("Ana", &["IA", "PCOM"], ProfConstraints::default().with_day("Marti"))
                .with_professor("Dan", &["IA", "SO"], ProfConstraints::default())
                .with_professor("Ion", &["SO", "PCOM"], ProfConstraints::default().with_interval(8, 10))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_classic_reaches_final() {
        let initial = State::new(easy_env()).unwrap();
        let config = HcConfig::default().with_seed(42);

        let result = HcRunner::classic(&initial, &config).unwrap();

        assert!(result.reached_final);
        assert!(result.best.is_final());
        assert_eq!(result.best.total_fitness(), 0);
        assert!(result.states_explored > 0);
        assert!(!result.cancelled);
    }

    #[test]
    fn test_classic_fitness_never_increases() {
        let initial = State::new(medium_env()).unwrap();
        let config = HcConfig::default().with_seed(3);

        let result = HcRunner::classic(&initial, &config).unwrap();

        assert!(result.best.total_fitness() < initial.total_fitness());
        assert_eq!(*result.best.fitness(), result.best.recompute_fitness());
    }

    #[test]
    fn test_classic_respects_iteration_budget() {
        let initial = State::new(medium_env()).unwrap();
        let config = HcConfig::default().with_max_iterations(2).with_seed(1);

        let result = HcRunner::classic(&initial, &config).unwrap();
        assert!(result.iterations <= 2);
    }

    #[test]
    fn test_first_x_one_is_greedy_first_improvement() {
        let initial = State::new(medium_env()).unwrap();

        let mut rng = create_rng(17);
        let result = first_x(&initial, 50, 1, &mut rng, None);

        // the same walk by hand: take the first improving neighbor
        let mut rng = create_rng(17);
        let mut state = initial.clone();
        let mut steps = 0;
        while steps < 50 {
            steps += 1;
            let current = state.total_fitness();
            let next = state
                .get_next_states_hc(&mut rng)
                .find(|n| n.total_fitness() < current);
            match next {
                Some(n) => state = n,
                None => break,
            }
        }

        assert_eq!(result.iterations, steps);
        assert_eq!(result.best.timetable(), state.timetable());
        assert_eq!(result.best.fitness(), state.fitness());
    }

    #[test]
    fn test_first_x_reaches_final_on_easy_env() {
        let initial = State::new(easy_env()).unwrap();
        let config = HcConfig::default().with_first_x(2).with_seed(5);

        let result = HcRunner::first_x(&initial, &config).unwrap();
        assert!(result.reached_final);
    }

    #[test]
    fn test_width_filled() {
        assert!(width_filled(0, 0));
        assert!(!width_filled(1, 0));
        assert!(width_filled(2, 2));
        assert!(!width_filled(1, 2));
        assert!(!width_filled(0, -1));
        assert!(!width_filled(7, -1));
    }

    #[test]
    fn test_first_x_zero_stops_at_first_non_improving() {
        // Replacing Ana by Dan keeps the fitness; filling the second
        // interval improves it.
        let env = Arc::new(
            Environment::builder()
                .with_day("Luni")
                .with_interval(8, 10)
                .with_interval(10, 12)
                .with_room("A", 30, &["IA"])
                .with_subject("IA", 60)
                .with_professor("Ana", &["IA"], ProfConstraints::default())
                .with_professor("Dan", &["IA"], ProfConstraints::default())
                .build()
                .unwrap(),
        );
        let start = State::new(env)
            .unwrap()
            .apply(&crate::state::Action::new(0, 0, 0, 0, 0), 0);

        let mut stalled = 0;
        for seed in 0..200 {
            let mut rng = create_rng(seed);
            let scan_all = first_x(&start, 1, -1, &mut rng, None);
            assert!(scan_all.best.total_fitness() < start.total_fitness());

            let mut rng = create_rng(seed);
            let zero = first_x(&start, 1, 0, &mut rng, None);
            if zero.best.total_fitness() == start.total_fitness() {
                assert_eq!(zero.states_explored, 1);
                stalled += 1;
            }
        }
        assert!(stalled > 0);
    }

    #[test]
    fn test_start_width_polynomial() {
        assert_eq!(start_width(0), 8);
        assert_eq!(start_width(100), 14);

        let b = 18.0f64;
        let expected: f64 = START_WIDTH_COEFFS
            .iter()
            .enumerate()
            .map(|(k, q)| q * b.powi(k as i32))
            .sum();
        assert_eq!(start_width(18), expected.round_ties_even() as i64);
    }

    #[test]
    fn test_width_schedule_geometric() {
        let max_restarts = 10;
        let r = rise_factor(max_restarts);
        assert!((r.powi(max_restarts as i32) - 10.0).abs() < 1e-9);

        let schedule = width_schedule(500, max_restarts);
        assert_eq!(schedule.len(), max_restarts);
        assert_eq!(schedule[0], start_width(500));
        for k in 0..max_restarts - 1 {
            assert_eq!(
                schedule[k + 1],
                (schedule[k] as f64 * r).round_ties_even() as i64
            );
        }
    }

    #[test]
    fn test_random_restart_reaches_final() {
        let initial = State::new(easy_env()).unwrap();
        let config = HcConfig::default().with_max_restarts(3).with_seed(8);

        let result = HcRunner::random_restart(&initial, &config).unwrap();
        assert!(result.reached_final);
        assert!(result.best.is_final());
    }

    #[test]
    fn test_random_restart_never_worse_than_initial() {
        let initial = State::new(medium_env()).unwrap();
        let config = HcConfig::default()
            .with_max_iterations(5)
            .with_max_restarts(2)
            .with_seed(11);

        let result = HcRunner::random_restart(&initial, &config).unwrap();
        assert!(result.best.total_fitness() <= initial.total_fitness());
        assert!(result.iterations <= 10);
    }

    #[test]
    fn test_cancellation_returns_initial() {
        let initial = State::new(medium_env()).unwrap();
        let config = HcConfig::default().with_seed(42);
        let cancel = Arc::new(AtomicBool::new(true));

        let result =
            HcRunner::run_with_cancel(&initial, HcVariant::RandomRestart, &config, Some(cancel))
                .unwrap();

        assert!(result.cancelled);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.best.fitness(), initial.fitness());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let initial = State::new(easy_env()).unwrap();
        let config = HcConfig::default().with_max_restarts(0);

        let err = HcRunner::random_restart(&initial, &config).unwrap_err();
        assert!(matches!(err, TimetableError::InvalidConfig(_)));
    }
}
