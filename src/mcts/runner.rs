//! MCTS execution loop.
//!
//! Every decision runs `budget` simulations from the current state:
//!
//! 1. **Selection** descends by UCT while the node is non-terminal and
//!    every available action has been expanded.
//! 2. **Expansion** adds one random untried action.
//! 3. **Simulation** plays random admissible actions until terminal.
//! 4. **Backpropagation** adds the playout reward along the path to the
//!    root.
//!
//! The action committed is the root child with the best mean reward
//! (UCT with `c = 0`), and its subtree is reused for the next decision.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};
use rand::Rng;

use super::config::MctsConfig;
use super::tree::{NodeId, Tree};
use crate::error::{Result, TimetableError};
use crate::random::rng_from;
use crate::state::{Action, State};

/// Reward of a terminal state with no violations at all.
pub const PERFECT_REWARD: f64 = 50.0;

/// Numerator of the reward of a hard-feasible state with soft violations.
pub const SOFT_REWARD: f64 = 20.0;

/// Result of a full MCTS run.
#[derive(Debug, Clone)]
pub struct MctsResult {
    /// Whether `state` is a final (zero-fitness) timetable.
    pub reached_final: bool,

    /// Decisions committed.
    pub iterations: usize,

    /// States generated by expansions and playouts.
    pub states_explored: usize,

    /// The state the run ended on.
    pub state: State,

    /// Whether cancelled externally.
    pub cancelled: bool,
}

/// Outcome of one decision search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The action to commit, `None` if the root was never expanded.
    pub action: Option<Action>,

    /// The subtree under the chosen action, rooted there.
    pub subtree: Option<Tree>,

    /// States generated during this search.
    pub states_explored: usize,
}

/// Executes Monte Carlo tree search.
pub struct MctsRunner;

impl MctsRunner {
    /// Builds a timetable one committed action at a time.
    pub fn run(initial: &State, config: &MctsConfig) -> Result<MctsResult> {
        Self::run_with_cancel(initial, config, None)
    }

    /// Runs MCTS with an optional cancellation token.
    pub fn run_with_cancel(
        initial: &State,
        config: &MctsConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<MctsResult> {
        config.validate().map_err(TimetableError::InvalidConfig)?;

        let mut rng = rng_from(config.seed);
        let max_depth = max_depth(config, initial);

        let mut state = initial.clone();
        let mut tree: Option<Tree> = None;
        let mut iterations = 0;
        let mut states_explored = 0;
        let mut cancelled = false;

        while !is_terminal(&state, max_depth) {
            if cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed)) {
                cancelled = true;
                break;
            }
            iterations += 1;

            let outcome = Self::search(&state, tree.take(), config, &mut rng);
            states_explored += outcome.states_explored;

            let Some(action) = outcome.action else {
                break;
            };
            state = state.apply(&action, state.depth() + 1);
            tree = outcome.subtree;

            info!(
                "step {iterations}: {action:?} -> fitness {} (depth {})",
                state.total_fitness(),
                state.depth()
            );
        }

        Ok(MctsResult {
            reached_final: state.is_final(),
            iterations,
            states_explored,
            state,
            cancelled,
        })
    }

    /// Runs `config.budget` simulations from `state` and picks an action.
    ///
    /// `tree`, when given, must be rooted at `state` (the subtree returned
    /// by the previous decision).
    pub fn search<R: Rng>(
        state: &State,
        tree: Option<Tree>,
        config: &MctsConfig,
        rng: &mut R,
    ) -> SearchOutcome {
        let max_depth = max_depth(config, state);
        let mut tree = tree.unwrap_or_else(|| Tree::new(state.clone()));
        let root = tree.root();
        let mut states_explored = 0;

        for _ in 0..config.budget {
            let mut node = root;

            // Selection
            loop {
                let current = tree.node(node);
                if is_terminal(current.state(), max_depth)
                    || current.children().len() < current.state().get_available_actions().len()
                {
                    break;
                }
                match select_child(&tree, node, config.exploration) {
                    Some((_, child)) => node = child,
                    None => break,
                }
            }

            // Expansion
            let current = tree.node(node);
            if !is_terminal(current.state(), max_depth) {
                let tried = current.tried_actions();
                let untried: Vec<Action> = current
                    .state()
                    .get_available_actions()
                    .into_iter()
                    .filter(|a| !tried.contains(a))
                    .collect();
                if !untried.is_empty() {
                    let action = untried[rng.random_range(0..untried.len())];
                    let parent = current.state();
                    let child = parent.apply(&action, parent.depth() + 1);
                    states_explored += 1;
                    node = tree.add_child(node, action, child);
                }
            }

            // Simulation
            let mut playout = tree.node(node).state().clone();
            while !is_terminal(&playout, max_depth) {
                match playout.get_random_action(rng) {
                    Some(action) => {
                        playout = playout.apply(&action, playout.depth() + 1);
                        states_explored += 1;
                    }
                    None => break,
                }
            }

            // Backpropagation
            tree.backpropagate(node, compute_reward(&playout));
        }

        debug!(
            "search from depth {}: {} nodes, root visits {}",
            state.depth(),
            tree.len(),
            tree.node(root).visits()
        );

        match select_child(&tree, root, 0.0) {
            Some((action, child)) => SearchOutcome {
                action: Some(action),
                subtree: Some(tree.promote(child)),
                states_explored,
            },
            None => SearchOutcome {
                action: None,
                subtree: None,
                states_explored,
            },
        }
    }
}

/// Reward of a playout's end state.
///
/// Zero with any hard violation, [`PERFECT_REWARD`] with no violation,
/// otherwise `SOFT_REWARD / (1 + soft)`.
pub fn compute_reward(state: &State) -> f64 {
    let (hard, soft) = state.total_fitness_mcts();
    reward(hard, soft)
}

fn reward(hard: i64, soft: i64) -> f64 {
    if hard > 0 {
        0.0
    } else if soft == 0 {
        PERFECT_REWARD
    } else {
        SOFT_REWARD / (1.0 + soft as f64)
    }
}

/// UCT score `Q/N + c * sqrt(2 ln N_parent / N)`.
///
/// Unvisited nodes score infinity.
pub fn uct(reward: f64, visits: u32, parent_visits: u32, c: f64) -> f64 {
    if visits == 0 {
        return f64::INFINITY;
    }
    let n = visits as f64;
    reward / n + c * (2.0 * (parent_visits as f64).ln() / n).sqrt()
}

/// The child action of `node` with the highest UCT score.
///
/// `None` if `node` has no children. Ties go to the earliest expanded
/// child.
pub fn select_action(tree: &Tree, node: NodeId, c: f64) -> Option<Action> {
    select_child(tree, node, c).map(|(action, _)| action)
}

fn select_child(tree: &Tree, node: NodeId, c: f64) -> Option<(Action, NodeId)> {
    let parent_visits = tree.node(node).visits();
    let mut best: Option<(Action, NodeId, f64)> = None;
    for &(action, child) in tree.node(node).children() {
        let n = tree.node(child);
        let score = uct(n.reward(), n.visits(), parent_visits, c);
        match best {
            Some((_, _, top)) if score <= top => {}
            _ => best = Some((action, child, score)),
        }
    }
    best.map(|(action, child, _)| (action, child))
}

fn max_depth(config: &MctsConfig, state: &State) -> usize {
    config
        .max_depth
        .unwrap_or_else(|| state.environment().grid_size())
}

fn is_terminal(state: &State, max_depth: usize) -> bool {
    state.is_final() || state.depth() >= max_depth
}
