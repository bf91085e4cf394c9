//! Monte Carlo tree search (MCTS).
//!
//! Builds a timetable by committing one assignment at a time. Each
//! decision is backed by a fixed budget of UCT-guided simulations whose
//! playouts use random admissible actions; the reward favors hard-feasible
//! timetables and, among those, fewer soft violations.
//!
//! # References
//!
//! - Kocsis & Szepesvári (2006), "Bandit based Monte-Carlo Planning"
//! - Browne et al. (2012), "A Survey of Monte Carlo Tree Search Methods"

mod config;
mod runner;
mod tree;

pub use config::MctsConfig;
pub use runner::{
    compute_reward, select_action, uct, MctsResult, MctsRunner, SearchOutcome, PERFECT_REWARD,
    SOFT_REWARD,
};
pub use tree::{Node, NodeId, Tree};
