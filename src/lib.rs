//! Weekly university timetabling by local search.
//!
//! Places classes into a (day, interval, room) grid so that every
//! subject's student demand is covered, no professor teaches two classes
//! at once or more than seven per week, and professors' preferences are
//! respected where possible.
//!
//! - **env**: the read-only problem description, built programmatically
//!   or loaded from a YAML descriptor.
//! - **state**: an immutable timetable snapshot with an incrementally
//!   maintained fitness, plus the move enumerators the searches use.
//! - **hc**: classic, first-X and random-restart hill climbing.
//! - **mcts**: UCT-guided Monte Carlo tree search with subtree reuse.
//! - **trial**: repeated runs, aggregate statistics and reports.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use u_timetable::env::{Environment, ProfConstraints};
//! use u_timetable::hc::{HcConfig, HcRunner};
//! use u_timetable::state::State;
//!
//! let env = Environment::builder()
//!     .with_day("Luni")
//!     .with_interval(8, 10)
//!     .with_room("EG301", 30, &["IA"])
//!     .with_subject("IA", 30)
//!     .with_professor("Ana", &["IA"], ProfConstraints::default())
//!     .build()
//!     .unwrap();
//!
//! let initial = State::new(Arc::new(env)).unwrap();
//! let result = HcRunner::classic(&initial, &HcConfig::default().with_seed(1)).unwrap();
//! assert!(result.reached_final);
//! ```

pub mod env;
pub mod error;
pub mod hc;
pub mod mcts;
pub mod random;
pub mod state;
pub mod trial;

pub use error::{Result, TimetableError};
