//! Search state.
//!
//! A [`State`] is a weekly timetable snapshot together with the busy
//! lists of every professor, the seats provided per subject and a
//! five-term [`Fitness`] vector. Moves never mutate a state: they return
//! a child that owns its own copies of every table, with the fitness
//! updated incrementally (`c_mult` and `c_pause` are recomputed in full).
//!
//! Three enumerators produce moves:
//!
//! - [`State::get_next_states_hc`]: lazy, randomized neighbor states for
//!   hill climbing (assignments and replacements)
//! - [`State::get_random_action`]: a single random action for playouts
//! - [`State::get_available_actions`]: every assignment into an empty
//!   slot, for tree expansion

mod fitness;
mod moves;
mod timetable;
mod types;

pub use fitness::{
    Fitness, INTERVALS_PENALTY, MAX_CLASSES_PER_WEEK, MULT_PENALTY, SOFT_PENALTY,
    STUD_LEFT_PENALTY,
};
pub use moves::Neighbors;
pub use timetable::State;
pub use types::{Action, Occupant};
