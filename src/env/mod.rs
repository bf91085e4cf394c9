//! Problem environment.
//!
//! The read-only description of a timetabling instance: the weekly grid
//! (days x intervals x rooms), the subjects with their seat demand, and the
//! professors with the subjects they teach and their negative preferences.
//! An [`Environment`] is built once, either programmatically through
//! [`EnvironmentBuilder`] or from a YAML descriptor, and then shared by
//! every search state behind an `Arc`.

mod loader;
mod types;

pub use loader::{parse_constraints, parse_interval};
pub use types::{
    DayId, Environment, EnvironmentBuilder, Interval, IntervalId, ProfConstraints, ProfId,
    Professor, Room, RoomId, Subject, SubjectId,
};
