//! Fitness vector and the from-scratch term computations.
//!
//! Each term counts violations of one rule, scaled by its penalty unit so
//! that hard rules dominate soft ones. Lower is better; a vector of all
//! zeros is a final timetable.

use std::fmt;

use super::types::Occupant;
use crate::env::{DayId, Environment, Interval, IntervalId};

/// Most classes a professor may teach in a week.
pub const MAX_CLASSES_PER_WEEK: usize = 7;

/// Penalty per class over [`MAX_CLASSES_PER_WEEK`].
pub const INTERVALS_PENALTY: i64 = 200;
/// Penalty per minimum-capacity room's worth of unmet seat demand.
pub const STUD_LEFT_PENALTY: i64 = 40;
/// Penalty per extra occurrence of a professor in one (day, interval).
pub const MULT_PENALTY: i64 = 150;
/// Penalty per violated day/interval preference and per hour of excess pause.
pub const SOFT_PENALTY: i64 = 1;

/// The five-term violation breakdown of a state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Fitness {
    /// Professors teaching more than 7 classes a week.
    pub c_intervals: i64,
    /// Seat demand not yet covered.
    pub c_stud_left: i64,
    /// Professors booked twice in the same slot.
    pub c_mult: i64,
    /// Classes on a disliked day or in a disliked interval.
    pub c_soft: i64,
    /// Same-day pauses longer than preferred.
    pub c_pause: i64,
}

impl Fitness {
    pub fn values(&self) -> [i64; 5] {
        [
            self.c_intervals,
            self.c_stud_left,
            self.c_mult,
            self.c_soft,
            self.c_pause,
        ]
    }

    /// Sum of all terms.
    pub fn total(&self) -> i64 {
        self.values().iter().sum()
    }

    /// Outstanding hard violations, normalized by their penalty units and
    /// truncated to an integer.
    pub fn hard(&self) -> i64 {
        let hard = self.c_intervals as f64 / INTERVALS_PENALTY as f64
            + self.c_stud_left as f64 / STUD_LEFT_PENALTY as f64
            + self.c_mult as f64 / MULT_PENALTY as f64;
        hard as i64
    }

    pub fn soft(&self) -> i64 {
        self.c_soft + self.c_pause
    }
}

impl fmt::Display for Fitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "c_intervals={} c_stud_left={} c_mult={} c_soft={} c_pause={} (total {})",
            self.c_intervals,
            self.c_stud_left,
            self.c_mult,
            self.c_soft,
            self.c_pause,
            self.total()
        )
    }
}

pub(crate) fn c_intervals(profs: &[Vec<(DayId, IntervalId)>]) -> i64 {
    profs
        .iter()
        .map(|slots| slots.len().saturating_sub(MAX_CLASSES_PER_WEEK) as i64 * INTERVALS_PENALTY)
        .sum()
}

pub(crate) fn c_stud_left(env: &Environment, students: &[u32]) -> i64 {
    let unit = env.min_capacity() as i64;
    env.subjects()
        .iter()
        .zip(students)
        .map(|(subject, &seated)| {
            let missing = (subject.students as i64 - seated as i64).max(0);
            // ceil(missing / unit)
            (missing + unit - 1) / unit * STUD_LEFT_PENALTY
        })
        .sum()
}

pub(crate) fn c_mult(env: &Environment, timetable: &[Option<Occupant>]) -> i64 {
    let mut total = 0;
    let mut teaching: Vec<usize> = Vec::with_capacity(env.num_rooms());
    for slot in timetable.chunks(env.num_rooms()) {
        teaching.clear();
        for occupant in slot.iter().flatten() {
            if teaching.contains(&occupant.professor) {
                total += MULT_PENALTY;
            }
            teaching.push(occupant.professor);
        }
    }
    total
}

pub(crate) fn c_soft(env: &Environment, profs: &[Vec<(DayId, IntervalId)>]) -> i64 {
    let mut total = 0;
    for (p, slots) in profs.iter().enumerate() {
        for &(day, interval) in slots {
            if env.forbids_day(p, day) {
                total += SOFT_PENALTY;
            }
            if env.forbids_interval(p, interval) {
                total += SOFT_PENALTY;
            }
        }
    }
    total
}

pub(crate) fn c_pause(env: &Environment, profs: &[Vec<(DayId, IntervalId)>]) -> i64 {
    let intervals = env.intervals();
    let mut total = 0;
    let mut today: Vec<Interval> = Vec::new();

    for (p, slots) in profs.iter().enumerate() {
        let Some(limit) = env.max_pause(p) else {
            continue;
        };

        for day in 0..env.num_days() {
            today.clear();
            today.extend(
                slots
                    .iter()
                    .filter(|(d, _)| *d == day)
                    .map(|&(_, i)| intervals[i]),
            );
            if today.len() < 2 {
                continue;
            }
            today.sort();

            let longest = today
                .windows(2)
                .map(|w| w[1].start as i64 - w[0].end as i64)
                .max()
                .unwrap_or(0);
            total += (longest - limit as i64).max(0) * SOFT_PENALTY;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_sum() {
        let f = Fitness {
            c_intervals: 200,
            c_stud_left: 80,
            c_mult: 0,
            c_soft: 3,
            c_pause: 2,
        };
        assert_eq!(f.total(), 285);
        assert_eq!(f.values().iter().sum::<i64>(), f.total());
    }

    #[test]
    fn test_hard_soft_split() {
        let f = Fitness {
            c_intervals: 200,
            c_stud_left: 80,
            c_mult: 150,
            c_soft: 3,
            c_pause: 2,
        };
        assert_eq!(f.hard(), 4);
        assert_eq!(f.soft(), 5);
    }

    #[test]
    fn test_hard_truncates() {
        let f = Fitness {
            c_mult: 100,
            ..Fitness::default()
        };
        assert_eq!(f.hard(), 0);
    }

    #[test]
    fn test_display() {
        let f = Fitness {
            c_soft: 1,
            ..Fitness::default()
        };
        let s = f.to_string();
        assert!(s.contains("c_soft=1"));
        assert!(s.contains("total 1"));
    }
}
