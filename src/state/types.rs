//! Slot occupants and moves.

use crate::env::{DayId, IntervalId, ProfId, RoomId, SubjectId};

/// A class held in a slot: who teaches what.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occupant {
    pub professor: ProfId,
    pub subject: SubjectId,
}

/// Places `professor` teaching `subject` in room `room` at (`day`, `interval`).
///
/// Applied to an empty slot it assigns the class; applied to an occupied
/// slot it replaces the current occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Action {
    pub day: DayId,
    pub interval: IntervalId,
    pub room: RoomId,
    pub professor: ProfId,
    pub subject: SubjectId,
}

impl Action {
    pub fn new(
        day: DayId,
        interval: IntervalId,
        room: RoomId,
        professor: ProfId,
        subject: SubjectId,
    ) -> Self {
        Self {
            day,
            interval,
            room,
            professor,
            subject,
        }
    }

    pub fn occupant(&self) -> Occupant {
        Occupant {
            professor: self.professor,
            subject: self.subject,
        }
    }
}
