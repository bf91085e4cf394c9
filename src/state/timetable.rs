//! The search state: a timetable snapshot with its incrementally
//! maintained fitness.

use std::sync::Arc;

use super::fitness::{self, Fitness, INTERVALS_PENALTY, MAX_CLASSES_PER_WEEK, SOFT_PENALTY};
use super::types::{Action, Occupant};
use crate::env::{DayId, Environment, IntervalId, ProfId, RoomId, SubjectId};
use crate::error::{Result, TimetableError};

/// A weekly timetable and everything needed to score it.
///
/// States have value semantics: every move returns a new `State` owning
/// its own timetable, busy lists and seat counters. Only the read-only
/// [`Environment`] is shared.
#[derive(Debug, Clone)]
pub struct State {
    env: Arc<Environment>,
    // day-major grid, see Environment::slot_index
    timetable: Vec<Option<Occupant>>,
    // (day, interval) slots each professor is teaching in
    profs: Vec<Vec<(DayId, IntervalId)>>,
    // seats provided per subject
    students: Vec<u32>,
    fitness: Fitness,
    depth: usize,
}

impl State {
    /// Creates the empty timetable for `env`.
    ///
    /// Only the unmet seat demand is non-zero in the initial fitness.
    pub fn new(env: Arc<Environment>) -> Result<Self> {
        if env.grid_size() == 0 || env.subjects().is_empty() {
            return Err(TimetableError::InvalidEnvironment(
                "environment has no slots or no subjects".into(),
            ));
        }

        let mut state = Self {
            timetable: vec![None; env.grid_size()],
            profs: vec![Vec::new(); env.professors().len()],
            students: vec![0; env.subjects().len()],
            fitness: Fitness::default(),
            depth: 0,
            env,
        };
        state.fitness = state.recompute_fitness();
        Ok(state)
    }

    pub fn environment(&self) -> &Arc<Environment> {
        &self.env
    }

    /// The occupant of a slot, if any.
    #[inline]
    pub fn occupant(&self, day: DayId, interval: IntervalId, room: RoomId) -> Option<Occupant> {
        self.timetable[self.env.slot_index(day, interval, room)]
    }

    /// The whole grid, day-major (see [`Environment::slot_index`]).
    pub fn timetable(&self) -> &[Option<Occupant>] {
        &self.timetable
    }

    /// Slots the professor currently teaches in, in assignment order.
    pub fn professor_slots(&self, prof: ProfId) -> &[(DayId, IntervalId)] {
        &self.profs[prof]
    }

    #[inline]
    pub fn is_busy(&self, prof: ProfId, day: DayId, interval: IntervalId) -> bool {
        self.profs[prof].contains(&(day, interval))
    }

    /// Seats currently provided for a subject.
    pub fn students(&self, subject: SubjectId) -> u32 {
        self.students[subject]
    }

    /// Whether the subject's seat demand is already covered.
    #[inline]
    pub fn demand_met(&self, subject: SubjectId) -> bool {
        self.students[subject] >= self.env.subject(subject).students
    }

    pub fn fitness(&self) -> &Fitness {
        &self.fitness
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn total_fitness(&self) -> i64 {
        self.fitness.total()
    }

    /// `(hard, soft)` split used to shape tree-search rewards.
    pub fn total_fitness_mcts(&self) -> (i64, i64) {
        (self.fitness.hard(), self.fitness.soft())
    }

    /// Whether every hard and soft term is zero.
    pub fn is_final(&self) -> bool {
        self.total_fitness() == 0
    }

    /// Computes the fitness vector from scratch.
    ///
    /// Always equal to [`State::fitness`]; states maintain it incrementally.
    pub fn recompute_fitness(&self) -> Fitness {
        let env = &*self.env;
        Fitness {
            c_intervals: fitness::c_intervals(&self.profs),
            c_stud_left: fitness::c_stud_left(env, &self.students),
            c_mult: fitness::c_mult(env, &self.timetable),
            c_soft: fitness::c_soft(env, &self.profs),
            c_pause: fitness::c_pause(env, &self.profs),
        }
    }

    /// Applies one move and returns the resulting state at `depth`.
    ///
    /// - `occupant = None` on an occupied slot removes the class;
    /// - `occupant = Some(..)` on an empty slot assigns it;
    /// - `occupant = Some(..)` on an occupied slot replaces the class.
    ///
    /// Removing from an empty slot is not a valid move; it yields an
    /// unchanged copy.
    pub fn apply_move(
        &self,
        day: DayId,
        interval: IntervalId,
        room: RoomId,
        occupant: Option<Occupant>,
        depth: usize,
    ) -> State {
        let mut next = self.clone();
        next.depth = depth;

        let slot = self.env.slot_index(day, interval, room);
        let changed = match (self.timetable[slot], occupant) {
            (Some(_), None) => {
                next.unassign(day, interval, room);
                true
            }
            (None, Some(new)) => {
                next.assign(day, interval, room, new);
                true
            }
            (Some(_), Some(new)) => {
                next.unassign(day, interval, room);
                next.assign(day, interval, room, new);
                true
            }
            (None, None) => false,
        };

        if changed {
            let env = &*next.env;
            next.fitness.c_mult = fitness::c_mult(env, &next.timetable);
            next.fitness.c_pause = fitness::c_pause(env, &next.profs);
        }
        next
    }

    /// Applies an assign/replace action.
    pub fn apply(&self, action: &Action, depth: usize) -> State {
        self.apply_move(
            action.day,
            action.interval,
            action.room,
            Some(action.occupant()),
            depth,
        )
    }

    /// Removes the class held in a slot.
    pub fn remove(&self, day: DayId, interval: IntervalId, room: RoomId, depth: usize) -> State {
        self.apply_move(day, interval, room, None, depth)
    }

    // Incremental terms only; c_mult and c_pause are refreshed by the caller.
    fn unassign(&mut self, day: DayId, interval: IntervalId, room: RoomId) {
        let env = &*self.env;
        let slot = env.slot_index(day, interval, room);
        let Some(old) = self.timetable[slot].take() else {
            return;
        };

        let busy = &mut self.profs[old.professor];
        if let Some(pos) = busy.iter().position(|&s| s == (day, interval)) {
            busy.remove(pos);
        }
        if busy.len() >= MAX_CLASSES_PER_WEEK {
            self.fitness.c_intervals -= INTERVALS_PENALTY;
        }

        self.students[old.subject] -= env.room(room).capacity;
        if self.students[old.subject] < env.subject(old.subject).students {
            self.fitness.c_stud_left = fitness::c_stud_left(env, &self.students);
        }

        if env.forbids_day(old.professor, day) {
            self.fitness.c_soft -= SOFT_PENALTY;
        }
        if env.forbids_interval(old.professor, interval) {
            self.fitness.c_soft -= SOFT_PENALTY;
        }
    }

    fn assign(&mut self, day: DayId, interval: IntervalId, room: RoomId, new: Occupant) {
        let env = &*self.env;
        let slot = env.slot_index(day, interval, room);
        self.timetable[slot] = Some(new);

        let busy = &mut self.profs[new.professor];
        busy.push((day, interval));
        if busy.len() > MAX_CLASSES_PER_WEEK {
            self.fitness.c_intervals += INTERVALS_PENALTY;
        }

        self.students[new.subject] += env.room(room).capacity;
        self.fitness.c_stud_left = fitness::c_stud_left(env, &self.students);

        if env.forbids_day(new.professor, day) {
            self.fitness.c_soft += SOFT_PENALTY;
        }
        if env.forbids_interval(new.professor, interval) {
            self.fitness.c_soft += SOFT_PENALTY;
        }
    }
}
