//! Move enumeration.
//!
//! All three enumerators walk the grid day -> interval -> room, then the
//! subjects the room can host (fewest eligible rooms first), then the
//! subject's professors.

use rand::seq::SliceRandom;
use rand::Rng;

use super::fitness::MAX_CLASSES_PER_WEEK;
use super::timetable::State;
use super::types::{Action, Occupant};
use crate::env::{DayId, IntervalId, ProfId, RoomId, SubjectId};

/// Probability of leaving an occupied slot alone during randomized walks.
const SKIP_OCCUPIED: f64 = 0.5;
/// Probability of skipping a professor whose preferences the slot violates.
const SKIP_SOFT_VIOLATION: f64 = 0.9;
/// Preference-violating candidates tolerated by [`State::get_available_actions`].
const SOFT_ALLOWANCE: usize = 3;

impl State {
    /// Lazily yields neighbor states for hill climbing.
    ///
    /// Days, intervals within a day and rooms within an interval are
    /// visited in a fresh random order on every call. An occupied slot is
    /// skipped with probability 0.5; otherwise its occupant may be
    /// replaced. Subjects whose demand is met, and professors already
    /// teaching in the slot, are skipped.
    pub fn get_next_states_hc<'a, R: Rng>(&'a self, rng: &'a mut R) -> Neighbors<'a, R> {
        let slots = self.shuffled_slots(rng);
        Neighbors {
            state: self,
            rng,
            slots,
            slot_pos: 0,
            entered: false,
            subject_pos: 0,
            subject: 0,
            profs: Vec::new(),
            prof_pos: 0,
        }
    }

    /// Picks one random admissible action for a playout, or `None`.
    ///
    /// Follows the hill-climbing walk, but additionally skips professors
    /// who already teach 7 classes. A professor who dislikes the slot's
    /// day is never proposed; one who only dislikes the interval is
    /// skipped with probability 0.9.
    pub fn get_random_action<R: Rng>(&self, rng: &mut R) -> Option<Action> {
        let env = self.environment();

        for (day, interval, room) in self.shuffled_slots(rng) {
            if self.occupant(day, interval, room).is_some() && rng.random_bool(SKIP_OCCUPIED) {
                continue;
            }

            for &subject in env.sorted_subjects() {
                if !env.room_hosts(room, subject) || self.demand_met(subject) {
                    continue;
                }

                let mut profs = env.subject(subject).professors.clone();
                profs.shuffle(rng);
                for prof in profs {
                    if env.forbids_day(prof, day)
                        || (env.forbids_interval(prof, interval)
                            && rng.random_bool(SKIP_SOFT_VIOLATION))
                    {
                        continue;
                    }
                    if self.is_busy(prof, day, interval)
                        || self.professor_slots(prof).len() >= MAX_CLASSES_PER_WEEK
                    {
                        continue;
                    }
                    return Some(Action::new(day, interval, room, prof, subject));
                }
            }
        }
        None
    }

    /// Every admissible assignment into an empty slot, in grid order.
    ///
    /// Professors who dislike the slot's day are never proposed. Professors
    /// who only dislike the interval are proposed while fewer than three
    /// candidates have been counted so far.
    pub fn get_available_actions(&self) -> Vec<Action> {
        let env = self.environment();
        let mut actions = Vec::new();
        let mut counted = 0usize;

        for day in 0..env.num_days() {
            for interval in 0..env.num_intervals() {
                for room in 0..env.num_rooms() {
                    if self.occupant(day, interval, room).is_some() {
                        continue;
                    }

                    for &subject in env.sorted_subjects() {
                        if !env.room_hosts(room, subject) || self.demand_met(subject) {
                            continue;
                        }

                        for &prof in &env.subject(subject).professors {
                            if env.forbids_day(prof, day)
                                || (env.forbids_interval(prof, interval)
                                    && counted >= SOFT_ALLOWANCE)
                            {
                                continue;
                            }
                            counted += 1;

                            if self.is_busy(prof, day, interval)
                                || self.professor_slots(prof).len() >= MAX_CLASSES_PER_WEEK
                            {
                                continue;
                            }
                            actions.push(Action::new(day, interval, room, prof, subject));
                        }
                    }
                }
            }
        }
        actions
    }

    // Days shuffled, intervals shuffled per day, rooms shuffled per interval.
    fn shuffled_slots<R: Rng>(&self, rng: &mut R) -> Vec<(DayId, IntervalId, RoomId)> {
        let env = self.environment();
        let mut slots = Vec::with_capacity(env.grid_size());

        let mut days: Vec<DayId> = (0..env.num_days()).collect();
        days.shuffle(rng);
        for day in days {
            let mut intervals: Vec<IntervalId> = (0..env.num_intervals()).collect();
            intervals.shuffle(rng);
            for interval in intervals {
                let mut rooms: Vec<RoomId> = (0..env.num_rooms()).collect();
                rooms.shuffle(rng);
                slots.extend(rooms.into_iter().map(|room| (day, interval, room)));
            }
        }
        slots
    }
}

/// Lazy neighbor sequence returned by [`State::get_next_states_hc`].
///
/// Each item is a fully built child state; nothing past the last item
/// pulled is ever constructed.
pub struct Neighbors<'a, R: Rng> {
    state: &'a State,
    rng: &'a mut R,
    slots: Vec<(DayId, IntervalId, RoomId)>,
    slot_pos: usize,
    // current slot passed the occupied-skip draw
    entered: bool,
    subject_pos: usize,
    subject: SubjectId,
    profs: Vec<ProfId>,
    prof_pos: usize,
}

impl<R: Rng> Iterator for Neighbors<'_, R> {
    type Item = State;

    fn next(&mut self) -> Option<State> {
        let state = self.state;
        let env = state.environment();

        loop {
            let &(day, interval, room) = self.slots.get(self.slot_pos)?;
            let current = state.occupant(day, interval, room);

            if !self.entered {
                if current.is_some() && self.rng.random_bool(SKIP_OCCUPIED) {
                    self.slot_pos += 1;
                    continue;
                }
                self.entered = true;
                self.subject_pos = 0;
                self.profs.clear();
                self.prof_pos = 0;
            }

            if let Some(&prof) = self.profs.get(self.prof_pos) {
                self.prof_pos += 1;
                let candidate = Occupant {
                    professor: prof,
                    subject: self.subject,
                };
                if state.is_busy(prof, day, interval) || current == Some(candidate) {
                    continue;
                }
                return Some(state.apply_move(
                    day,
                    interval,
                    room,
                    Some(candidate),
                    state.depth(),
                ));
            }

            let Some(&subject) = env.sorted_subjects().get(self.subject_pos) else {
                self.entered = false;
                self.slot_pos += 1;
                continue;
            };
            self.subject_pos += 1;
            if state.demand_met(subject) || !env.room_hosts(room, subject) {
                continue;
            }

            self.subject = subject;
            self.profs.clear();
            self.profs
                .extend_from_slice(&env.subject(subject).professors);
            self.profs.shuffle(&mut *self.rng);
            self.prof_pos = 0;
        }
    }
}
