//! Environment tables: rooms, subjects, professors and their constraints.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::error::{Result, TimetableError};

pub type DayId = usize;
pub type IntervalId = usize;
pub type RoomId = usize;
pub type SubjectId = usize;
pub type ProfId = usize;

/// A teaching interval, in hours of the day (`start` inclusive, `end` exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval {
    pub start: u32,
    pub end: u32,
}

impl Interval {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Negative preferences of a professor, by name and interval value.
///
/// Days or intervals that do not exist in the environment are kept but
/// never match a slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfConstraints {
    /// Days the professor would rather not teach on.
    pub days: BTreeSet<String>,
    /// Intervals the professor would rather not teach in.
    pub intervals: BTreeSet<Interval>,
    /// Preferred maximum pause (hours) between two classes on the same day.
    pub max_pause: Option<u32>,
}

impl ProfConstraints {
    pub fn with_day(mut self, day: impl Into<String>) -> Self {
        self.days.insert(day.into());
        self
    }

    pub fn with_interval(mut self, start: u32, end: u32) -> Self {
        self.intervals.insert(Interval::new(start, end));
        self
    }

    pub fn with_max_pause(mut self, hours: u32) -> Self {
        self.max_pause = Some(hours);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty() && self.intervals.is_empty() && self.max_pause.is_none()
    }
}

/// A room and the subjects it may host.
#[derive(Debug, Clone)]
pub struct Room {
    pub name: String,
    pub capacity: u32,
    pub subjects: Vec<SubjectId>,
}

/// A subject, its seat demand and who/where may teach it.
#[derive(Debug, Clone)]
pub struct Subject {
    pub name: String,
    /// Seats that must be provided across the week.
    pub students: u32,
    /// Eligible professors, in descriptor order.
    pub professors: Vec<ProfId>,
    /// Eligible rooms, in descriptor order.
    pub rooms: Vec<RoomId>,
}

/// A professor, the subjects they may teach and their preferences.
#[derive(Debug, Clone)]
pub struct Professor {
    pub name: String,
    pub subjects: Vec<SubjectId>,
    pub constraints: ProfConstraints,
}

/// Read-only problem description shared by every state.
///
/// Built once (see [`EnvironmentBuilder`] and the YAML loader) and then
/// handed to states behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Environment {
    days: Vec<String>,
    intervals: Vec<Interval>,
    rooms: Vec<Room>,
    subjects: Vec<Subject>,
    professors: Vec<Professor>,

    // room x subject
    hosts: Vec<Vec<bool>>,
    // professor x day / professor x interval
    forbidden_days: Vec<Vec<bool>>,
    forbidden_intervals: Vec<Vec<bool>>,
    sorted_subjects: Vec<SubjectId>,
    min_capacity: u32,
}

impl Environment {
    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::default()
    }

    pub fn days(&self) -> &[String] {
        &self.days
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn professors(&self) -> &[Professor] {
        &self.professors
    }

    pub fn room(&self, id: RoomId) -> &Room {
        &self.rooms[id]
    }

    pub fn subject(&self, id: SubjectId) -> &Subject {
        &self.subjects[id]
    }

    pub fn professor(&self, id: ProfId) -> &Professor {
        &self.professors[id]
    }

    pub fn num_days(&self) -> usize {
        self.days.len()
    }

    pub fn num_intervals(&self) -> usize {
        self.intervals.len()
    }

    pub fn num_rooms(&self) -> usize {
        self.rooms.len()
    }

    /// Number of (day, interval, room) slots in the weekly grid.
    pub fn grid_size(&self) -> usize {
        self.days.len() * self.intervals.len() * self.rooms.len()
    }

    /// Flat index of a slot, day-major.
    #[inline]
    pub fn slot_index(&self, day: DayId, interval: IntervalId, room: RoomId) -> usize {
        (day * self.intervals.len() + interval) * self.rooms.len() + room
    }

    /// Subjects ordered by ascending number of eligible rooms.
    pub fn sorted_subjects(&self) -> &[SubjectId] {
        &self.sorted_subjects
    }

    /// Smallest room capacity; the unit used to count unmet seat demand.
    pub fn min_capacity(&self) -> u32 {
        self.min_capacity
    }

    #[inline]
    pub fn room_hosts(&self, room: RoomId, subject: SubjectId) -> bool {
        self.hosts[room][subject]
    }

    #[inline]
    pub fn forbids_day(&self, prof: ProfId, day: DayId) -> bool {
        self.forbidden_days[prof][day]
    }

    #[inline]
    pub fn forbids_interval(&self, prof: ProfId, interval: IntervalId) -> bool {
        self.forbidden_intervals[prof][interval]
    }

    pub fn max_pause(&self, prof: ProfId) -> Option<u32> {
        self.professors[prof].constraints.max_pause
    }

    pub fn day_id(&self, name: &str) -> Option<DayId> {
        self.days.iter().position(|d| d == name)
    }

    pub fn room_id(&self, name: &str) -> Option<RoomId> {
        self.rooms.iter().position(|r| r.name == name)
    }

    pub fn subject_id(&self, name: &str) -> Option<SubjectId> {
        self.subjects.iter().position(|s| s.name == name)
    }

    pub fn professor_id(&self, name: &str) -> Option<ProfId> {
        self.professors.iter().position(|p| p.name == name)
    }

    /// Estimated average number of legal moves from a state.
    ///
    /// `days * intervals * rooms * avg(rooms per subject) * avg(professors per subject)`,
    /// rounded half to even.
    pub fn bfactor(&self) -> i64 {
        let n = self.subjects.len() as f64;
        let avg_rooms = self.subjects.iter().map(|s| s.rooms.len()).sum::<usize>() as f64 / n;
        let avg_profs = self
            .subjects
            .iter()
            .map(|s| s.professors.len())
            .sum::<usize>() as f64
            / n;

        let b = self.grid_size() as f64 * avg_rooms * avg_profs;
        b.round_ties_even() as i64
    }
}

/// Builder for [`Environment`].
///
/// # Examples
///
/// ```
/// use u_timetable::env::{Environment, ProfConstraints};
///
/// let env = Environment::builder()
///     .with_day("Luni")
///     .with_interval(8, 10)
///     .with_room("EG301", 30, &["PCOM"])
///     .with_subject("PCOM", 30)
///     .with_professor("Ana", &["PCOM"], ProfConstraints::default())
///     .build()
///     .unwrap();
/// assert_eq!(env.grid_size(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EnvironmentBuilder {
    days: Vec<String>,
    intervals: Vec<Interval>,
    rooms: Vec<(String, u32, Vec<String>)>,
    subjects: Vec<(String, u32)>,
    professors: Vec<(String, Vec<String>, ProfConstraints)>,
}

impl EnvironmentBuilder {
    pub fn with_day(mut self, name: impl Into<String>) -> Self {
        self.days.push(name.into());
        self
    }

    pub fn with_interval(mut self, start: u32, end: u32) -> Self {
        self.intervals.push(Interval::new(start, end));
        self
    }

    pub fn with_room(mut self, name: impl Into<String>, capacity: u32, subjects: &[&str]) -> Self {
        let subjects = subjects.iter().map(|s| s.to_string()).collect();
        self.rooms.push((name.into(), capacity, subjects));
        self
    }

    pub fn with_subject(mut self, name: impl Into<String>, students: u32) -> Self {
        self.subjects.push((name.into(), students));
        self
    }

    pub fn with_professor(
        mut self,
        name: impl Into<String>,
        subjects: &[&str],
        constraints: ProfConstraints,
    ) -> Self {
        let subjects = subjects.iter().map(|s| s.to_string()).collect();
        self.professors.push((name.into(), subjects, constraints));
        self
    }

    pub(crate) fn push_room(&mut self, name: String, capacity: u32, subjects: Vec<String>) {
        self.rooms.push((name, capacity, subjects));
    }

    pub(crate) fn push_professor(
        &mut self,
        name: String,
        subjects: Vec<String>,
        constraints: ProfConstraints,
    ) {
        self.professors.push((name, subjects, constraints));
    }

    /// Resolves names to ids, derives the lookup tables and validates the
    /// result.
    pub fn build(self) -> Result<Environment> {
        let invalid = |msg: String| Err(TimetableError::InvalidEnvironment(msg));

        if self.days.is_empty() {
            return invalid("no days".into());
        }
        if self.intervals.is_empty() {
            return invalid("no intervals".into());
        }
        if self.rooms.is_empty() {
            return invalid("no rooms".into());
        }
        if self.subjects.is_empty() {
            return invalid("no subjects".into());
        }
        check_unique("day", self.days.iter())?;
        check_unique("room", self.rooms.iter().map(|r| &r.0))?;
        check_unique("subject", self.subjects.iter().map(|s| &s.0))?;
        check_unique("professor", self.professors.iter().map(|p| &p.0))?;

        let subject_ids: HashMap<&str, SubjectId> = self
            .subjects
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.as_str(), i))
            .collect();
        let resolve = |owner: &str, name: &str| -> Result<SubjectId> {
            subject_ids.get(name).copied().ok_or_else(|| {
                TimetableError::InvalidEnvironment(format!("{owner} references unknown subject {name}"))
            })
        };

        let mut rooms = Vec::with_capacity(self.rooms.len());
        for (name, capacity, subjects) in &self.rooms {
            if *capacity == 0 {
                return invalid(format!("room {name} has zero capacity"));
            }
            let subjects = subjects
                .iter()
                .map(|s| resolve(name.as_str(), s.as_str()))
                .collect::<Result<Vec<_>>>()?;
            rooms.push(Room {
                name: name.clone(),
                capacity: *capacity,
                subjects,
            });
        }

        let mut professors = Vec::with_capacity(self.professors.len());
        for (name, subjects, constraints) in &self.professors {
            let subjects = subjects
                .iter()
                .map(|s| resolve(name.as_str(), s.as_str()))
                .collect::<Result<Vec<_>>>()?;
            professors.push(Professor {
                name: name.clone(),
                subjects,
                constraints: constraints.clone(),
            });
        }

        let mut hosts = vec![vec![false; self.subjects.len()]; rooms.len()];
        for (r, room) in rooms.iter().enumerate() {
            for &s in &room.subjects {
                hosts[r][s] = true;
            }
        }

        let mut subjects = Vec::with_capacity(self.subjects.len());
        for (s, (name, students)) in self.subjects.iter().enumerate() {
            let eligible_profs: Vec<ProfId> = professors
                .iter()
                .enumerate()
                .filter(|(_, p)| p.subjects.contains(&s))
                .map(|(p, _)| p)
                .collect();
            let eligible_rooms: Vec<RoomId> = (0..rooms.len()).filter(|&r| hosts[r][s]).collect();

            if eligible_profs.is_empty() {
                return invalid(format!("subject {name} has no eligible professor"));
            }
            if eligible_rooms.is_empty() {
                return invalid(format!("subject {name} has no eligible room"));
            }
            subjects.push(Subject {
                name: name.clone(),
                students: *students,
                professors: eligible_profs,
                rooms: eligible_rooms,
            });
        }

        let forbidden_days = professors
            .iter()
            .map(|p| {
                self.days
                    .iter()
                    .map(|d| p.constraints.days.contains(d))
                    .collect()
            })
            .collect();
        let forbidden_intervals = professors
            .iter()
            .map(|p| {
                self.intervals
                    .iter()
                    .map(|i| p.constraints.intervals.contains(i))
                    .collect()
            })
            .collect();

        // stable: ties keep descriptor order
        let mut sorted_subjects: Vec<SubjectId> = (0..subjects.len()).collect();
        sorted_subjects.sort_by_key(|&s| subjects[s].rooms.len());

        let min_capacity = rooms.iter().map(|r| r.capacity).min().unwrap_or(1);

        Ok(Environment {
            days: self.days,
            intervals: self.intervals,
            rooms,
            subjects,
            professors,
            hosts,
            forbidden_days,
            forbidden_intervals,
            sorted_subjects,
            min_capacity,
        })
    }
}

fn check_unique<'a>(kind: &str, names: impl Iterator<Item = &'a String>) -> Result<()> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(TimetableError::InvalidEnvironment(format!(
                "duplicate {kind} {name}"
            )));
        }
    }
    Ok(())
}
