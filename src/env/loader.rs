//! YAML descriptor loader.
//!
//! The descriptor is a single YAML document:
//!
//! ```yaml
//! Zile: [Luni, Marti]
//! Intervale: ["(8, 10)", "(10, 12)"]
//! Materii:
//!   PCOM: 60
//! Sali:
//!   EG301:
//!     Capacitate: 30
//!     Materii: [PCOM]
//! Profesori:
//!   Ana:
//!     Materii: [PCOM]
//!     Constrangeri: ["!Marti", "!14-18", "!Pauza > 2"]
//! ```
//!
//! Mapping order is preserved: rooms and professors are indexed in the
//! order they appear, which fixes the enumeration order of the search.

use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use super::types::{Environment, Interval, ProfConstraints};
use crate::error::{Result, TimetableError};

const DAYS: &str = "Zile";
const INTERVALS: &str = "Intervale";
const ROOMS: &str = "Sali";
const SUBJECTS: &str = "Materii";
const PROFESSORS: &str = "Profesori";

#[derive(Debug, Deserialize)]
struct RoomSpec {
    #[serde(rename = "Capacitate")]
    capacity: u32,
    #[serde(rename = "Materii", default)]
    subjects: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProfessorSpec {
    #[serde(rename = "Materii", default)]
    subjects: Vec<String>,
    #[serde(rename = "Constrangeri", default)]
    constraints: Vec<String>,
}

impl Environment {
    /// Loads an environment from a YAML descriptor file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parses an environment from YAML descriptor text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let doc: Value = serde_yaml::from_str(text)?;
        let doc = doc
            .as_mapping()
            .ok_or_else(|| TimetableError::InvalidDescriptor("top level must be a mapping".into()))?;

        let mut builder = Environment::builder();

        let days: Vec<String> = serde_yaml::from_value(section(doc, DAYS)?.clone())?;
        for day in days {
            builder = builder.with_day(day);
        }

        let intervals: Vec<String> = serde_yaml::from_value(section(doc, INTERVALS)?.clone())?;
        for text in &intervals {
            let interval = parse_interval(text).ok_or_else(|| {
                TimetableError::InvalidDescriptor(format!("malformed interval {text:?}"))
            })?;
            builder = builder.with_interval(interval.start, interval.end);
        }

        for (name, value) in entries(doc, SUBJECTS)? {
            let students: u32 = serde_yaml::from_value(value.clone())?;
            builder = builder.with_subject(name, students);
        }

        for (name, value) in entries(doc, ROOMS)? {
            let spec: RoomSpec = serde_yaml::from_value(value.clone())?;
            builder.push_room(name, spec.capacity, spec.subjects);
        }

        for (name, value) in entries(doc, PROFESSORS)? {
            let spec: ProfessorSpec = serde_yaml::from_value(value.clone())?;
            let constraints = parse_constraints(&name, &spec.constraints)?;
            builder.push_professor(name, spec.subjects, constraints);
        }

        builder.build()
    }
}

fn section<'a>(doc: &'a Mapping, key: &str) -> Result<&'a Value> {
    doc.get(key)
        .ok_or_else(|| TimetableError::InvalidDescriptor(format!("missing section {key}")))
}

fn entries<'a>(doc: &'a Mapping, key: &str) -> Result<Vec<(String, &'a Value)>> {
    let map = section(doc, key)?
        .as_mapping()
        .ok_or_else(|| TimetableError::InvalidDescriptor(format!("section {key} must be a mapping")))?;

    map.iter()
        .map(|(k, v)| {
            let name = match k {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => {
                    return Err(TimetableError::InvalidDescriptor(format!(
                        "non-scalar key in section {key}"
                    )))
                }
            };
            Ok((name, v))
        })
        .collect()
}

/// Parses `"(8, 10)"` or `"8-10"` into an interval.
pub fn parse_interval(text: &str) -> Option<Interval> {
    let inner = text.trim().trim_start_matches('(').trim_end_matches(')');
    let (a, b) = inner.split_once(',').or_else(|| inner.split_once('-'))?;
    let start = a.trim().parse().ok()?;
    let end = b.trim().parse().ok()?;
    (start < end).then(|| Interval::new(start, end))
}

/// Parses a professor's constraint strings.
///
/// Only negative constraints (leading `!`) are kept:
///
/// - `!Marti`: avoid a day
/// - `!14-18`: avoid the 2-hour intervals `14-16` and `16-18`
/// - `!Pauza > 2`: keep pauses between classes at most 2 hours
///
/// Positive constraints are accepted and ignored.
pub fn parse_constraints(professor: &str, raw: &[String]) -> Result<ProfConstraints> {
    let mut constraints = ProfConstraints::default();
    let bad = |c: &str| TimetableError::InvalidConstraint {
        professor: professor.to_string(),
        constraint: c.to_string(),
    };

    for c in raw.iter().map(String::as_str) {
        let Some(rest) = c.trim().strip_prefix('!') else {
            continue;
        };
        let rest = rest.trim();
        let first = rest.chars().next().ok_or_else(|| bad(c))?;

        if first.is_ascii_digit() {
            let interval = parse_interval(rest).ok_or_else(|| bad(c))?;
            if interval.end - interval.start > 2 {
                for start in (interval.start..interval.end).step_by(2) {
                    constraints.intervals.insert(Interval::new(start, start + 2));
                }
            } else {
                constraints.intervals.insert(interval);
            }
        } else if first == 'P' {
            let digits: String = rest
                .chars()
                .rev()
                .take_while(|ch| ch.is_ascii_digit())
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            let hours = digits.parse().map_err(|_| bad(c))?;
            constraints.max_pause = Some(hours);
        } else {
            constraints.days.insert(rest.to_string());
        }
    }

    Ok(constraints)
}
