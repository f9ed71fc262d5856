//! Personal Record Engine
//!
//! Computes best-ever performances and one-rep-max progress from the logged
//! history. Everything here is a pure function over an immutable snapshot:
//! - personal record per exercise, compared by exercise type
//! - estimated 1RM per training date (Rep exercises)
//! - max repetitions per training date (Calisthenics exercises)
//! - PR detection for a just-finished session

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Exercise, ExerciseType, Performance, WorkoutDay};

// ---------------------------------------------------------------------------
/// One-Rep-Max Estimate
// ---------------------------------------------------------------------------

/// Epley estimate of the heaviest single repetition.
/// A single is taken at face value.
pub fn one_rep_max(weight: f64, repetitions: u32) -> f64 {
    if repetitions == 1 {
        weight
    } else {
        weight * (1.0 + repetitions as f64 / 30.0)
    }
}

// ---------------------------------------------------------------------------
/// Personal Record: best performance, one shape per exercise type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PersonalRecord {
    Rep { weight: f64, reps: u32 },
    Time { time: f64 },
    Distance { distance: f64, time: f64 },
    Calisthenics { reps: u32 },
}

impl PersonalRecord {
    pub fn from_performance(performance: &Performance) -> Self {
        match *performance {
            Performance::Rep { weight, repetitions } => PersonalRecord::Rep {
                weight,
                reps: repetitions,
            },
            Performance::Time { time } => PersonalRecord::Time { time },
            Performance::Distance { distance, time } => PersonalRecord::Distance { distance, time },
            Performance::Calisthenics { repetitions, .. } => PersonalRecord::Calisthenics { reps: repetitions },
        }
    }

    /// Strictly better than `other` under the exercise type's ordering.
    /// Records of different types never beat each other.
    pub fn beats(&self, other: &PersonalRecord) -> bool {
        match (*self, *other) {
            (
                PersonalRecord::Rep { weight, reps },
                PersonalRecord::Rep { weight: best_weight, reps: best_reps },
            ) => weight > best_weight || (weight == best_weight && reps > best_reps),
            (PersonalRecord::Time { time }, PersonalRecord::Time { time: best_time }) => time > best_time,
            (
                PersonalRecord::Distance { distance, time },
                PersonalRecord::Distance { distance: best_distance, time: best_time },
            ) => distance > best_distance || (distance == best_distance && time < best_time),
            (PersonalRecord::Calisthenics { reps }, PersonalRecord::Calisthenics { reps: best_reps }) => {
                reps > best_reps
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseStats {
    pub pr: Option<PersonalRecord>,
    pub times_trained: u32,
}

/// Sessions ordered by date. The sort is stable so same-day sessions keep
/// their storage order.
fn chronological<'a>(sessions: impl IntoIterator<Item = &'a WorkoutDay>) -> Vec<&'a WorkoutDay> {
    let mut ordered: Vec<&WorkoutDay> = sessions.into_iter().collect();
    ordered.sort_by_key(|w| w.date);
    ordered
}

/// Qualifying sets of `exercise` in chronological order: matching name,
/// matching type, positive primary quantity.
fn qualifying_sets<'a>(sessions: &[&'a WorkoutDay], exercise: &Exercise) -> Vec<(NaiveDate, &'a Performance)> {
    let mut sets = Vec::new();
    for session in sessions.iter().copied() {
        for record in session.records.iter().filter(|r| r.exercise_name == exercise.name) {
            let performance = &record.performance;
            if performance.exercise_type() == exercise.exercise_type && performance.is_qualifying() {
                sets.push((session.date, performance));
            }
        }
    }
    sets
}

fn best_of<'a>(sessions: impl IntoIterator<Item = &'a WorkoutDay>, exercise: &Exercise) -> Option<PersonalRecord> {
    let ordered = chronological(sessions);
    qualifying_sets(&ordered, exercise).into_iter().fold(None, |best, (_, performance)| {
        let candidate = PersonalRecord::from_performance(performance);
        match best {
            Some(current) if !candidate.beats(&current) => Some(current),
            _ => Some(candidate),
        }
    })
}

/// Best-ever performance for an exercise, or None without qualifying history
pub fn compute_personal_record(history: &[WorkoutDay], exercise: &Exercise) -> Option<PersonalRecord> {
    best_of(history, exercise)
}

/// PR plus the number of sessions that logged the exercise at all
pub fn exercise_stats(history: &[WorkoutDay], exercise: &Exercise) -> ExerciseStats {
    let times_trained = history
        .iter()
        .filter(|w| w.records_for(&exercise.name).next().is_some())
        .count() as u32;

    ExerciseStats {
        pr: compute_personal_record(history, exercise),
        times_trained,
    }
}

// ---------------------------------------------------------------------------
/// Progress Series (one point per active date, no zero fill)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneRepMaxPoint {
    pub date: NaiveDate,
    pub one_rep_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepsPoint {
    pub date: NaiveDate,
    pub repetitions: u32,
    /// Longest timed set that day, when any set was timed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
}

/// Daily best estimated 1RM, date ascending
pub fn one_rep_max_series(history: &[WorkoutDay], exercise: &Exercise) -> Vec<OneRepMaxPoint> {
    if exercise.exercise_type != ExerciseType::Rep {
        return Vec::new();
    }

    let ordered = chronological(history);
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (date, performance) in qualifying_sets(&ordered, exercise) {
        if let Performance::Rep { weight, repetitions } = *performance {
            let estimate = one_rep_max(weight, repetitions);
            by_date
                .entry(date)
                .and_modify(|best| *best = best.max(estimate))
                .or_insert(estimate);
        }
    }

    by_date
        .into_iter()
        .map(|(date, one_rep_max)| OneRepMaxPoint { date, one_rep_max })
        .collect()
}

/// Daily max repetitions (and max time) for a Calisthenics exercise
pub fn calisthenics_series(history: &[WorkoutDay], exercise: &Exercise) -> Vec<RepsPoint> {
    if exercise.exercise_type != ExerciseType::Calisthenics {
        return Vec::new();
    }

    let ordered = chronological(history);
    let mut by_date: BTreeMap<NaiveDate, (u32, f64)> = BTreeMap::new();
    for (date, performance) in qualifying_sets(&ordered, exercise) {
        if let Performance::Calisthenics { repetitions, time } = *performance {
            let entry = by_date.entry(date).or_insert((0, 0.0));
            entry.0 = entry.0.max(repetitions);
            entry.1 = entry.1.max(time.unwrap_or(0.0));
        }
    }

    by_date
        .into_iter()
        .map(|(date, (repetitions, time))| RepsPoint {
            date,
            repetitions,
            time: (time > 0.0).then_some(time),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoggedPerformance {
    pub date: NaiveDate,
    pub performance: Performance,
}

/// Every qualifying set with its date, most recent first.
/// Used for Time and Distance exercises, which are listed rather than charted.
pub fn performance_log(history: &[WorkoutDay], exercise: &Exercise) -> Vec<LoggedPerformance> {
    let ordered = chronological(history);
    let mut entries: Vec<LoggedPerformance> = qualifying_sets(&ordered, exercise)
        .into_iter()
        .map(|(date, performance)| LoggedPerformance {
            date,
            performance: *performance,
        })
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries
}

/// What the exercise detail view shows, decided by exercise type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExerciseProgress {
    OneRepMax { series: Vec<OneRepMaxPoint> },
    Repetitions { series: Vec<RepsPoint> },
    Log { entries: Vec<LoggedPerformance> },
}

impl ExerciseProgress {
    /// Number of chartable points (0 for list views)
    pub fn series_len(&self) -> usize {
        match self {
            ExerciseProgress::OneRepMax { series } => series.len(),
            ExerciseProgress::Repetitions { series } => series.len(),
            ExerciseProgress::Log { .. } => 0,
        }
    }

    /// Dates of the chartable points, in order
    pub fn dates(&self) -> Vec<NaiveDate> {
        match self {
            ExerciseProgress::OneRepMax { series } => series.iter().map(|p| p.date).collect(),
            ExerciseProgress::Repetitions { series } => series.iter().map(|p| p.date).collect(),
            ExerciseProgress::Log { .. } => Vec::new(),
        }
    }
}

pub fn exercise_progress(history: &[WorkoutDay], exercise: &Exercise) -> ExerciseProgress {
    match exercise.exercise_type {
        ExerciseType::Rep => ExerciseProgress::OneRepMax {
            series: one_rep_max_series(history, exercise),
        },
        ExerciseType::Calisthenics => ExerciseProgress::Repetitions {
            series: calisthenics_series(history, exercise),
        },
        ExerciseType::Time | ExerciseType::Distance => ExerciseProgress::Log {
            entries: performance_log(history, exercise),
        },
    }
}

// ---------------------------------------------------------------------------
/// PR Detection on Workout Completion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrAnnouncement {
    pub exercise_name: String,
    pub record: PersonalRecord,
}

impl std::fmt::Display for PrAnnouncement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.record {
            PersonalRecord::Rep { weight, reps } => {
                write!(f, "{} - {}kg {} reps", self.exercise_name, weight, reps)
            }
            PersonalRecord::Distance { distance, time } => {
                write!(f, "{} - {:.2}km {}min", self.exercise_name, distance, time.round())
            }
            PersonalRecord::Time { time } => write!(f, "{} - {}s", self.exercise_name, time),
            PersonalRecord::Calisthenics { reps } => write!(f, "{} - {} reps", self.exercise_name, reps),
        }
    }
}

/// Find the sets of `session` that beat everything logged before it.
///
/// The session is excluded from `history` by id, so it does not matter
/// whether it has already been stored or where it sits in the list. Sets of
/// exercises missing from the catalog, or logged with a different type than
/// the catalog declares, are skipped.
pub fn detect_new_records(
    session: &WorkoutDay,
    history: &[WorkoutDay],
    catalog: &[Exercise],
) -> Vec<PrAnnouncement> {
    let previous: Vec<&WorkoutDay> = history.iter().filter(|w| w.id != session.id).collect();
    let mut previous_best: HashMap<&str, Option<PersonalRecord>> = HashMap::new();
    let mut announcements = Vec::new();

    for record in &session.records {
        let Some(exercise) = catalog.iter().find(|e| e.name == record.exercise_name) else {
            continue;
        };
        if record.exercise_type() != exercise.exercise_type || !record.performance.is_qualifying() {
            continue;
        }

        let best = *previous_best
            .entry(exercise.name.as_str())
            .or_insert_with(|| best_of(previous.iter().copied(), exercise));

        let candidate = PersonalRecord::from_performance(&record.performance);
        if best.map_or(true, |b| candidate.beats(&b)) {
            announcements.push(PrAnnouncement {
                exercise_name: record.exercise_name.clone(),
                record: candidate,
            });
        }
    }

    announcements
}

/// Message shown after saving a session
pub fn completion_message(announcements: &[PrAnnouncement]) -> String {
    let mut message = String::from("Workout saved!");
    if !announcements.is_empty() {
        message.push_str("\nCongratulations, new PRs:\n");
        let lines: Vec<String> = announcements.iter().map(|a| a.to_string()).collect();
        message.push_str(&lines.join("\n"));
    }
    message
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
