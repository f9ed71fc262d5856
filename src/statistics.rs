//! Training statistics over a date range
//!
//! Aggregates session counts, volume, distance, per-category record counts
//! and benchmark 1RM deltas from a history snapshot.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{Exercise, ExerciseCategory, Performance, WorkoutDay};
use crate::personal_records::one_rep_max;

/// ---------------------------------------------------------------------------
/// Date Range
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DateRange {
  Last30Days,
  YearToDate,
  AllTime,
  Explicit { start: NaiveDate, end: NaiveDate },
}

impl DateRange {
  pub fn label(&self) -> &'static str {
    match self {
      DateRange::Last30Days => "Last 30 days",
      DateRange::YearToDate => "This year",
      DateRange::AllTime => "All time",
      DateRange::Explicit { .. } => "Choose Dates",
    }
  }

  /// Resolve against "now" into something that can test session dates
  pub fn resolve(&self, now: NaiveDateTime) -> ResolvedRange {
    match *self {
      DateRange::Last30Days => ResolvedRange::Instants {
        start: now - Duration::days(30),
        end: now,
      },
      DateRange::YearToDate => ResolvedRange::Instants {
        start: midnight(NaiveDate::from_ymd_opt(now.year(), 1, 1).unwrap_or(now.date())),
        end: now,
      },
      DateRange::AllTime => ResolvedRange::Instants {
        start: midnight(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN)),
        end: now,
      },
      DateRange::Explicit { start, end } => ResolvedRange::Days { start, end },
    }
  }
}

impl std::fmt::Display for DateRange {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      DateRange::Explicit { start, end } => write!(f, "{} : {}", start, end),
      other => f.write_str(other.label()),
    }
  }
}

/// A date range fixed to a point in time.
/// Preset ranges compare the session date at midnight against instants;
/// explicit ranges match whole calendar days, both ends inclusive, with no
/// time of day involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRange {
  Instants { start: NaiveDateTime, end: NaiveDateTime },
  Days { start: NaiveDate, end: NaiveDate },
}

impl ResolvedRange {
  pub fn contains(&self, date: NaiveDate) -> bool {
    match self {
      ResolvedRange::Instants { start, end } => {
        let at = midnight(date);
        at >= *start && at <= *end
      }
      ResolvedRange::Days { start, end } => *start <= date && date <= *end,
    }
  }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
  date.and_time(chrono::NaiveTime::MIN)
}

/// ---------------------------------------------------------------------------
/// Benchmark Lifts
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkLift {
  BenchPress,
  Squat,
  Deadlift,
}

impl BenchmarkLift {
  pub const ALL: [BenchmarkLift; 3] = [BenchmarkLift::BenchPress, BenchmarkLift::Squat, BenchmarkLift::Deadlift];

  /// Lower-case fragment an exercise name must contain
  pub fn pattern(&self) -> &'static str {
    match self {
      BenchmarkLift::BenchPress => "bench press",
      BenchmarkLift::Squat => "squat",
      BenchmarkLift::Deadlift => "deadlift",
    }
  }

  pub fn matches(&self, exercise_name: &str) -> bool {
    exercise_name.to_lowercase().contains(self.pattern())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneRepMaxProgress {
  pub lift: BenchmarkLift,
  /// Best 1RM on the last active date minus best 1RM on the first
  pub delta: Option<f64>,
}

/// Change in best daily 1RM across the sessions that are in range
pub fn one_rep_max_delta(sessions: &[&WorkoutDay], lift: BenchmarkLift) -> Option<f64> {
  let mut daily_best: BTreeMap<NaiveDate, f64> = BTreeMap::new();

  for session in sessions {
    for record in &session.records {
      if !lift.matches(&record.exercise_name) || !record.performance.is_qualifying() {
        continue;
      }
      if let Performance::Rep { weight, repetitions } = record.performance {
        let estimate = one_rep_max(weight, repetitions);
        daily_best
          .entry(session.date)
          .and_modify(|best| *best = best.max(estimate))
          .or_insert(estimate);
      }
    }
  }

  let (_, first) = daily_best.first_key_value()?;
  let (_, last) = daily_best.last_key_value()?;
  Some(last - first)
}

/// ---------------------------------------------------------------------------
/// Statistics Summary
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryVolume {
  pub category: ExerciseCategory,
  pub records: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
  pub range: DateRange,
  pub hypertrophy_sessions: u32,
  pub cardio_sessions: u32,
  /// kg, sum of weight x repetitions over Rep sets
  pub weight_lifted: f64,
  pub distance_km: f64,
  pub sets: u32,
  pub category_volume: Vec<CategoryVolume>,
  pub one_rep_max_progress: Vec<OneRepMaxProgress>,
}

impl StatisticsSummary {
  /// Aggregate `history` over `range` as seen at `now`
  pub fn compute(range: DateRange, history: &[WorkoutDay], catalog: &[Exercise], now: NaiveDateTime) -> Self {
    let resolved = range.resolve(now);
    let in_range: Vec<&WorkoutDay> = history.iter().filter(|w| resolved.contains(w.date)).collect();

    let mut hypertrophy_sessions = 0;
    let mut cardio_sessions = 0;
    let mut weight_lifted = 0.0;
    let mut distance_km = 0.0;
    let mut sets = 0;
    let mut counts: BTreeMap<ExerciseCategory, u32> = ExerciseCategory::ALL.into_iter().map(|c| (c, 0)).collect();

    for session in &in_range {
      if session.has_strength_work() {
        hypertrophy_sessions += 1;
      }
      if session.has_cardio_work() {
        cardio_sessions += 1;
      }

      for record in &session.records {
        if let Some(exercise) = catalog.iter().find(|e| e.name == record.exercise_name) {
          *counts.entry(exercise.category).or_insert(0) += 1;
        }

        match record.performance {
          Performance::Rep { weight, repetitions } => {
            weight_lifted += weight * repetitions as f64;
            sets += 1;
          }
          Performance::Distance { distance, .. } => distance_km += distance,
          _ => {}
        }
      }
    }

    let category_volume = ExerciseCategory::ALL
      .into_iter()
      .map(|category| CategoryVolume {
        category,
        records: counts.get(&category).copied().unwrap_or(0),
      })
      .collect();

    let one_rep_max_progress = BenchmarkLift::ALL
      .into_iter()
      .map(|lift| OneRepMaxProgress {
        lift,
        delta: one_rep_max_delta(&in_range, lift),
      })
      .collect();

    tracing::debug!(
      range = %range,
      sessions = in_range.len(),
      "Computed statistics"
    );

    Self {
      range,
      hypertrophy_sessions,
      cardio_sessions,
      weight_lifted,
      distance_km,
      sets,
      category_volume,
      one_rep_max_progress,
    }
  }

  pub fn volume_for(&self, category: ExerciseCategory) -> u32 {
    self
      .category_volume
      .iter()
      .find(|v| v.category == category)
      .map(|v| v.records)
      .unwrap_or(0)
  }

  pub fn progress_for(&self, lift: BenchmarkLift) -> Option<f64> {
    self
      .one_rep_max_progress
      .iter()
      .find(|p| p.lift == lift)
      .and_then(|p| p.delta)
  }
}
