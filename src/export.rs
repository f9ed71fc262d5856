//! Bulk export and import
//!
//! The document is one JSON object with three arrays: `exercises`,
//! `workouts` (templates) and `workoutDays` (history). Import is lenient per
//! element: anything that does not parse is counted and skipped, so one bad
//! record never rejects the whole file.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::catalog::{load_exercises, load_templates, upsert_exercise, upsert_template};
use crate::db::StoreError;
use crate::history::{load_history, save_workout_day};
use crate::models::{Exercise, NewWorkoutDay, RawRecord, WorkoutTemplate};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
  pub exercises: Vec<Exercise>,
  pub workouts: Vec<WorkoutTemplate>,
  pub workout_days: Vec<NewWorkoutDay>,
}

impl ExportDocument {
  pub fn to_json(&self) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(self)?)
  }
}

/// Counts of what an import took in and what it had to skip
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
  pub exercises: usize,
  pub templates: usize,
  pub workout_days: usize,
  pub skipped: usize,
}

/// Snapshot every store into one document
pub async fn export_document(pool: &SqlitePool) -> Result<ExportDocument, StoreError> {
  let exercises = load_exercises(pool).await?;
  let workouts = load_templates(pool).await?;
  let workout_days = load_history(pool)
    .await?
    .into_iter()
    .map(|day| NewWorkoutDay {
      name: day.name,
      date: day.date,
      records: day.records,
    })
    .collect();

  Ok(ExportDocument {
    exercises,
    workouts,
    workout_days,
  })
}

/// ---------------------------------------------------------------------------
/// Parsing
/// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LooseDocument {
  #[serde(default)]
  exercises: Vec<Value>,
  #[serde(default)]
  workouts: Vec<Value>,
  #[serde(default)]
  workout_days: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct LooseDay {
  name: String,
  date: chrono::NaiveDate,
  #[serde(default)]
  exercises: Vec<Value>,
}

fn counted<T>(parsed: Option<T>, skipped: &mut usize) -> Option<T> {
  if parsed.is_none() {
    *skipped += 1;
  }
  parsed
}

/// Parse a document, keeping every well-formed element.
/// Returns the document and the number of elements skipped. Fails only when
/// the text is not a JSON object with array fields.
pub fn parse_document(json: &str) -> Result<(ExportDocument, usize), StoreError> {
  let loose: LooseDocument = serde_json::from_str(json)?;
  let mut skipped = 0usize;

  let exercises: Vec<Exercise> = loose
    .exercises
    .into_iter()
    .filter_map(|v| counted(serde_json::from_value(v).ok(), &mut skipped))
    .collect();

  let workouts: Vec<WorkoutTemplate> = loose
    .workouts
    .into_iter()
    .filter_map(|v| counted(serde_json::from_value(v).ok(), &mut skipped))
    .collect();

  let mut workout_days = Vec::with_capacity(loose.workout_days.len());
  for value in loose.workout_days {
    let Some(day) = counted(serde_json::from_value::<LooseDay>(value).ok(), &mut skipped) else {
      continue;
    };
    let records = day
      .exercises
      .into_iter()
      .filter_map(|v| {
        let record = serde_json::from_value::<RawRecord>(v).ok().and_then(RawRecord::into_record);
        counted(record, &mut skipped)
      })
      .collect();
    workout_days.push(NewWorkoutDay {
      name: day.name,
      date: day.date,
      records,
    });
  }

  if skipped > 0 {
    tracing::debug!(skipped, "Skipped malformed elements while parsing document");
  }

  Ok((
    ExportDocument {
      exercises,
      workouts,
      workout_days,
    },
    skipped,
  ))
}

/// Merge a document into storage: exercises and templates are upserted by
/// name, sessions are appended.
pub async fn import_document(pool: &SqlitePool, json: &str) -> Result<ImportReport, StoreError> {
  let (document, skipped) = parse_document(json)?;
  let mut report = ImportReport {
    skipped,
    ..Default::default()
  };

  for exercise in &document.exercises {
    match upsert_exercise(pool, exercise).await {
      Ok(()) => report.exercises += 1,
      Err(StoreError::InvalidInput(reason)) => {
        tracing::debug!(reason = %reason, "Skipped exercise on import");
        report.skipped += 1;
      }
      Err(e) => return Err(e),
    }
  }

  for template in &document.workouts {
    match upsert_template(pool, template).await {
      Ok(()) => report.templates += 1,
      Err(StoreError::InvalidInput(reason)) => {
        tracing::debug!(reason = %reason, "Skipped template on import");
        report.skipped += 1;
      }
      Err(e) => return Err(e),
    }
  }

  for day in &document.workout_days {
    match save_workout_day(pool, day).await {
      Ok(_) => report.workout_days += 1,
      Err(StoreError::InvalidInput(reason)) => {
        tracing::debug!(reason = %reason, "Skipped workout day on import");
        report.skipped += 1;
      }
      Err(e) => return Err(e),
    }
  }

  tracing::info!(
    exercises = report.exercises,
    templates = report.templates,
    workout_days = report.workout_days,
    skipped = report.skipped,
    "Imported document"
  );

  Ok(report)
}
