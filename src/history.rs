//! Workout history: the logged sessions and their sets
//!
//! Storage lives in two tables, `workout_days` and `workout_records`. Loading
//! assembles them into `WorkoutDay` snapshots; rows that do not form a
//! well-formed record are dropped at this boundary.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::db::StoreError;
use crate::models::{NewWorkoutDay, RawRecord, WorkoutDay, WorkoutRecord};

/// ---------------------------------------------------------------------------
/// History Provider
/// ---------------------------------------------------------------------------

/// Source of the full workout history as one snapshot.
/// Never fails: a storage error is logged and yields an empty history.
pub trait HistoryProvider {
  fn load_workout_history(&self) -> impl Future<Output = Vec<WorkoutDay>> + Send;
}

impl HistoryProvider for SqlitePool {
  async fn load_workout_history(&self) -> Vec<WorkoutDay> {
    match load_history(self).await {
      Ok(history) => history,
      Err(e) => {
        tracing::error!(error = %e, "Failed to load workout history");
        Vec::new()
      }
    }
  }
}

/// ---------------------------------------------------------------------------
/// Database Operations
/// ---------------------------------------------------------------------------

/// All sessions in storage order (date, then insertion)
pub async fn load_history(pool: &SqlitePool) -> Result<Vec<WorkoutDay>, StoreError> {
  let day_rows = sqlx::query(
    r#"
    SELECT id, name, date
    FROM workout_days
    ORDER BY date ASC, id ASC
    "#,
  )
  .fetch_all(pool)
  .await?;

  let record_rows = sqlx::query(
    r#"
    SELECT workout_id, exercise_name, exercise_type, weight, repetitions, time, distance
    FROM workout_records
    ORDER BY workout_id ASC, position ASC
    "#,
  )
  .fetch_all(pool)
  .await?;

  let mut records_by_day: HashMap<i64, Vec<WorkoutRecord>> = HashMap::new();
  let mut skipped = 0usize;
  for row in record_rows {
    let repetitions: Option<i64> = row.get("repetitions");
    let raw = RawRecord {
      exercise_name: row.get("exercise_name"),
      exercise_type: row.get("exercise_type"),
      weight: row.get("weight"),
      repetitions: repetitions.and_then(|r| u32::try_from(r).ok()),
      time: row.get("time"),
      distance: row.get("distance"),
    };
    match raw.into_record() {
      Some(record) => records_by_day.entry(row.get("workout_id")).or_default().push(record),
      None => skipped += 1,
    }
  }
  if skipped > 0 {
    tracing::debug!(skipped, "Dropped malformed workout records");
  }

  let mut history = Vec::with_capacity(day_rows.len());
  for row in day_rows {
    let id: i64 = row.get("id");
    let date: String = row.get("date");
    let Ok(date) = NaiveDate::parse_from_str(&date, "%Y-%m-%d") else {
      tracing::debug!(id, date = %date, "Dropped workout day with malformed date");
      continue;
    };

    history.push(WorkoutDay {
      id,
      name: row.get("name"),
      date,
      records: records_by_day.remove(&id).unwrap_or_default(),
    });
  }

  Ok(history)
}

/// Store a finished session and return it with its assigned id
pub async fn save_workout_day(pool: &SqlitePool, day: &NewWorkoutDay) -> Result<WorkoutDay, StoreError> {
  if day.name.trim().is_empty() {
    return Err(StoreError::InvalidInput("Workout name must not be empty".into()));
  }

  let mut tx = pool.begin().await?;

  let result = sqlx::query("INSERT INTO workout_days (name, date) VALUES (?1, ?2)")
    .bind(&day.name)
    .bind(day.date.format("%Y-%m-%d").to_string())
    .execute(&mut *tx)
    .await?;
  let id = result.last_insert_rowid();

  for (position, record) in day.records.iter().enumerate() {
    let raw = RawRecord::from(record);
    sqlx::query(
      r#"
      INSERT INTO workout_records (
        workout_id, position, exercise_name, exercise_type,
        weight, repetitions, time, distance
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
      "#,
    )
    .bind(id)
    .bind(position as i64)
    .bind(&raw.exercise_name)
    .bind(&raw.exercise_type)
    .bind(raw.weight)
    .bind(raw.repetitions.map(i64::from))
    .bind(raw.time)
    .bind(raw.distance)
    .execute(&mut *tx)
    .await?;
  }

  tx.commit().await?;

  tracing::info!(id, name = %day.name, date = %day.date, sets = day.records.len(), "Saved workout day");

  Ok(day.clone().with_id(id))
}

pub async fn delete_workout_day(pool: &SqlitePool, id: i64) -> Result<(), StoreError> {
  let mut tx = pool.begin().await?;
  sqlx::query("DELETE FROM workout_records WHERE workout_id = ?1")
    .bind(id)
    .execute(&mut *tx)
    .await?;
  let result = sqlx::query("DELETE FROM workout_days WHERE id = ?1")
    .bind(id)
    .execute(&mut *tx)
    .await?;
  if result.rows_affected() == 0 {
    return Err(StoreError::NotFound {
      kind: "Workout day",
      name: id.to_string(),
    });
  }
  tx.commit().await?;
  Ok(())
}

pub async fn count_workout_days(pool: &SqlitePool) -> Result<i64, StoreError> {
  let count = sqlx::query_scalar("SELECT COUNT(*) FROM workout_days")
    .fetch_one(pool)
    .await?;
  Ok(count)
}

/// ---------------------------------------------------------------------------
/// Log View: filters, calendar markers, month grouping
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayFilter {
  #[default]
  All,
  /// Sessions with Rep or Calisthenics work
  MuscleBuilding,
  /// Sessions with Distance or Time work
  Cardio,
}

impl DayFilter {
  pub fn matches(&self, day: &WorkoutDay) -> bool {
    match self {
      DayFilter::All => true,
      DayFilter::MuscleBuilding => day.has_strength_work(),
      DayFilter::Cardio => day.has_cardio_work(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayMarker {
  Strength,
  Cardio,
  Both,
}

impl DayMarker {
  fn of(strength: bool, cardio: bool) -> Option<Self> {
    match (strength, cardio) {
      (true, true) => Some(DayMarker::Both),
      (true, false) => Some(DayMarker::Strength),
      (false, true) => Some(DayMarker::Cardio),
      (false, false) => None,
    }
  }
}

/// Calendar marker per training date. Several sessions on one date merge.
pub fn day_markers(history: &[WorkoutDay]) -> BTreeMap<NaiveDate, DayMarker> {
  let mut kinds: BTreeMap<NaiveDate, (bool, bool)> = BTreeMap::new();
  for day in history {
    let entry = kinds.entry(day.date).or_insert((false, false));
    entry.0 |= day.has_strength_work();
    entry.1 |= day.has_cardio_work();
  }

  kinds
    .into_iter()
    .filter_map(|(date, (strength, cardio))| DayMarker::of(strength, cardio).map(|m| (date, m)))
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGroup {
  /// e.g. "September 2025"
  pub label: String,
  pub days: Vec<WorkoutDay>,
}

/// Filtered sessions, newest first, grouped by calendar month
pub fn log_by_month(history: &[WorkoutDay], filter: DayFilter) -> Vec<MonthGroup> {
  let mut days: Vec<&WorkoutDay> = history.iter().filter(|d| filter.matches(d)).collect();
  days.sort_by(|a, b| b.date.cmp(&a.date));

  let mut groups: Vec<MonthGroup> = Vec::new();
  for day in days {
    let label = day.date.format("%B %Y").to_string();
    match groups.last_mut() {
      Some(group) if group.label == label => group.days.push(day.clone()),
      _ => groups.push(MonthGroup {
        label,
        days: vec![day.clone()],
      }),
    }
  }
  groups
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::Performance;
  use crate::test_utils::{day, mock_workout_day, setup_test_db, teardown_test_db};

  fn new_day(name: &str, date: NaiveDate, records: Vec<WorkoutRecord>) -> NewWorkoutDay {
    NewWorkoutDay {
      name: name.into(),
      date,
      records,
    }
  }

  #[tokio::test]
  async fn test_save_and_load_history() {
    // Arrange
    let pool = setup_test_db().await;
    let push = new_day(
      "Push day",
      day(2025, 8, 18),
      vec![
        WorkoutRecord::rep("Barbell Bench Press", 74.0, 10),
        WorkoutRecord::calisthenics("Dips", 12, None),
      ],
    );
    let run = new_day("Running", day(2025, 8, 30), vec![WorkoutRecord::distance("Running", 5.0, 32.0)]);

    // Act
    let saved_run = save_workout_day(&pool, &run).await.unwrap();
    let saved_push = save_workout_day(&pool, &push).await.unwrap();
    let history = pool.load_workout_history().await;

    // Assert: date order, records in logged order, ids kept
    assert_eq!(history, vec![saved_push, saved_run]);
    assert_eq!(history[0].records[1].performance, Performance::Calisthenics { repetitions: 12, time: None });

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_malformed_rows_are_dropped() {
    let pool = setup_test_db().await;
    let saved = save_workout_day(&pool, &new_day("Leg day", day(2025, 8, 20), vec![WorkoutRecord::rep("Barbell Squat", 100.0, 5)]))
      .await
      .unwrap();

    // A Rep row missing its repetitions and a row with an unknown type
    sqlx::query(
      "INSERT INTO workout_records (workout_id, position, exercise_name, exercise_type, weight) VALUES (?1, 1, 'Barbell Squat', 'Rep', 80.0)",
    )
    .bind(saved.id)
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
      "INSERT INTO workout_records (workout_id, position, exercise_name, exercise_type, time) VALUES (?1, 2, 'Yoga', 'Flow', 30.0)",
    )
    .bind(saved.id)
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO workout_days (name, date) VALUES ('Broken', 'yesterday')")
      .execute(&pool)
      .await
      .unwrap();

    let history = load_history(&pool).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].records.len(), 1);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_closed_pool_yields_empty_history() {
    let pool = setup_test_db().await;
    pool.close().await;

    assert!(pool.load_workout_history().await.is_empty());
  }

  #[tokio::test]
  async fn test_delete_workout_day() {
    let pool = setup_test_db().await;
    let saved = save_workout_day(&pool, &new_day("Core", day(2025, 9, 2), vec![WorkoutRecord::time("Plank", 60.0)]))
      .await
      .unwrap();

    delete_workout_day(&pool, saved.id).await.unwrap();
    assert_eq!(count_workout_days(&pool).await.unwrap(), 0);
    assert!(matches!(
      delete_workout_day(&pool, saved.id).await,
      Err(StoreError::NotFound { .. })
    ));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_empty_name_is_rejected() {
    let pool = setup_test_db().await;
    let result = save_workout_day(&pool, &new_day("  ", day(2025, 9, 2), vec![])).await;
    assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    teardown_test_db(pool).await;
  }

  #[test]
  fn test_filters_and_markers() {
    let history = vec![
      mock_workout_day(1, "Push day", day(2025, 8, 18), vec![WorkoutRecord::rep("Barbell Bench Press", 74.0, 10)]),
      mock_workout_day(2, "Running", day(2025, 8, 30), vec![WorkoutRecord::distance("Running", 5.0, 32.0)]),
      mock_workout_day(3, "Pull day", day(2025, 9, 1), vec![WorkoutRecord::calisthenics("Pull Up", 10, None)]),
      mock_workout_day(4, "Core", day(2025, 9, 1), vec![WorkoutRecord::time("Plank", 60.0)]),
      mock_workout_day(5, "Empty", day(2025, 9, 3), vec![]),
    ];

    assert_eq!(history.iter().filter(|d| DayFilter::MuscleBuilding.matches(d)).count(), 2);
    assert_eq!(history.iter().filter(|d| DayFilter::Cardio.matches(d)).count(), 2);

    let markers = day_markers(&history);
    assert_eq!(markers.len(), 3);
    assert_eq!(markers[&day(2025, 8, 18)], DayMarker::Strength);
    assert_eq!(markers[&day(2025, 8, 30)], DayMarker::Cardio);
    assert_eq!(markers[&day(2025, 9, 1)], DayMarker::Both);
  }

  #[test]
  fn test_log_by_month_newest_first() {
    let history = vec![
      mock_workout_day(1, "Push day", day(2025, 8, 18), vec![WorkoutRecord::rep("Barbell Bench Press", 74.0, 10)]),
      mock_workout_day(2, "Running", day(2025, 9, 1), vec![WorkoutRecord::distance("Running", 10.0, 57.49)]),
      mock_workout_day(3, "Running", day(2025, 8, 30), vec![WorkoutRecord::distance("Running", 5.0, 32.0)]),
    ];

    let groups = log_by_month(&history, DayFilter::All);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].label, "September 2025");
    assert_eq!(groups[1].label, "August 2025");
    assert_eq!(groups[1].days.iter().map(|d| d.id).collect::<Vec<_>>(), vec![3, 1]);

    let cardio = log_by_month(&history, DayFilter::Cardio);
    assert_eq!(cardio.iter().map(|g| g.days.len()).sum::<usize>(), 2);
  }
}
