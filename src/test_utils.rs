//! Test utilities and helpers for unit and database testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Seed helpers for the catalog and history
//! - Mock data factories
//! - Helper assertions

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::catalog::upsert_exercise;
use crate::history::save_workout_day;
use crate::models::{Exercise, ExerciseCategory, ExerciseType, NewWorkoutDay, WorkoutDay, WorkoutRecord};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Seed the database with the mock catalog
pub async fn seed_test_catalog(pool: &SqlitePool) -> Vec<Exercise> {
  let catalog = mock_catalog();
  for exercise in &catalog {
    upsert_exercise(pool, exercise)
      .await
      .expect("Failed to seed exercise");
  }
  catalog
}

/// Seed the database with the given sessions
/// Returns them with their assigned ids
pub async fn seed_test_history(pool: &SqlitePool, days: &[NewWorkoutDay]) -> Vec<WorkoutDay> {
  let mut saved = Vec::with_capacity(days.len());
  for day in days {
    saved.push(
      save_workout_day(pool, day)
        .await
        .expect("Failed to seed workout day"),
    );
  }
  saved
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Small catalog covering every exercise type
pub fn mock_catalog() -> Vec<Exercise> {
  vec![
    Exercise::new("Barbell Bench Press", ExerciseCategory::Chest, ExerciseType::Rep),
    Exercise::new("Tricep Pushdown", ExerciseCategory::Triceps, ExerciseType::Rep),
    Exercise::new("Dips", ExerciseCategory::Triceps, ExerciseType::Calisthenics),
    Exercise::new("Barbell Squat", ExerciseCategory::Legs, ExerciseType::Rep),
    Exercise::new("Deadlift", ExerciseCategory::Legs, ExerciseType::Rep),
    Exercise::new("Pull Up", ExerciseCategory::Back, ExerciseType::Calisthenics),
    Exercise::new("Plank", ExerciseCategory::Abs, ExerciseType::Time),
    Exercise::new("Running", ExerciseCategory::Cardio, ExerciseType::Distance),
  ]
}

/// Create a stored session with a fixed id
pub fn mock_workout_day(id: i64, name: &str, date: NaiveDate, records: Vec<WorkoutRecord>) -> WorkoutDay {
  WorkoutDay {
    id,
    name: name.to_string(),
    date,
    records,
  }
}

/// Create an unsaved session
pub fn mock_new_workout_day(name: &str, date: NaiveDate, records: Vec<WorkoutRecord>) -> NewWorkoutDay {
  NewWorkoutDay {
    name: name.to_string(),
    date,
    records,
  }
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// Calendar date shorthand
pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('exercises', 'workout_templates', 'template_entries', 'workout_days', 'workout_records')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 5, "Expected 5 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_history_assigns_ids() {
    let pool = setup_test_db().await;

    let saved = seed_test_history(
      &pool,
      &[
        mock_new_workout_day("Core", day(2025, 9, 1), vec![WorkoutRecord::time("Plank", 60.0)]),
        mock_new_workout_day("Core", day(2025, 9, 3), vec![WorkoutRecord::time("Plank", 75.0)]),
      ],
    )
    .await;

    assert_eq!(saved.len(), 2);
    assert!(saved[1].id > saved[0].id);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_catalog_covers_every_type() {
    let catalog = mock_catalog();
    for exercise_type in [ExerciseType::Rep, ExerciseType::Time, ExerciseType::Distance, ExerciseType::Calisthenics] {
      assert!(catalog.iter().any(|e| e.exercise_type == exercise_type));
    }
  }
}
