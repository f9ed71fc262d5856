//! Exercise catalog, templates and per-exercise progress

use serde::Serialize;

use super::find_exercise;
use crate::catalog::{self, CatalogProvider};
use crate::chart_window::ChartWindow;
use crate::db::{AppState, StoreError};
use crate::history::HistoryProvider;
use crate::models::{Exercise, ExerciseCategory, ExerciseType, WorkoutTemplate};
use crate::personal_records::{exercise_progress, exercise_stats, ExerciseProgress, ExerciseStats};

/// ---------------------------------------------------------------------------
/// Catalog
/// ---------------------------------------------------------------------------

pub async fn list_exercises(state: &AppState) -> Result<Vec<Exercise>, StoreError> {
  Ok(state.db.load_exercise_catalog().await)
}

/// Add an exercise from its form fields
pub async fn add_exercise(
  state: &AppState,
  name: String,
  category: String,
  exercise_type: String,
) -> Result<Exercise, StoreError> {
  let category: ExerciseCategory = category.parse().map_err(StoreError::InvalidInput)?;
  let exercise_type: ExerciseType = exercise_type.parse().map_err(StoreError::InvalidInput)?;
  let exercise = Exercise::new(name.trim(), category, exercise_type);

  catalog::add_exercise(&state.db, &exercise).await?;
  Ok(exercise)
}

pub async fn delete_exercise(state: &AppState, name: String) -> Result<(), StoreError> {
  catalog::delete_exercise(&state.db, &name).await
}

/// ---------------------------------------------------------------------------
/// Templates
/// ---------------------------------------------------------------------------

pub async fn list_templates(state: &AppState) -> Result<Vec<WorkoutTemplate>, StoreError> {
  catalog::load_templates(&state.db).await
}

pub async fn add_template(state: &AppState, template: WorkoutTemplate) -> Result<(), StoreError> {
  catalog::add_template(&state.db, &template).await
}

pub async fn update_template(state: &AppState, name: String, template: WorkoutTemplate) -> Result<(), StoreError> {
  catalog::update_template(&state.db, &name, &template).await
}

pub async fn delete_template(state: &AppState, name: String) -> Result<(), StoreError> {
  catalog::delete_template(&state.db, &name).await
}

/// ---------------------------------------------------------------------------
/// Exercise Detail
/// ---------------------------------------------------------------------------

/// PR and training count for one exercise
pub async fn get_exercise_stats(state: &AppState, name: String) -> Result<ExerciseStats, StoreError> {
  let (catalog, history) = tokio::join!(state.db.load_exercise_catalog(), state.db.load_workout_history());
  let exercise = find_exercise(&catalog, &name)?;
  Ok(exercise_stats(&history, exercise))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseProgressView {
  pub exercise: Exercise,
  pub stats: ExerciseStats,
  pub progress: ExerciseProgress,
  /// Initial chart window over the series (empty for list views)
  pub window: ChartWindow,
  pub labels: Vec<String>,
}

/// Everything the exercise detail screen shows, with the chart at its default zoom
pub async fn get_exercise_progress(state: &AppState, name: String) -> Result<ExerciseProgressView, StoreError> {
  let (catalog, history) = tokio::join!(state.db.load_exercise_catalog(), state.db.load_workout_history());
  let exercise = find_exercise(&catalog, &name)?.clone();

  let progress = exercise_progress(&history, &exercise);
  let window = ChartWindow::new(progress.series_len());
  let labels = window.axis_labels(&progress.dates());

  Ok(ExerciseProgressView {
    stats: exercise_stats(&history, &exercise),
    exercise,
    progress,
    window,
    labels,
  })
}
