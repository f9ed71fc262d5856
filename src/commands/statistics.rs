//! Statistics screen and data transfer commands

use chrono::NaiveDateTime;

use crate::catalog::CatalogProvider;
use crate::db::{AppState, StoreError};
use crate::export::{export_document, import_document, ImportReport};
use crate::history::HistoryProvider;
use crate::statistics::{DateRange, StatisticsSummary};

/// ---------------------------------------------------------------------------
/// Statistics
/// ---------------------------------------------------------------------------

/// Recompute the summary for `range` as seen at `now`.
///
/// Returns None when a newer request finished first; the caller keeps the
/// result it already shows.
pub async fn compute_statistics_at(
  state: &AppState,
  range: DateRange,
  now: NaiveDateTime,
) -> Result<Option<StatisticsSummary>, StoreError> {
  let token = state.statistics_requests.begin();

  let (catalog, history) = tokio::join!(state.db.load_exercise_catalog(), state.db.load_workout_history());
  let summary = StatisticsSummary::compute(range, &history, &catalog, now);

  if state.statistics_requests.try_apply(token) {
    Ok(Some(summary))
  } else {
    tracing::debug!(range = %range, "Discarded stale statistics result");
    Ok(None)
  }
}

pub async fn compute_statistics(state: &AppState, range: DateRange) -> Result<Option<StatisticsSummary>, StoreError> {
  compute_statistics_at(state, range, chrono::Local::now().naive_local()).await
}

/// ---------------------------------------------------------------------------
/// Export / Import
/// ---------------------------------------------------------------------------

/// Every store as one pretty-printed JSON document
pub async fn export_data(state: &AppState) -> Result<String, StoreError> {
  export_document(&state.db).await?.to_json()
}

pub async fn import_data(state: &AppState, json: String) -> Result<ImportReport, StoreError> {
  import_document(&state.db, &json).await
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::AppConfig;
  use crate::models::{ExerciseCategory, WorkoutRecord};
  use crate::statistics::BenchmarkLift;
  use crate::test_utils::*;
  use serial_test::serial;

  async fn test_state() -> AppState {
    let pool = setup_test_db().await;
    seed_test_catalog(&pool).await;
    seed_test_history(
      &pool,
      &[
        mock_new_workout_day(
          "Push day",
          day(2025, 8, 18),
          vec![
            WorkoutRecord::rep("Barbell Bench Press", 74.0, 10),
            WorkoutRecord::rep("Tricep Pushdown", 25.0, 12),
          ],
        ),
        mock_new_workout_day("Running", day(2025, 9, 1), vec![WorkoutRecord::distance("Running", 10.0, 57.49)]),
        mock_new_workout_day("Push day", day(2025, 9, 5), vec![WorkoutRecord::rep("Barbell Bench Press", 80.0, 8)]),
      ],
    )
    .await;
    AppState::new(pool, AppConfig::default())
  }

  fn now() -> NaiveDateTime {
    day(2025, 9, 10).and_hms_opt(18, 30, 0).unwrap()
  }

  #[tokio::test]
  #[serial]
  async fn test_statistics_over_last_30_days() {
    // Arrange
    let state = test_state().await;

    // Act
    let summary = compute_statistics_at(&state, DateRange::Last30Days, now())
      .await
      .unwrap()
      .expect("single request is never stale");

    // Assert
    assert_eq!(summary.hypertrophy_sessions, 2);
    assert_eq!(summary.cardio_sessions, 1);
    assert_eq!(summary.sets, 3);
    crate::assert_approx_eq!(summary.weight_lifted, 740.0 + 300.0 + 640.0, 1e-9);
    crate::assert_approx_eq!(summary.distance_km, 10.0, 1e-9);
    assert_eq!(summary.volume_for(ExerciseCategory::Chest), 2);
    assert_eq!(summary.volume_for(ExerciseCategory::Cardio), 1);

    let delta = summary.progress_for(BenchmarkLift::BenchPress).unwrap();
    crate::assert_approx_eq!(delta, 80.0 * (1.0 + 8.0 / 30.0) - 74.0 * (1.0 + 10.0 / 30.0), 1e-9);
    assert_eq!(summary.progress_for(BenchmarkLift::Squat), None);

    teardown_test_db(state.db).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_stale_statistics_are_discarded() {
    let state = test_state().await;

    // A request that started earlier but finishes after a newer one
    let stale = state.statistics_requests.begin();
    let fresh = compute_statistics_at(&state, DateRange::AllTime, now()).await.unwrap();
    assert!(fresh.is_some());
    assert!(!state.statistics_requests.try_apply(stale));

    teardown_test_db(state.db).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_export_then_import_round_trip() {
    let source = test_state().await;
    let exported = export_data(&source).await.unwrap();

    let target = AppState::new(setup_test_db().await, AppConfig::default());
    let report = import_data(&target, exported).await.unwrap();

    assert_eq!(report.exercises, mock_catalog().len());
    assert_eq!(report.workout_days, 3);
    assert_eq!(report.skipped, 0);

    let summary = compute_statistics_at(&target, DateRange::AllTime, now())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(summary.sets, 3);

    teardown_test_db(source.db).await;
    teardown_test_db(target.db).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_import_rejects_non_document() {
    let state = test_state().await;
    let result = import_data(&state, "not json".into()).await;
    assert!(matches!(result, Err(StoreError::Serialization(_))));
    teardown_test_db(state.db).await;
  }
}
