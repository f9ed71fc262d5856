//! Commands for running and logging workout sessions

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::catalog::{load_templates, CatalogProvider};
use crate::db::{AppState, StoreError};
use crate::history::{self, day_markers, log_by_month, DayFilter, DayMarker, HistoryProvider, MonthGroup};
use crate::models::WorkoutDay;
use crate::personal_records::{completion_message, detect_new_records, PrAnnouncement};
use crate::session::{run_rest_timer, ActiveSession, TimerEvent};

/// Start a session from a stored template
pub async fn start_workout(state: &AppState, template_name: String) -> Result<ActiveSession, StoreError> {
    let template = load_templates(&state.db)
        .await?
        .into_iter()
        .find(|t| t.name == template_name)
        .ok_or_else(|| StoreError::NotFound {
            kind: "Workout",
            name: template_name.clone(),
        })?;

    let (catalog, history) = tokio::join!(state.db.load_exercise_catalog(), state.db.load_workout_history());
    Ok(ActiveSession::start(&template, &catalog, &history, state.config.rest_seconds))
}

/// Run the rest timer for the current slot. Advances the session when the
/// rest elapses; a cancel leaves it on the same slot.
pub async fn rest_between_sets(
    session: &mut ActiveSession,
    cancel: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<TimerEvent>,
) {
    let timer = run_rest_timer(session.rest, cancel, events).await;
    session.rest_finished(timer);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishedWorkout {
    pub saved: WorkoutDay,
    pub new_records: Vec<PrAnnouncement>,
    pub message: String,
}

/// Save the session and report the PRs it set
pub async fn finish_workout(
    state: &AppState,
    session: &ActiveSession,
    date: NaiveDate,
) -> Result<FinishedWorkout, StoreError> {
    let day = session.finish(date);
    if day.records.is_empty() {
        return Err(StoreError::InvalidInput("No completed sets to save".into()));
    }

    let saved = history::save_workout_day(&state.db, &day).await?;

    let (catalog, history) = tokio::join!(state.db.load_exercise_catalog(), state.db.load_workout_history());
    let new_records = detect_new_records(&saved, &history, &catalog);
    let message = completion_message(&new_records);

    tracing::info!(id = saved.id, prs = new_records.len(), "Finished workout");

    Ok(FinishedWorkout {
        saved,
        new_records,
        message,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutLog {
    pub months: Vec<MonthGroup>,
    pub markers: BTreeMap<NaiveDate, DayMarker>,
}

/// History grouped by month for the log screen, plus calendar markers
/// (markers always cover the unfiltered history)
pub async fn get_workout_log(state: &AppState, filter: DayFilter) -> Result<WorkoutLog, StoreError> {
    let history = state.db.load_workout_history().await;
    Ok(WorkoutLog {
        months: log_by_month(&history, filter),
        markers: day_markers(&history),
    })
}

pub async fn delete_workout_day(state: &AppState, id: i64) -> Result<(), StoreError> {
    history::delete_workout_day(&state.db, id).await
}
