//! Operations a front end calls, wiring storage to the engines.
//! Each takes the shared `AppState` and returns a serializable result.

pub mod exercises;
pub mod statistics;
pub mod workouts;

use crate::db::StoreError;
use crate::models::Exercise;

/// Look up a catalog entry by name
pub(crate) fn find_exercise<'a>(catalog: &'a [Exercise], name: &str) -> Result<&'a Exercise, StoreError> {
  catalog
    .iter()
    .find(|e| e.name == name)
    .ok_or_else(|| StoreError::NotFound {
      kind: "Exercise",
      name: name.to_string(),
    })
}
