//! Exercise catalog and workout templates
//!
//! Both are keyed by name. Templates reference exercises by name only, so
//! deleting an exercise leaves templates and history untouched.

use std::future::Future;

use sqlx::{Row, SqlitePool};

use crate::db::{is_unique_violation, StoreError};
use crate::export::{parse_document, ExportDocument};
use crate::history::{count_workout_days, save_workout_day};
use crate::models::{Exercise, WorkoutTemplate};

/// Bundled starter data: exercise catalog, routines and a few weeks of history
pub const DEFAULT_DOCUMENT: &str = include_str!("../data/defaults.json");

/// ---------------------------------------------------------------------------
/// Catalog Provider
/// ---------------------------------------------------------------------------

/// Source of the exercise catalog.
/// Never fails: a storage error is logged and yields an empty catalog.
pub trait CatalogProvider {
  fn load_exercise_catalog(&self) -> impl Future<Output = Vec<Exercise>> + Send;
}

impl CatalogProvider for SqlitePool {
  async fn load_exercise_catalog(&self) -> Vec<Exercise> {
    match load_exercises(self).await {
      Ok(exercises) => exercises,
      Err(e) => {
        tracing::error!(error = %e, "Failed to load exercise catalog");
        Vec::new()
      }
    }
  }
}

fn require_name(kind: &str, name: &str) -> Result<(), StoreError> {
  if name.trim().is_empty() {
    return Err(StoreError::InvalidInput(format!("{} name must not be empty", kind)));
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Exercises
/// ---------------------------------------------------------------------------

/// Catalog in insertion order. Rows with an unknown category or type are skipped.
pub async fn load_exercises(pool: &SqlitePool) -> Result<Vec<Exercise>, StoreError> {
  let rows = sqlx::query("SELECT name, category, exercise_type FROM exercises ORDER BY rowid")
    .fetch_all(pool)
    .await?;

  let mut exercises = Vec::with_capacity(rows.len());
  for row in rows {
    let name: String = row.get("name");
    let category: String = row.get("category");
    let exercise_type: String = row.get("exercise_type");

    match (category.parse(), exercise_type.parse()) {
      (Ok(category), Ok(exercise_type)) => exercises.push(Exercise {
        name,
        category,
        exercise_type,
      }),
      _ => tracing::debug!(name = %name, category = %category, exercise_type = %exercise_type, "Skipped malformed exercise"),
    }
  }

  Ok(exercises)
}

pub async fn add_exercise(pool: &SqlitePool, exercise: &Exercise) -> Result<(), StoreError> {
  require_name("Exercise", &exercise.name)?;

  sqlx::query("INSERT INTO exercises (name, category, exercise_type) VALUES (?1, ?2, ?3)")
    .bind(&exercise.name)
    .bind(exercise.category.as_str())
    .bind(exercise.exercise_type.as_str())
    .execute(pool)
    .await
    .map_err(|e| {
      if is_unique_violation(&e) {
        StoreError::Duplicate {
          kind: "Exercise",
          name: exercise.name.clone(),
        }
      } else {
        StoreError::Database(e)
      }
    })?;

  tracing::info!(name = %exercise.name, category = %exercise.category, "Added exercise");
  Ok(())
}

/// Insert or replace by name
pub async fn upsert_exercise(pool: &SqlitePool, exercise: &Exercise) -> Result<(), StoreError> {
  require_name("Exercise", &exercise.name)?;

  sqlx::query(
    r#"
    INSERT INTO exercises (name, category, exercise_type)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(name) DO UPDATE SET
      category = excluded.category,
      exercise_type = excluded.exercise_type
    "#,
  )
  .bind(&exercise.name)
  .bind(exercise.category.as_str())
  .bind(exercise.exercise_type.as_str())
  .execute(pool)
  .await?;

  Ok(())
}

pub async fn delete_exercise(pool: &SqlitePool, name: &str) -> Result<(), StoreError> {
  let result = sqlx::query("DELETE FROM exercises WHERE name = ?1")
    .bind(name)
    .execute(pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(StoreError::NotFound {
      kind: "Exercise",
      name: name.to_string(),
    });
  }
  tracing::info!(name = %name, "Deleted exercise");
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Templates
/// ---------------------------------------------------------------------------

pub async fn load_templates(pool: &SqlitePool) -> Result<Vec<WorkoutTemplate>, StoreError> {
  let template_rows = sqlx::query("SELECT id, name FROM workout_templates ORDER BY id")
    .fetch_all(pool)
    .await?;
  let entry_rows = sqlx::query("SELECT template_id, exercise_name FROM template_entries ORDER BY template_id, position")
    .fetch_all(pool)
    .await?;

  let mut templates: Vec<(i64, WorkoutTemplate)> = template_rows
    .into_iter()
    .map(|row| (row.get("id"), WorkoutTemplate::new(row.get::<String, _>("name"), Vec::new())))
    .collect();

  for row in entry_rows {
    let template_id: i64 = row.get("template_id");
    if let Some((_, template)) = templates.iter_mut().find(|(id, _)| *id == template_id) {
      template.exercises.push(row.get("exercise_name"));
    }
  }

  Ok(templates.into_iter().map(|(_, t)| t).collect())
}

async fn template_id(pool: &SqlitePool, name: &str) -> Result<Option<i64>, StoreError> {
  let id = sqlx::query_scalar("SELECT id FROM workout_templates WHERE name = ?1")
    .bind(name)
    .fetch_optional(pool)
    .await?;
  Ok(id)
}

async fn write_entries(
  tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
  template_id: i64,
  exercises: &[String],
) -> Result<(), StoreError> {
  sqlx::query("DELETE FROM template_entries WHERE template_id = ?1")
    .bind(template_id)
    .execute(&mut **tx)
    .await?;

  for (position, exercise_name) in exercises.iter().enumerate() {
    sqlx::query("INSERT INTO template_entries (template_id, position, exercise_name) VALUES (?1, ?2, ?3)")
      .bind(template_id)
      .bind(position as i64)
      .bind(exercise_name)
      .execute(&mut **tx)
      .await?;
  }
  Ok(())
}

pub async fn add_template(pool: &SqlitePool, template: &WorkoutTemplate) -> Result<(), StoreError> {
  require_name("Workout", &template.name)?;
  if template_id(pool, &template.name).await?.is_some() {
    return Err(StoreError::Duplicate {
      kind: "Workout",
      name: template.name.clone(),
    });
  }

  let mut tx = pool.begin().await?;
  let result = sqlx::query("INSERT INTO workout_templates (name) VALUES (?1)")
    .bind(&template.name)
    .execute(&mut *tx)
    .await?;
  write_entries(&mut tx, result.last_insert_rowid(), &template.exercises).await?;
  tx.commit().await?;

  tracing::info!(name = %template.name, sets = template.exercises.len(), "Added workout template");
  Ok(())
}

/// Replace the template called `name` (which may also be renamed)
pub async fn update_template(pool: &SqlitePool, name: &str, template: &WorkoutTemplate) -> Result<(), StoreError> {
  require_name("Workout", &template.name)?;
  let id = template_id(pool, name).await?.ok_or_else(|| StoreError::NotFound {
    kind: "Workout",
    name: name.to_string(),
  })?;

  if template.name != name && template_id(pool, &template.name).await?.is_some() {
    return Err(StoreError::Duplicate {
      kind: "Workout",
      name: template.name.clone(),
    });
  }

  let mut tx = pool.begin().await?;
  sqlx::query("UPDATE workout_templates SET name = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2")
    .bind(&template.name)
    .bind(id)
    .execute(&mut *tx)
    .await?;
  write_entries(&mut tx, id, &template.exercises).await?;
  tx.commit().await?;

  tracing::info!(name = %template.name, "Updated workout template");
  Ok(())
}

/// Insert or replace by name
pub async fn upsert_template(pool: &SqlitePool, template: &WorkoutTemplate) -> Result<(), StoreError> {
  match template_id(pool, &template.name).await? {
    Some(_) => update_template(pool, &template.name, template).await,
    None => add_template(pool, template).await,
  }
}

pub async fn delete_template(pool: &SqlitePool, name: &str) -> Result<(), StoreError> {
  let id = template_id(pool, name).await?.ok_or_else(|| StoreError::NotFound {
    kind: "Workout",
    name: name.to_string(),
  })?;

  let mut tx = pool.begin().await?;
  sqlx::query("DELETE FROM template_entries WHERE template_id = ?1")
    .bind(id)
    .execute(&mut *tx)
    .await?;
  sqlx::query("DELETE FROM workout_templates WHERE id = ?1")
    .bind(id)
    .execute(&mut *tx)
    .await?;
  tx.commit().await?;

  tracing::info!(name = %name, "Deleted workout template");
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Default Seeding
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
  pub exercises: usize,
  pub templates: usize,
  pub workout_days: usize,
}

/// Fill each empty store from the bundled defaults. Stores that already
/// hold data are left alone.
pub async fn seed_defaults(pool: &SqlitePool) -> Result<SeedReport, StoreError> {
  let (defaults, _) = parse_document(DEFAULT_DOCUMENT)?;
  seed_from(pool, &defaults).await
}

pub(crate) async fn seed_from(pool: &SqlitePool, document: &ExportDocument) -> Result<SeedReport, StoreError> {
  let mut report = SeedReport::default();

  if load_exercises(pool).await?.is_empty() {
    for exercise in &document.exercises {
      upsert_exercise(pool, exercise).await?;
    }
    report.exercises = document.exercises.len();
  }

  if load_templates(pool).await?.is_empty() {
    for template in &document.workouts {
      upsert_template(pool, template).await?;
    }
    report.templates = document.workouts.len();
  }

  if count_workout_days(pool).await? == 0 {
    for day in &document.workout_days {
      save_workout_day(pool, day).await?;
    }
    report.workout_days = document.workout_days.len();
  }

  if report != SeedReport::default() {
    tracing::info!(
      exercises = report.exercises,
      templates = report.templates,
      workout_days = report.workout_days,
      "Seeded default data"
    );
  }

  Ok(report)
}
