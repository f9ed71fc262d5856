use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::exercise::ExerciseType;

/// What was done in one logged set. The variant is the exercise type, so a
/// set can only carry the fields its type measures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "exerciseType")]
pub enum Performance {
  /// Weight in kg and repetitions
  Rep { weight: f64, repetitions: u32 },
  /// Duration in seconds
  Time { time: f64 },
  /// Distance in km and time in minutes
  Distance { distance: f64, time: f64 },
  /// Repetitions with an optional time
  Calisthenics {
    repetitions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time: Option<f64>,
  },
}

impl Performance {
  pub fn exercise_type(&self) -> ExerciseType {
    match self {
      Performance::Rep { .. } => ExerciseType::Rep,
      Performance::Time { .. } => ExerciseType::Time,
      Performance::Distance { .. } => ExerciseType::Distance,
      Performance::Calisthenics { .. } => ExerciseType::Calisthenics,
    }
  }

  /// A set counts toward records and charts only when its primary quantity
  /// is positive. An empty set (0 reps, 0 km) is a valid entry but never a PR.
  pub fn is_qualifying(&self) -> bool {
    match *self {
      Performance::Rep { weight, repetitions } => weight > 0.0 && repetitions > 0,
      Performance::Time { time } => time > 0.0,
      Performance::Distance { distance, time } => distance > 0.0 && time > 0.0,
      Performance::Calisthenics { repetitions, .. } => repetitions > 0,
    }
  }
}

/// One logged set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
  pub exercise_name: String,
  #[serde(flatten)]
  pub performance: Performance,
}

impl WorkoutRecord {
  pub fn new(exercise_name: impl Into<String>, performance: Performance) -> Self {
    Self {
      exercise_name: exercise_name.into(),
      performance,
    }
  }

  pub fn rep(exercise_name: impl Into<String>, weight: f64, repetitions: u32) -> Self {
    Self::new(exercise_name, Performance::Rep { weight, repetitions })
  }

  pub fn time(exercise_name: impl Into<String>, seconds: f64) -> Self {
    Self::new(exercise_name, Performance::Time { time: seconds })
  }

  pub fn distance(exercise_name: impl Into<String>, km: f64, minutes: f64) -> Self {
    Self::new(exercise_name, Performance::Distance { distance: km, time: minutes })
  }

  pub fn calisthenics(exercise_name: impl Into<String>, repetitions: u32, time: Option<f64>) -> Self {
    Self::new(exercise_name, Performance::Calisthenics { repetitions, time })
  }

  pub fn exercise_type(&self) -> ExerciseType {
    self.performance.exercise_type()
  }
}

/// Flat record shape used by storage rows and imported documents.
/// Any combination of fields may be present here; only well-formed
/// records make it into the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
  pub exercise_name: String,
  pub exercise_type: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub weight: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub repetitions: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub time: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub distance: Option<f64>,
}

fn quantity(value: Option<f64>) -> Option<f64> {
  value.filter(|v| v.is_finite() && *v >= 0.0)
}

impl RawRecord {
  /// Convert to a typed record. Returns None when the type tag is unknown
  /// or a field the type requires is missing or negative.
  pub fn into_record(self) -> Option<WorkoutRecord> {
    let exercise_type: ExerciseType = self.exercise_type.parse().ok()?;
    let performance = match exercise_type {
      ExerciseType::Rep => Performance::Rep {
        weight: quantity(self.weight)?,
        repetitions: self.repetitions?,
      },
      ExerciseType::Time => Performance::Time {
        time: quantity(self.time)?,
      },
      ExerciseType::Distance => Performance::Distance {
        distance: quantity(self.distance)?,
        time: quantity(self.time)?,
      },
      ExerciseType::Calisthenics => Performance::Calisthenics {
        repetitions: self.repetitions?,
        time: quantity(self.time),
      },
    };

    Some(WorkoutRecord {
      exercise_name: self.exercise_name,
      performance,
    })
  }
}

impl From<&WorkoutRecord> for RawRecord {
  fn from(record: &WorkoutRecord) -> Self {
    let mut raw = RawRecord {
      exercise_name: record.exercise_name.clone(),
      exercise_type: record.exercise_type().to_string(),
      ..Default::default()
    };
    match record.performance {
      Performance::Rep { weight, repetitions } => {
        raw.weight = Some(weight);
        raw.repetitions = Some(repetitions);
      }
      Performance::Time { time } => raw.time = Some(time),
      Performance::Distance { distance, time } => {
        raw.distance = Some(distance);
        raw.time = Some(time);
      }
      Performance::Calisthenics { repetitions, time } => {
        raw.repetitions = Some(repetitions);
        raw.time = time;
      }
    }
    raw
  }
}

/// A logged session as stored. `id` is the session identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDay {
  pub id: i64,
  pub name: String,
  pub date: NaiveDate,
  #[serde(rename = "exercises")]
  pub records: Vec<WorkoutRecord>,
}

impl WorkoutDay {
  /// Records logged against the given exercise name, in logged order
  pub fn records_for<'a>(&'a self, exercise_name: &'a str) -> impl Iterator<Item = &'a WorkoutRecord> + 'a {
    self.records.iter().filter(move |r| r.exercise_name == exercise_name)
  }

  pub fn has_strength_work(&self) -> bool {
    self.records.iter().any(|r| r.exercise_type().is_strength())
  }

  pub fn has_cardio_work(&self) -> bool {
    self.records.iter().any(|r| r.exercise_type().is_cardio())
  }
}

/// For inserting new sessions (without id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkoutDay {
  pub name: String,
  pub date: NaiveDate,
  #[serde(rename = "exercises")]
  pub records: Vec<WorkoutRecord>,
}

impl NewWorkoutDay {
  pub fn with_id(self, id: i64) -> WorkoutDay {
    WorkoutDay {
      id,
      name: self.name,
      date: self.date,
      records: self.records,
    }
  }
}
