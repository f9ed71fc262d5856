use serde::{Deserialize, Serialize};

/// Muscle group (or cardio) tag used for volume breakdowns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExerciseCategory {
  Chest,
  Back,
  Biceps,
  Triceps,
  Legs,
  Shoulders,
  Abs,
  Cardio,
}

impl ExerciseCategory {
  pub const ALL: [ExerciseCategory; 8] = [
    ExerciseCategory::Chest,
    ExerciseCategory::Back,
    ExerciseCategory::Biceps,
    ExerciseCategory::Triceps,
    ExerciseCategory::Legs,
    ExerciseCategory::Shoulders,
    ExerciseCategory::Abs,
    ExerciseCategory::Cardio,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ExerciseCategory::Chest => "Chest",
      ExerciseCategory::Back => "Back",
      ExerciseCategory::Biceps => "Biceps",
      ExerciseCategory::Triceps => "Triceps",
      ExerciseCategory::Legs => "Legs",
      ExerciseCategory::Shoulders => "Shoulders",
      ExerciseCategory::Abs => "Abs",
      ExerciseCategory::Cardio => "Cardio",
    }
  }
}

impl std::fmt::Display for ExerciseCategory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for ExerciseCategory {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ExerciseCategory::ALL
      .into_iter()
      .find(|c| c.as_str() == s)
      .ok_or_else(|| format!("Unknown exercise category: {}", s))
  }
}

/// How an exercise is measured. Decides which fields a logged set carries
/// and how two sets are compared for a personal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseType {
  /// Weight x repetitions
  Rep,
  /// Held duration in seconds
  Time,
  /// Distance in km over a time in minutes
  Distance,
  /// Bodyweight repetitions, optionally timed
  Calisthenics,
}

impl ExerciseType {
  pub fn as_str(&self) -> &'static str {
    match self {
      ExerciseType::Rep => "Rep",
      ExerciseType::Time => "Time",
      ExerciseType::Distance => "Distance",
      ExerciseType::Calisthenics => "Calisthenics",
    }
  }

  /// Strength-style work (counts toward hypertrophy sessions)
  pub fn is_strength(&self) -> bool {
    matches!(self, ExerciseType::Rep | ExerciseType::Calisthenics)
  }

  /// Endurance-style work (counts toward cardio sessions)
  pub fn is_cardio(&self) -> bool {
    matches!(self, ExerciseType::Distance | ExerciseType::Time)
  }
}

impl std::fmt::Display for ExerciseType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for ExerciseType {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "Rep" => Ok(Self::Rep),
      "Time" => Ok(Self::Time),
      "Distance" => Ok(Self::Distance),
      "Calisthenics" => Ok(Self::Calisthenics),
      _ => Err(format!("Unknown exercise type: {}", s)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
  pub name: String,
  pub category: ExerciseCategory,
  #[serde(rename = "type")]
  pub exercise_type: ExerciseType,
}

impl Exercise {
  pub fn new(name: impl Into<String>, category: ExerciseCategory, exercise_type: ExerciseType) -> Self {
    Self {
      name: name.into(),
      category,
      exercise_type,
    }
  }
}
