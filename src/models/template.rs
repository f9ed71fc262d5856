use serde::{Deserialize, Serialize};

/// A reusable routine. Each entry is one set; repeating a name repeats the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutTemplate {
  pub name: String,
  pub exercises: Vec<String>,
}

impl WorkoutTemplate {
  pub fn new(name: impl Into<String>, exercises: Vec<String>) -> Self {
    Self {
      name: name.into(),
      exercises,
    }
  }

  /// Build a template from (exercise, set count) pairs, the way the
  /// routine builder collects them
  pub fn from_set_counts(name: impl Into<String>, sets: &[(&str, usize)]) -> Self {
    let exercises = sets
      .iter()
      .flat_map(|(exercise, count)| std::iter::repeat(exercise.to_string()).take(*count))
      .collect();
    Self::new(name, exercises)
  }

  /// Collapse consecutive repeats back into (exercise, set count) pairs
  pub fn set_counts(&self) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for exercise in &self.exercises {
      match counts.last_mut() {
        Some((name, count)) if name == exercise => *count += 1,
        _ => counts.push((exercise.clone(), 1)),
      }
    }
    counts
  }
}
