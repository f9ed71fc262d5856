pub mod exercise;
pub mod template;
pub mod workout;

pub use exercise::{Exercise, ExerciseCategory, ExerciseType};
pub use template::WorkoutTemplate;
pub use workout::{NewWorkoutDay, Performance, RawRecord, WorkoutDay, WorkoutRecord};
