//! Active workout session
//!
//! Holds the per-slot inputs of a session started from a template, the
//! values logged for the same slots last time, and the rest timer between
//! sets. The rest timer is a plain state machine driven one second at a time;
//! `run_rest_timer` feeds it from a single tokio interval.

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Duration, Instant};

use crate::models::{Exercise, ExerciseType, NewWorkoutDay, Performance, WorkoutDay, WorkoutRecord, WorkoutTemplate};

pub const DEFAULT_REST_SECONDS: u32 = 120;
/// Step of the +/- rest buttons
pub const REST_ADJUST_STEP: i64 = 30;
/// Remaining seconds at which the countdown cue fires
pub const COUNTDOWN_CUE_AT: u32 = 11;

/// ---------------------------------------------------------------------------
/// Errors
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
  #[error("Value is empty")]
  Empty,
  #[error("Not a number: {0}")]
  NotANumber(String),
  #[error("Value must not be negative: {0}")]
  Negative(String),
  #[error("Not a whole number: {0}")]
  NotWhole(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
  #[error("No slot at index {0}")]
  SlotOutOfRange(usize),
  #[error("Exercise not in catalog: {0}")]
  UnknownExercise(String),
  #[error("{field:?} does not apply to {exercise_type} exercises")]
  FieldNotApplicable { field: InputField, exercise_type: ExerciseType },
  #[error("Invalid input: {0}")]
  Input(#[from] InputError),
}

impl serde::Serialize for SessionError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Input Parsing
/// ---------------------------------------------------------------------------

/// Parse a non-negative decimal quantity typed by the user
pub fn parse_quantity(text: &str) -> Result<f64, InputError> {
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return Err(InputError::Empty);
  }
  let value: f64 = trimmed
    .parse()
    .map_err(|_| InputError::NotANumber(trimmed.to_string()))?;
  if !value.is_finite() {
    return Err(InputError::NotANumber(trimmed.to_string()));
  }
  if value < 0.0 {
    return Err(InputError::Negative(trimmed.to_string()));
  }
  Ok(value)
}

/// Parse a repetition count
pub fn parse_repetitions(text: &str) -> Result<u32, InputError> {
  let value = parse_quantity(text)?;
  if value.fract() != 0.0 || value > u32::MAX as f64 {
    return Err(InputError::NotWhole(text.trim().to_string()));
  }
  Ok(value as u32)
}

/// ---------------------------------------------------------------------------
/// Rest Timer
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TimerState {
  Idle,
  Running { remaining: u32, cued: bool },
  Elapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TimerEvent {
  Tick { remaining: u32 },
  CountdownCue { remaining: u32 },
  Elapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RestTimer {
  /// Configured rest length
  pub seconds: u32,
  pub state: TimerState,
}

impl RestTimer {
  pub fn new(seconds: u32) -> Self {
    Self {
      seconds,
      state: TimerState::Idle,
    }
  }

  pub fn is_running(&self) -> bool {
    matches!(self.state, TimerState::Running { .. })
  }

  /// Seconds left on the display
  pub fn remaining(&self) -> u32 {
    match self.state {
      TimerState::Idle => self.seconds,
      TimerState::Running { remaining, .. } => remaining,
      TimerState::Elapsed => 0,
    }
  }

  /// Change the configured length. Only while idle; never below zero.
  pub fn adjust(&mut self, delta: i64) -> bool {
    if self.state != TimerState::Idle {
      return false;
    }
    self.seconds = (self.seconds as i64).saturating_add(delta).clamp(0, u32::MAX as i64) as u32;
    true
  }

  pub fn start(&mut self) {
    if self.state == TimerState::Idle {
      self.state = TimerState::Running {
        remaining: self.seconds,
        cued: false,
      };
    }
  }

  /// Advance one second. Returns None unless running.
  pub fn tick(&mut self) -> Option<TimerEvent> {
    let TimerState::Running { remaining, cued } = self.state else {
      return None;
    };

    let cue_now = remaining == COUNTDOWN_CUE_AT && !cued;
    let remaining = remaining.saturating_sub(1);

    if remaining == 0 {
      self.state = TimerState::Elapsed;
      return Some(TimerEvent::Elapsed);
    }

    self.state = TimerState::Running {
      remaining,
      cued: cued || cue_now,
    };
    if cue_now {
      Some(TimerEvent::CountdownCue { remaining })
    } else {
      Some(TimerEvent::Tick { remaining })
    }
  }

  /// Back to idle with the configured length
  pub fn cancel(&mut self) {
    self.state = TimerState::Idle;
  }
}

/// Drive `timer` once per second until it elapses or `cancel` fires.
/// Events go to `events`; the final timer is returned (Elapsed, or Idle
/// after a cancel).
pub async fn run_rest_timer(
  mut timer: RestTimer,
  mut cancel: oneshot::Receiver<()>,
  events: mpsc::UnboundedSender<TimerEvent>,
) -> RestTimer {
  let period = Duration::from_secs(1);
  let mut ticker = interval_at(Instant::now() + period, period);
  timer.start();

  while timer.is_running() {
    tokio::select! {
      _ = &mut cancel => {
        tracing::debug!(remaining = timer.remaining(), "Rest timer cancelled");
        timer.cancel();
        break;
      }
      _ = ticker.tick() => {
        if let Some(event) = timer.tick() {
          // Receiver gone means nobody is watching; keep counting anyway
          let _ = events.send(event);
        }
      }
    }
  }

  timer
}

/// ---------------------------------------------------------------------------
/// Active Session
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputField {
  Weight,
  Repetitions,
  Time,
  Distance,
}

impl InputField {
  fn applies_to(&self, exercise_type: ExerciseType) -> bool {
    matches!(
      (self, exercise_type),
      (InputField::Weight, ExerciseType::Rep)
        | (InputField::Repetitions, ExerciseType::Rep)
        | (InputField::Repetitions, ExerciseType::Calisthenics)
        | (InputField::Time, ExerciseType::Time)
        | (InputField::Time, ExerciseType::Distance)
        | (InputField::Distance, ExerciseType::Distance)
    )
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlotInput {
  pub weight: Option<f64>,
  pub repetitions: Option<u32>,
  pub time: Option<f64>,
  pub distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSlot {
  pub exercise_name: String,
  /// None when the exercise is missing from the catalog
  pub exercise_type: Option<ExerciseType>,
  pub input: SlotInput,
  /// Same slot in the last session of this routine
  pub previous: Option<WorkoutRecord>,
}

impl SessionSlot {
  pub fn is_filled(&self) -> bool {
    let input = &self.input;
    match self.exercise_type {
      Some(ExerciseType::Rep) => input.weight.is_some() && input.repetitions.is_some(),
      Some(ExerciseType::Time) => input.time.is_some(),
      Some(ExerciseType::Distance) => input.distance.is_some() && input.time.is_some(),
      Some(ExerciseType::Calisthenics) => input.repetitions.is_some(),
      None => false,
    }
  }

  fn to_record(&self) -> Option<WorkoutRecord> {
    let input = &self.input;
    let performance = match self.exercise_type? {
      ExerciseType::Rep => Performance::Rep {
        weight: input.weight?,
        repetitions: input.repetitions?,
      },
      ExerciseType::Time => Performance::Time { time: input.time? },
      ExerciseType::Distance => Performance::Distance {
        distance: input.distance?,
        time: input.time?,
      },
      ExerciseType::Calisthenics => Performance::Calisthenics {
        repetitions: input.repetitions?,
        time: None,
      },
    };
    Some(WorkoutRecord::new(self.exercise_name.clone(), performance))
  }

  /// "Last: ..." hint text for the previous value
  pub fn previous_hint(&self) -> Option<String> {
    let previous = self.previous.as_ref()?;
    let text = match previous.performance {
      Performance::Rep { weight, repetitions } => format!("{}kg x {}reps", weight, repetitions),
      Performance::Time { time } => format!("{}s", time),
      Performance::Distance { distance, time } => format!("{:.2}km in {}min", distance, time.round()),
      Performance::Calisthenics { repetitions, .. } => format!("{}reps", repetitions),
    };
    Some(format!("Last: {}", text))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveSession {
  pub name: String,
  pub slots: Vec<SessionSlot>,
  pub current: usize,
  pub rest: RestTimer,
  /// Rest length new slots start with; follows the last adjustment
  pub rest_seconds: u32,
}

impl ActiveSession {
  /// Build one slot per template entry and look up last time's values
  pub fn start(template: &WorkoutTemplate, catalog: &[Exercise], history: &[WorkoutDay], rest_seconds: u32) -> Self {
    let previous = previous_values(template, history);

    let slots = template
      .exercises
      .iter()
      .zip(previous)
      .map(|(name, previous)| SessionSlot {
        exercise_name: name.clone(),
        exercise_type: catalog.iter().find(|e| &e.name == name).map(|e| e.exercise_type),
        input: SlotInput::default(),
        previous,
      })
      .collect();

    tracing::debug!(template = %template.name, "Started workout session");

    Self {
      name: template.name.clone(),
      slots,
      current: 0,
      rest: RestTimer::new(rest_seconds),
      rest_seconds,
    }
  }

  fn slot_mut(&mut self, idx: usize) -> Result<&mut SessionSlot, SessionError> {
    self.slots.get_mut(idx).ok_or(SessionError::SlotOutOfRange(idx))
  }

  /// Set one field of a slot from text. Empty text clears the field.
  pub fn set_input(&mut self, idx: usize, field: InputField, text: &str) -> Result<(), SessionError> {
    let slot = self.slot_mut(idx)?;
    let exercise_type = slot
      .exercise_type
      .ok_or_else(|| SessionError::UnknownExercise(slot.exercise_name.clone()))?;
    if !field.applies_to(exercise_type) {
      return Err(SessionError::FieldNotApplicable { field, exercise_type });
    }

    let clear = text.trim().is_empty();
    let input = &mut slot.input;
    match field {
      InputField::Weight => input.weight = if clear { None } else { Some(parse_quantity(text)?) },
      InputField::Repetitions => {
        input.repetitions = if clear { None } else { Some(parse_repetitions(text)?) }
      }
      InputField::Time => input.time = if clear { None } else { Some(parse_quantity(text)?) },
      InputField::Distance => input.distance = if clear { None } else { Some(parse_quantity(text)?) },
    }
    Ok(())
  }

  pub fn is_filled(&self, idx: usize) -> bool {
    self.slots.get(idx).is_some_and(|s| s.is_filled())
  }

  /// Drop a slot. The current index follows the slot it pointed at, or
  /// stays put (clamped) when the current slot itself is removed.
  pub fn remove_slot(&mut self, idx: usize) -> Result<SessionSlot, SessionError> {
    if idx >= self.slots.len() {
      return Err(SessionError::SlotOutOfRange(idx));
    }
    let removed = self.slots.remove(idx);

    if self.current > idx {
      self.current -= 1;
    } else if self.current == idx {
      self.current = self.current.min(self.slots.len().saturating_sub(1));
      self.rest.cancel();
    }
    Ok(removed)
  }

  /// Move to the next slot (bounded at the last) with a fresh rest timer
  pub fn advance(&mut self) {
    self.current = (self.current + 1).min(self.slots.len().saturating_sub(1));
    self.rest = RestTimer::new(self.rest_seconds);
  }

  /// Adjust the rest length of the current slot; becomes the default for
  /// the following slots too
  pub fn adjust_rest(&mut self, delta: i64) -> bool {
    let adjusted = self.rest.adjust(delta);
    if adjusted {
      self.rest_seconds = self.rest.seconds;
    }
    adjusted
  }

  /// Record the outcome of a finished timer run
  pub fn rest_finished(&mut self, timer: RestTimer) {
    self.rest = timer;
    if timer.state == TimerState::Elapsed {
      self.advance();
    }
  }

  /// The session as it will be stored: one record per filled slot
  pub fn finish(&self, date: NaiveDate) -> NewWorkoutDay {
    NewWorkoutDay {
      name: self.name.clone(),
      date,
      records: self.slots.iter().filter_map(|s| s.to_record()).collect(),
    }
  }
}

/// Last session's value for each template slot: the nth occurrence of the
/// exercise in the most recent session sharing the template's name
pub fn previous_values(template: &WorkoutTemplate, history: &[WorkoutDay]) -> Vec<Option<WorkoutRecord>> {
  let latest = history
    .iter()
    .filter(|w| w.name == template.name)
    .max_by_key(|w| w.date);

  let Some(latest) = latest else {
    return vec![None; template.exercises.len()];
  };

  let mut seen: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
  template
    .exercises
    .iter()
    .map(|name| {
      let nth = seen.entry(name.as_str()).or_insert(0);
      let record = latest.records_for(name).nth(*nth).cloned();
      *nth += 1;
      record
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{day, mock_catalog, mock_workout_day};

  fn push_template() -> WorkoutTemplate {
    WorkoutTemplate::from_set_counts("Push day", &[("Barbell Bench Press", 2), ("Tricep Pushdown", 1), ("Plank", 1)])
  }

  #[test]
  fn test_parse_quantity() {
    assert_eq!(parse_quantity(" 72.5 "), Ok(72.5));
    assert_eq!(parse_quantity("0"), Ok(0.0));
    assert_eq!(parse_quantity(""), Err(InputError::Empty));
    assert!(matches!(parse_quantity("abc"), Err(InputError::NotANumber(_))));
    assert!(matches!(parse_quantity("NaN"), Err(InputError::NotANumber(_))));
    assert!(matches!(parse_quantity("-5"), Err(InputError::Negative(_))));
  }

  #[test]
  fn test_parse_repetitions_requires_whole_number() {
    assert_eq!(parse_repetitions("10"), Ok(10));
    assert!(matches!(parse_repetitions("8.5"), Err(InputError::NotWhole(_))));
  }

  #[test]
  fn test_timer_counts_down_with_single_cue() {
    // Arrange
    let mut timer = RestTimer::new(13);
    timer.start();

    // Act
    let events: Vec<TimerEvent> = std::iter::from_fn(|| timer.tick()).collect();

    // Assert
    assert_eq!(events.len(), 13);
    assert_eq!(events[0], TimerEvent::Tick { remaining: 12 });
    assert_eq!(events[1], TimerEvent::Tick { remaining: 11 });
    assert_eq!(events[2], TimerEvent::CountdownCue { remaining: 10 });
    assert_eq!(events.iter().filter(|e| matches!(e, TimerEvent::CountdownCue { .. })).count(), 1);
    assert_eq!(events.last(), Some(&TimerEvent::Elapsed));
    assert_eq!(timer.state, TimerState::Elapsed);
  }

  #[test]
  fn test_short_timer_never_cues() {
    let mut timer = RestTimer::new(5);
    timer.start();
    let events: Vec<TimerEvent> = std::iter::from_fn(|| timer.tick()).collect();
    assert!(!events.iter().any(|e| matches!(e, TimerEvent::CountdownCue { .. })));
  }

  #[test]
  fn test_timer_adjust_only_when_idle() {
    let mut timer = RestTimer::new(DEFAULT_REST_SECONDS);
    assert!(timer.adjust(REST_ADJUST_STEP));
    assert_eq!(timer.seconds, 150);
    assert!(timer.adjust(-1000));
    assert_eq!(timer.seconds, 0);

    timer.adjust(60);
    timer.start();
    assert!(!timer.adjust(REST_ADJUST_STEP));
    assert_eq!(timer.remaining(), 60);

    timer.cancel();
    assert_eq!(timer.state, TimerState::Idle);
    assert_eq!(timer.remaining(), 60);
  }

  #[test]
  fn test_timer_adjust_saturates_on_extreme_deltas() {
    let mut timer = RestTimer::new(DEFAULT_REST_SECONDS);
    assert!(timer.adjust(i64::MAX));
    assert_eq!(timer.seconds, u32::MAX);
    assert!(timer.adjust(i64::MIN));
    assert_eq!(timer.seconds, 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_run_rest_timer_elapses() {
    let (_cancel_tx, cancel_rx) = oneshot::channel();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    let timer = run_rest_timer(RestTimer::new(12), cancel_rx, events_tx).await;

    assert_eq!(timer.state, TimerState::Elapsed);
    let mut events = Vec::new();
    while let Ok(event) = events_rx.try_recv() {
      events.push(event);
    }
    assert_eq!(events.len(), 12);
    assert_eq!(events[1], TimerEvent::CountdownCue { remaining: 10 });
    assert_eq!(events.last(), Some(&TimerEvent::Elapsed));
  }

  #[tokio::test(start_paused = true)]
  async fn test_run_rest_timer_cancel_stops_early() {
    let (cancel_tx, cancel_rx) = oneshot::channel();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(run_rest_timer(RestTimer::new(120), cancel_rx, events_tx));
    tokio::time::sleep(Duration::from_millis(3500)).await;
    cancel_tx.send(()).unwrap();
    let timer = handle.await.unwrap();

    assert_eq!(timer.state, TimerState::Idle);
    assert_eq!(timer.seconds, 120);
    let mut ticks = 0;
    while events_rx.try_recv().is_ok() {
      ticks += 1;
    }
    assert_eq!(ticks, 3);
  }

  #[test]
  fn test_start_resolves_types_and_previous_values() {
    // Arrange
    let history = vec![
      mock_workout_day(
        1,
        "Push day",
        day(2025, 8, 18),
        vec![
          WorkoutRecord::rep("Barbell Bench Press", 70.0, 9),
          WorkoutRecord::rep("Barbell Bench Press", 70.0, 8),
        ],
      ),
      mock_workout_day(
        2,
        "Push day",
        day(2025, 8, 25),
        vec![
          WorkoutRecord::rep("Barbell Bench Press", 80.0, 6),
          WorkoutRecord::rep("Tricep Pushdown", 30.0, 12),
          WorkoutRecord::rep("Barbell Bench Press", 75.0, 8),
        ],
      ),
      mock_workout_day(3, "Leg day", day(2025, 8, 27), vec![WorkoutRecord::rep("Barbell Squat", 100.0, 5)]),
    ];
    let mut template = push_template();
    template.exercises.push("Zercher Squat".into());

    // Act
    let session = ActiveSession::start(&template, &mock_catalog(), &history, DEFAULT_REST_SECONDS);

    // Assert
    assert_eq!(session.slots.len(), 5);
    assert_eq!(session.slots[0].previous, Some(WorkoutRecord::rep("Barbell Bench Press", 80.0, 6)));
    assert_eq!(session.slots[1].previous, Some(WorkoutRecord::rep("Barbell Bench Press", 75.0, 8)));
    assert_eq!(session.slots[2].previous_hint().as_deref(), Some("Last: 30kg x 12reps"));
    assert_eq!(session.slots[3].previous, None);
    assert_eq!(session.slots[3].exercise_type, Some(ExerciseType::Time));
    assert_eq!(session.slots[4].exercise_type, None);
  }

  #[test]
  fn test_inputs_fill_slots_and_finish() {
    let mut session = ActiveSession::start(&push_template(), &mock_catalog(), &[], DEFAULT_REST_SECONDS);

    session.set_input(0, InputField::Weight, "85").unwrap();
    assert!(!session.is_filled(0));
    session.set_input(0, InputField::Repetitions, "5").unwrap();
    assert!(session.is_filled(0));
    session.set_input(3, InputField::Time, "90").unwrap();

    assert!(matches!(
      session.set_input(3, InputField::Weight, "10"),
      Err(SessionError::FieldNotApplicable { .. })
    ));
    assert!(matches!(
      session.set_input(1, InputField::Weight, "heavy"),
      Err(SessionError::Input(InputError::NotANumber(_)))
    ));
    assert_eq!(session.set_input(9, InputField::Weight, "1"), Err(SessionError::SlotOutOfRange(9)));

    let finished = session.finish(day(2025, 9, 1));
    assert_eq!(finished.name, "Push day");
    assert_eq!(
      finished.records,
      vec![WorkoutRecord::rep("Barbell Bench Press", 85.0, 5), WorkoutRecord::time("Plank", 90.0)]
    );
  }

  #[test]
  fn test_clearing_input_unfills_slot() {
    let mut session = ActiveSession::start(&push_template(), &mock_catalog(), &[], DEFAULT_REST_SECONDS);
    session.set_input(3, InputField::Time, "60").unwrap();
    session.set_input(3, InputField::Time, "  ").unwrap();
    assert!(!session.is_filled(3));
  }

  #[test]
  fn test_remove_slot_adjusts_current() {
    let mut session = ActiveSession::start(&push_template(), &mock_catalog(), &[], DEFAULT_REST_SECONDS);

    // Removing before the current slot shifts it down
    session.current = 2;
    session.remove_slot(0).unwrap();
    assert_eq!(session.current, 1);

    // Removing the current last slot clamps
    session.current = 2;
    session.remove_slot(2).unwrap();
    assert_eq!(session.current, 1);

    // Removing after the current slot leaves it alone
    session.current = 0;
    session.remove_slot(1).unwrap();
    assert_eq!(session.current, 0);
    assert_eq!(session.slots.len(), 1);

    assert_eq!(session.remove_slot(5).unwrap_err(), SessionError::SlotOutOfRange(5));
  }

  #[test]
  fn test_elapsed_rest_advances_and_keeps_adjusted_length() {
    let mut session = ActiveSession::start(&push_template(), &mock_catalog(), &[], DEFAULT_REST_SECONDS);
    assert!(session.adjust_rest(-REST_ADJUST_STEP));

    let mut timer = session.rest;
    timer.start();
    while timer.tick().is_some() {}
    session.rest_finished(timer);

    assert_eq!(session.current, 1);
    assert_eq!(session.rest, RestTimer::new(90));

    for _ in 0..10 {
      session.advance();
    }
    assert_eq!(session.current, 3);
  }
}
