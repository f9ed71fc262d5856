//! Zoom/pan window over a date-ordered progress series
//!
//! Five zoom stages, from a year overview down to a single week. The window
//! is a half-open index range `[start, end)` into the series and always
//! satisfies `start <= end <= len`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Zoom Stages
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
  /// e.g. "Aug 25"
  MonthYear,
  /// e.g. "Aug 18"
  MonthDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomStage {
  pub days: usize,
  pub pan: usize,
  pub labels: LabelStyle,
}

const STAGES: [ZoomStage; 5] = [
  ZoomStage { days: 365, pan: 100, labels: LabelStyle::MonthYear },
  ZoomStage { days: 100, pan: 20, labels: LabelStyle::MonthYear },
  ZoomStage { days: 30, pan: 10, labels: LabelStyle::MonthDay },
  ZoomStage { days: 15, pan: 5, labels: LabelStyle::MonthDay },
  ZoomStage { days: 7, pan: 2, labels: LabelStyle::MonthDay },
];

pub const MIN_STAGE: u8 = 1;
pub const MAX_STAGE: u8 = 5;
pub const DEFAULT_STAGE: u8 = 3;

/// Look up a stage by its 1-based number
pub fn zoom_stage(stage: u8) -> ZoomStage {
  STAGES[(stage.clamp(MIN_STAGE, MAX_STAGE) - 1) as usize]
}

/// ---------------------------------------------------------------------------
/// Chart Window
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartWindow {
  pub stage: u8,
  pub start: usize,
  pub end: usize,
  pub len: usize,
}

impl ChartWindow {
  /// Stage 3, showing the most recent 30 points
  pub fn new(len: usize) -> Self {
    let days = zoom_stage(DEFAULT_STAGE).days;
    Self {
      stage: DEFAULT_STAGE,
      start: len.saturating_sub(days),
      end: len,
      len,
    }
  }

  pub fn zoom_stage(&self) -> ZoomStage {
    zoom_stage(self.stage)
  }

  /// Move one stage toward the week view. No-op at the last stage.
  pub fn zoom_in(&mut self) {
    if self.stage < MAX_STAGE {
      self.stage += 1;
      self.recenter();
    }
  }

  /// Move one stage toward the year view. No-op at the first stage.
  pub fn zoom_out(&mut self) {
    if self.stage > MIN_STAGE {
      self.stage -= 1;
      self.recenter();
    }
  }

  pub fn pan_left(&mut self) {
    let ZoomStage { days, pan, .. } = self.zoom_stage();
    self.start = self.start.saturating_sub(pan);
    self.end = self.start + days;
    self.clamp();
  }

  pub fn pan_right(&mut self) {
    let ZoomStage { days, pan, .. } = self.zoom_stage();
    self.end = (self.end + pan).min(self.len);
    match self.end.checked_sub(days) {
      Some(start) => self.start = start,
      None => {
        self.start = 0;
        self.end = days;
      }
    }
    self.clamp();
  }

  /// Index range of the visible points
  pub fn range(&self) -> std::ops::Range<usize> {
    self.start..self.end
  }

  /// Slice the visible part of a series of `len` points
  pub fn visible<'a, T>(&self, series: &'a [T]) -> &'a [T] {
    let end = self.end.min(series.len());
    &series[self.start.min(end)..end]
  }

  /// One label per visible date: the first, middle and last are formatted
  /// for the current stage, the rest are empty.
  pub fn axis_labels(&self, dates: &[NaiveDate]) -> Vec<String> {
    let visible = self.visible(dates);
    let n = visible.len();
    let style = self.zoom_stage().labels;

    visible
      .iter()
      .enumerate()
      .map(|(i, date)| {
        if i == 0 || i == n / 2 || i + 1 == n {
          format_label(*date, style)
        } else {
          String::new()
        }
      })
      .collect()
  }

  fn recenter(&mut self) {
    let days = self.zoom_stage().days;
    let center = (self.start + self.end) / 2;
    self.start = center.saturating_sub(days / 2);
    self.end = self.start + days;
    self.clamp();
  }

  fn clamp(&mut self) {
    let days = self.zoom_stage().days;
    if self.end > self.len {
      self.end = self.len;
      self.start = self.end.saturating_sub(days);
    }
    self.start = self.start.min(self.end);
  }
}

fn format_label(date: NaiveDate, style: LabelStyle) -> String {
  match style {
    LabelStyle::MonthYear => date.format("%b %y").to_string(),
    LabelStyle::MonthDay => date.format("%b %-d").to_string(),
  }
}
