//! Scheduled days: "on day N, communicate using link L".
//!
//! Each entry carries a [`Snapshot`] of the link's data taken when the entry
//! was created. The snapshot is a historical copy: later edits to the link,
//! its theme or its journey never rewrite it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result, journey::JourneyId, link::LinkId, rule::RuleId,
  theme::ThemeId,
};

pub type DayId = i64;

/// Day value reserved for the diagram's terminal node. Never a real day.
pub const TERMINAL_DAY: u32 = 99_999;

/// Largest day number accepted for a schedule entry.
pub const MAX_DAY: u32 = TERMINAL_DAY - 1;

/// Link data captured at scheduling time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
  pub theme_id:             ThemeId,
  pub theme_name:           String,
  pub rule_id:              RuleId,
  pub alternative_theme_id: Option<ThemeId>,
  pub journey_id:           Option<JourneyId>,
  pub journey_name:         Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledDay {
  pub day_id:      DayId,
  pub day:         u32,
  pub link_id:     LinkId,
  pub snapshot:    Snapshot,
  /// Server-assigned; when the snapshot was taken.
  pub captured_at: DateTime<Utc>,
}

/// Input to [`crate::store::ScheduleStore::schedule_day`] and
/// [`crate::store::ScheduleStore::update_day`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NewScheduledDay {
  pub day:     u32,
  pub link_id: LinkId,
}

impl NewScheduledDay {
  pub fn new(day: u32, link_id: LinkId) -> Self { Self { day, link_id } }

  pub fn validate(&self) -> Result<()> { validate_day(self.day) }
}

pub fn validate_day(day: u32) -> Result<()> {
  if day > MAX_DAY {
    return Err(Error::DayOutOfRange { day, max: MAX_DAY });
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn terminal_day_is_not_schedulable() {
    assert!(NewScheduledDay::new(0, 1).validate().is_ok());
    assert!(NewScheduledDay::new(MAX_DAY, 1).validate().is_ok());
    assert!(matches!(
      NewScheduledDay::new(TERMINAL_DAY, 1).validate(),
      Err(Error::DayOutOfRange { day: TERMINAL_DAY, .. })
    ));
  }
}
