//! Encoding and decoding helpers between Rust domain types and SQLite rows.
//!
//! Ids are SQLite integer primary keys. Timestamps are stored as RFC 3339
//! strings. Row mappers expect the column order of the `*_COLUMNS` constants
//! in [`crate::schema`].

use chrono::{DateTime, Utc};
use regua_core::{
  journey::Journey,
  link::ThemeRuleLink,
  rule::Rule,
  schedule::{ScheduledDay, Snapshot},
  theme::Theme,
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row mappers ─────────────────────────────────────────────────────────────

pub fn journey_from_row(row: &Row<'_>) -> rusqlite::Result<Journey> {
  Ok(Journey {
    journey_id:  row.get(0)?,
    name:        row.get(1)?,
    description: row.get(2)?,
  })
}

pub fn theme_from_row(row: &Row<'_>) -> rusqlite::Result<Theme> {
  Ok(Theme {
    theme_id:             row.get(0)?,
    name:                 row.get(1)?,
    description:          row.get(2)?,
    objective:            row.get(3)?,
    journey_id:           row.get(4)?,
    alternative_theme_id: row.get(5)?,
  })
}

pub fn rule_from_row(row: &Row<'_>) -> rusqlite::Result<Rule> {
  Ok(Rule { rule_id: row.get(0)?, description: row.get(1)? })
}

pub fn link_from_row(row: &Row<'_>) -> rusqlite::Result<ThemeRuleLink> {
  Ok(ThemeRuleLink {
    link_id:        row.get(0)?,
    theme_id:       row.get(1)?,
    rule_id:        row.get(2)?,
    alternative_id: row.get(3)?,
  })
}

/// Raw values read directly from a `scheduled_days` row.
pub struct RawScheduledDay {
  pub day_id:               i64,
  pub day:                  i64,
  pub link_id:              i64,
  // snapshot columns
  pub theme_id:             i64,
  pub theme_name:           String,
  pub rule_id:              i64,
  pub alternative_theme_id: Option<i64>,
  pub journey_id:           Option<i64>,
  pub journey_name:         Option<String>,
  pub captured_at:          String,
}

impl RawScheduledDay {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      day_id:               row.get(0)?,
      day:                  row.get(1)?,
      link_id:              row.get(2)?,
      theme_id:             row.get(3)?,
      theme_name:           row.get(4)?,
      rule_id:              row.get(5)?,
      alternative_theme_id: row.get(6)?,
      journey_id:           row.get(7)?,
      journey_name:         row.get(8)?,
      captured_at:          row.get(9)?,
    })
  }

  pub fn into_day(self) -> Result<ScheduledDay> {
    let day = u32::try_from(self.day).map_err(|_| Error::InvalidDay(self.day))?;
    Ok(ScheduledDay {
      day_id: self.day_id,
      day,
      link_id: self.link_id,
      snapshot: Snapshot {
        theme_id:             self.theme_id,
        theme_name:           self.theme_name,
        rule_id:              self.rule_id,
        alternative_theme_id: self.alternative_theme_id,
        journey_id:           self.journey_id,
        journey_name:         self.journey_name,
      },
      captured_at: decode_dt(&self.captured_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn datetime_roundtrip_keeps_utc() {
    let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    assert_eq!(decode_dt(&encode_dt(dt)).unwrap(), dt);
  }

  #[test]
  fn empty_timestamp_is_a_parse_error() {
    assert!(matches!(decode_dt(""), Err(Error::DateParse(_))));
  }
}
