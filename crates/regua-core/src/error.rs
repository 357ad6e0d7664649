//! Error types for `regua-core`.

use thiserror::Error;

use crate::{
  journey::JourneyId, link::LinkId, rule::RuleId, schedule::DayId,
  theme::ThemeId,
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("journey not found: {0}")]
  JourneyNotFound(JourneyId),

  #[error("theme not found: {0}")]
  ThemeNotFound(ThemeId),

  #[error("rule not found: {0}")]
  RuleNotFound(RuleId),

  #[error("theme-rule link not found: {0}")]
  LinkNotFound(LinkId),

  #[error("scheduled day not found: {0}")]
  DayNotFound(DayId),

  #[error(
    "setting the alternative of link {link_id} to link {alternative_id} would \
     create a cycle"
  )]
  AlternativeCycle {
    link_id:        LinkId,
    alternative_id: LinkId,
  },

  #[error("theme {0} cannot be its own alternative")]
  SelfAlternativeTheme(ThemeId),

  #[error("day {day} is out of range (0..={max})")]
  DayOutOfRange { day: u32, max: u32 },

  #[error("the default rule already exists")]
  DuplicateDefaultRule,

  #[error("invalid input: {0}")]
  Validation(String),
}

impl Error {
  /// `true` for the lookup-by-id failures.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::JourneyNotFound(_)
        | Self::ThemeNotFound(_)
        | Self::RuleNotFound(_)
        | Self::LinkNotFound(_)
        | Self::DayNotFound(_)
    )
  }

  /// `true` when the write conflicts with existing data.
  pub fn is_conflict(&self) -> bool {
    matches!(
      self,
      Self::AlternativeCycle { .. } | Self::DuplicateDefaultRule
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
