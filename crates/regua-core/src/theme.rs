//! Theme: a communication subject.
//!
//! Themes may point at another theme as their alternative. That pointer is a
//! plain id, never an owning reference: it is set to `None` when the target is
//! deleted, and traversals over it must tolerate cycles deeper than one hop.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, journey::JourneyId};

pub type ThemeId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
  pub theme_id:             ThemeId,
  pub name:                 String,
  pub description:          Option<String>,
  pub objective:            Option<String>,
  pub journey_id:           Option<JourneyId>,
  pub alternative_theme_id: Option<ThemeId>,
}

/// Input to [`crate::store::ScheduleStore::create_theme`] and
/// [`crate::store::ScheduleStore::update_theme`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTheme {
  pub name:                 String,
  #[serde(default)]
  pub description:          Option<String>,
  #[serde(default)]
  pub objective:            Option<String>,
  #[serde(default)]
  pub journey_id:           Option<JourneyId>,
  #[serde(default)]
  pub alternative_theme_id: Option<ThemeId>,
}

impl NewTheme {
  /// Convenience constructor with all optional fields unset.
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), ..Self::default() }
  }

  /// Field-level checks. `theme_id` is the id being edited, if any.
  pub fn validate(&self, theme_id: Option<ThemeId>) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::Validation("theme name must not be blank".into()));
    }
    if let Some(id) = theme_id
      && self.alternative_theme_id == Some(id)
    {
      return Err(Error::SelfAlternativeTheme(id));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_name_is_rejected() {
    let err = NewTheme::new("   ").validate(None).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn self_alternative_is_rejected_on_edit() {
    let input = NewTheme {
      alternative_theme_id: Some(7),
      ..NewTheme::new("Welcome")
    };
    assert!(input.validate(None).is_ok());
    assert!(matches!(
      input.validate(Some(7)),
      Err(Error::SelfAlternativeTheme(7))
    ));
    assert!(input.validate(Some(8)).is_ok());
  }
}
