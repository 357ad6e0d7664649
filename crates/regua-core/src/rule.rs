//! Rule: a yes/no gating condition, described in free text.
//!
//! One distinguished rule, [`DEFAULT_RULE`], means "no gate": a link using it
//! always delivers its theme. Stores create it lazily and keep it unique.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub type RuleId = i64;

/// Description of the sentinel rule that gates nothing.
pub const DEFAULT_RULE: &str = "No Rule";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
  pub rule_id:     RuleId,
  pub description: String,
}

impl Rule {
  /// Whether this rule is an actual decision rather than the default sentinel.
  pub fn is_gate(&self) -> bool { is_gate(&self.description) }
}

/// A description gates a message unless it is blank or the default sentinel.
pub fn is_gate(description: &str) -> bool {
  let trimmed = description.trim();
  !trimmed.is_empty() && !is_default(trimmed)
}

/// Case-insensitive match against [`DEFAULT_RULE`], ignoring surrounding
/// whitespace.
pub fn is_default(description: &str) -> bool {
  description.trim().eq_ignore_ascii_case(DEFAULT_RULE)
}

/// Input to [`crate::store::ScheduleStore::create_rule`] and
/// [`crate::store::ScheduleStore::update_rule`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRule {
  pub description: String,
}

impl NewRule {
  pub fn new(description: impl Into<String>) -> Self {
    Self { description: description.into() }
  }

  pub fn validate(&self) -> Result<()> {
    if self.description.trim().is_empty() {
      return Err(Error::Validation("rule description must not be blank".into()));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sentinel_and_blank_are_not_gates() {
    assert!(!is_gate("No Rule"));
    assert!(!is_gate("  no rule "));
    assert!(!is_gate(""));
    assert!(!is_gate(" \n"));
    assert!(is_gate("Opened email?"));
  }
}
