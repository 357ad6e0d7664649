//! Theme-rule link: pairs one theme with one rule.
//!
//! A link may name another link as its `alternative_id`: "if this rule's
//! condition is not met, fall back to that link". The alternative graph must
//! stay acyclic; see [`crate::chain`].

use serde::{Deserialize, Serialize};

use crate::{rule::RuleId, theme::ThemeId};

pub type LinkId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeRuleLink {
  pub link_id:        LinkId,
  pub theme_id:       ThemeId,
  pub rule_id:        RuleId,
  pub alternative_id: Option<LinkId>,
}

/// Input to [`crate::store::ScheduleStore::create_link`] and
/// [`crate::store::ScheduleStore::update_link`].
///
/// A `None` rule means the default "No Rule" sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLink {
  pub theme_id:       ThemeId,
  #[serde(default)]
  pub rule_id:        Option<RuleId>,
  #[serde(default)]
  pub alternative_id: Option<LinkId>,
}

impl NewLink {
  pub fn new(theme_id: ThemeId, rule_id: RuleId) -> Self {
    Self { theme_id, rule_id: Some(rule_id), alternative_id: None }
  }

  pub fn with_alternative(mut self, alternative_id: LinkId) -> Self {
    self.alternative_id = Some(alternative_id);
    self
  }
}
