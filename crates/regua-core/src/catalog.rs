//! [`Catalog`]: an eagerly loaded, id-indexed copy of every entity.
//!
//! Stores build one per diagram request so the resolver and the synthesizer
//! never go back to the database per node. All cross-references stay plain
//! ids looked up through the maps below.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
  chain::LinkLookup,
  journey::{Journey, JourneyId},
  link::{LinkId, ThemeRuleLink},
  rule::{Rule, RuleId},
  schedule::ScheduledDay,
  theme::{Theme, ThemeId},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
  pub journeys: BTreeMap<JourneyId, Journey>,
  pub themes:   BTreeMap<ThemeId, Theme>,
  pub rules:    BTreeMap<RuleId, Rule>,
  pub links:    BTreeMap<LinkId, ThemeRuleLink>,
  /// Ordered by `(day, day_id)`.
  pub days:     Vec<ScheduledDay>,
}

impl Catalog {
  /// Index the given rows. Days are sorted by `(day, day_id)`.
  pub fn from_parts(
    journeys: Vec<Journey>,
    themes: Vec<Theme>,
    rules: Vec<Rule>,
    links: Vec<ThemeRuleLink>,
    mut days: Vec<ScheduledDay>,
  ) -> Self {
    days.sort_by_key(|d| (d.day, d.day_id));
    Self {
      journeys: journeys.into_iter().map(|j| (j.journey_id, j)).collect(),
      themes:   themes.into_iter().map(|t| (t.theme_id, t)).collect(),
      rules:    rules.into_iter().map(|r| (r.rule_id, r)).collect(),
      links:    links.into_iter().map(|l| (l.link_id, l)).collect(),
      days,
    }
  }

  pub fn theme(&self, id: ThemeId) -> Option<&Theme> { self.themes.get(&id) }

  pub fn rule(&self, id: RuleId) -> Option<&Rule> { self.rules.get(&id) }

  pub fn journey(&self, id: JourneyId) -> Option<&Journey> {
    self.journeys.get(&id)
  }
}

impl LinkLookup for Catalog {
  fn link(&self, id: LinkId) -> Option<&ThemeRuleLink> { self.links.get(&id) }
}
