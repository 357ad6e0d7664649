//! Journey: an optional grouping of themes into a customer journey.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub type JourneyId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journey {
  pub journey_id:  JourneyId,
  pub name:        String,
  pub description: Option<String>,
}

/// Input to [`crate::store::ScheduleStore::create_journey`] and
/// [`crate::store::ScheduleStore::update_journey`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJourney {
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
}

impl NewJourney {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), description: None }
  }

  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::Validation("journey name must not be blank".into()));
    }
    Ok(())
  }
}
