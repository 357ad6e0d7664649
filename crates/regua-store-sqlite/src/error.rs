//! Error type for `regua-store-sqlite`.

use regua_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] regua_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored day number that does not fit the domain.
  #[error("invalid stored day value: {0}")]
  InvalidDay(i64),
}

impl StoreError for Error {
  fn as_core(&self) -> Option<&regua_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
