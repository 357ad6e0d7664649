//! Strong ETags for generated text.
//!
//! The tag is the hex SHA-256 of the body, so identical diagrams always carry
//! identical tags.

use axum::http::{HeaderMap, header};
use sha2::{Digest, Sha256};

/// Quoted ETag for `body`.
pub fn compute_etag(body: &str) -> String {
  let hash = Sha256::digest(body.as_bytes());
  format!("\"{}\"", hex::encode(hash))
}

/// `true` when `If-None-Match` lists `etag` (or `*`).
pub fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
  headers
    .get_all(header::IF_NONE_MATCH)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .map(|tag| tag.trim().trim_start_matches("W/"))
    .any(|tag| tag == "*" || tag == etag)
}
