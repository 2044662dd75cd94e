//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of identifiers (a job id is not a
//! delivery id) and make log fields self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A packaging job identifier.
///
/// Job ids are allocated from a process-wide counter, starting at 1 for the
/// first job of a process lifetime. They are strictly increasing, never
/// reused, and never persisted across restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(n: u64) -> Self {
        JobId(n)
    }
}

/// A GitHub webhook delivery ID, taken from the `x-github-delivery` header.
///
/// Used only for log correlation; the relay does not deduplicate deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(pub String);

impl DeliveryId {
    pub fn new(s: impl Into<String>) -> Self {
        DeliveryId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DeliveryId {
    fn from(s: String) -> Self {
        DeliveryId(s)
    }
}
