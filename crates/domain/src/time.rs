//! Timestamps for `createdAt` / `updatedAt`.

use chrono::{DateTime, SubsecRound, Utc};

/// UTC timestamp stored on every entity.
pub type Timestamp = DateTime<Utc>;

/// Current UTC time, truncated to milliseconds so that values survive a
/// round-trip through JSON and the store unchanged.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(3)
}
