//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for audit fields and deletion markers.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
