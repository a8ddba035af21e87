use chrono::{DateTime, Utc};

/// All instants exchanged between the crates are UTC
pub type UtcTimestamp = DateTime<Utc>;
