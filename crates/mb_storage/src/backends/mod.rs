pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryStorage;

#[cfg(feature = "sqlite")]
pub use sqlite::SQLiteStorage;

use chrono::{DateTime, Duration, Utc};

/// Start of the lookback window ending at `now`.
pub(crate) fn window_start(now: DateTime<Utc>, lookback_hours: u32) -> DateTime<Utc> {
    now - Duration::hours(i64::from(lookback_hours))
}
