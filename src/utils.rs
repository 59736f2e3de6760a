//! Small helpers shared across modules.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in whole milliseconds since the Unix epoch.
///
/// Used where a monotonically-irrelevant, human-inspectable timestamp is
/// needed outside of the `chrono::Utc::now()` paths used for wire types.
pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_millis() as u64
}
