use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds in one day.
pub const DAY_SECS: u64 = 24 * 60 * 60;

/// Returns the current UNIX timestamp in seconds.
///
/// The ledger never calls this itself; it is how the command line fills the
/// timestamp of a [`CallContext`](crate::CallContext). A clock set before the
/// epoch reads as zero.
pub fn current_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_time_non_zero() {
        let timestamp = current_time();
        assert!(timestamp > 0, "Timestamp should be greater than zero");
    }

    #[test]
    fn test_current_time_monotonic() {
        let t1 = current_time();
        let t2 = current_time();
        assert!(t2 >= t1, "Second timestamp should be greater than or equal to the first");
    }
}
