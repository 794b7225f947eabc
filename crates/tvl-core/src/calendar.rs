//! UTC calendar helpers for bucketing unix timestamps.

pub const SECONDS_PER_HOUR: u64 = 60 * 60;
pub const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;
pub const SECONDS_PER_WEEK: u64 = 7 * SECONDS_PER_DAY;

/// Timestamp of 00:00:00 UTC on the day containing `timestamp`.
pub fn start_of_day(timestamp: u64) -> u64 {
    timestamp - timestamp % SECONDS_PER_DAY
}

/// Number of whole UTC days since the epoch.
pub fn day_index(timestamp: u64) -> u64 {
    timestamp / SECONDS_PER_DAY
}

/// Whether two timestamps fall on the same UTC calendar day.
pub fn same_day(a: u64, b: u64) -> bool {
    day_index(a) == day_index(b)
}

/// Current unix time in seconds.
pub fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-15T13:45:10Z
    const TS: u64 = 1_710_510_310;

    #[test]
    fn start_of_day_truncates_to_midnight() {
        assert_eq!(start_of_day(TS), 1_710_460_800);
        assert_eq!(start_of_day(1_710_460_800), 1_710_460_800);
    }

    #[test]
    fn day_boundaries_not_elapsed_seconds() {
        let late = start_of_day(TS) + SECONDS_PER_DAY - 1;
        let early_next = start_of_day(TS) + SECONDS_PER_DAY;
        // One second apart, different days.
        assert!(!same_day(late, early_next));
        // Almost a full day apart, same day.
        assert!(same_day(start_of_day(TS), late));
        assert_eq!(day_index(early_next), day_index(late) + 1);
    }
}
