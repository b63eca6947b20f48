use votings_common::utils::time::DAY_SECS;

/// Share of a closed voting's budget credited to the owner, in percent.
pub const COMMISSION_PERCENT: u128 = 10;

/// Minimum age of a voting before it may be closed.
pub const MATURATION_PERIOD_SECS: u64 = 3 * DAY_SECS;
