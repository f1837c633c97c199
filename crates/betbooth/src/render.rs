use alloy::primitives::U256;
use chrono::DateTime;

/// Render a unix-seconds deadline for chat output. Timestamps that do not
/// fit a calendar date (past year 262143 or oversized on-chain values) fall
/// back to the raw second count.
pub fn fmt_deadline(seconds: U256) -> String {
    let secs: Result<i64, _> = seconds.try_into();
    match secs.ok().and_then(|s| DateTime::from_timestamp(s, 0)) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("{seconds} (unix seconds)"),
    }
}

pub fn yes_no(v: bool) -> &'static str {
    if v {
        "Yes"
    } else {
        "No"
    }
}
