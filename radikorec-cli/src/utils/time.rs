use chrono::{DateTime, NaiveDateTime, Utc};

/// Sentinel returned by [`to_unixtime`] for unparseable datetimes.
pub const INVALID_TIME: i64 = -1;

const STAMP_FORMAT: &str = "%Y%m%d%H%M";

/// Parses a "YYYYMMDDHHmm" stamp into epoch seconds (UTC). Returns
/// [`INVALID_TIME`] instead of failing; callers check the sentinel.
pub fn to_unixtime(datetime: &str) -> i64 {
    NaiveDateTime::parse_from_str(datetime, STAMP_FORMAT)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(INVALID_TIME)
}

/// Formats epoch seconds as a "YYYYMMDDHHmm" stamp (UTC). Returns an empty
/// string for out-of-range values; callers check for it.
pub fn to_datetime(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.format(STAMP_FORMAT).to_string())
        .unwrap_or_default()
}
