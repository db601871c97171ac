// src/utils/time.rs

//! Asia/Taipei clock helpers.
//!
//! Taiwan has observed UTC+8 without daylight saving since 1980, so a fixed
//! offset is enough.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

const TAIPEI_OFFSET_SECS: i32 = 8 * 3600;

/// Display format used for every timestamp in the outputs.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The `+08:00` offset.
pub fn taipei_offset() -> FixedOffset {
    FixedOffset::east_opt(TAIPEI_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Current wall-clock time in Taipei.
pub fn taipei_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&taipei_offset())
}

/// Today's date in Taipei.
pub fn taipei_today() -> NaiveDate {
    taipei_now().date_naive()
}

/// Render a timestamp in the output format.
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Serde adapter writing Taipei timestamps as `YYYY-MM-DD HH:MM:SS`.
pub mod taipei_format {
    use chrono::{DateTime, FixedOffset, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::{TIMESTAMP_FORMAT, format_timestamp, taipei_offset};

    pub fn serialize<S: Serializer>(
        ts: &DateTime<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<FixedOffset>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let naive =
            NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(de::Error::custom)?;
        naive
            .and_local_timezone(taipei_offset())
            .single()
            .ok_or_else(|| de::Error::custom(format!("ambiguous local time: {s}")))
    }
}
