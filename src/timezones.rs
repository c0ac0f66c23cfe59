//! Time-datum codes used by the NWIS sample service.
//!
//! qwdata reports sample times in local time together with a short datum
//! code (`sample_start_time_datum_cd`). The table maps each code to a fixed
//! offset from UTC.

use chrono::{FixedOffset, NaiveDateTime};

/// (code, offset east of UTC in minutes)
const TIME_DATUM_OFFSETS: &[(&str, i32)] = &[
    ("UTC", 0),
    ("GMT", 0),
    ("Z", 0),
    ("EST", -5 * 60),
    ("EDT", -4 * 60),
    ("CST", -6 * 60),
    ("CDT", -5 * 60),
    ("MST", -7 * 60),
    ("MDT", -6 * 60),
    ("PST", -8 * 60),
    ("PDT", -7 * 60),
    ("AKST", -9 * 60),
    ("AKDT", -8 * 60),
    ("HST", -10 * 60),
    ("HDT", -9 * 60),
    ("AST", -4 * 60),
    ("ADT", -3 * 60),
    ("NST", -(3 * 60 + 30)),
    ("NDT", -(2 * 60 + 30)),
    ("SST", -11 * 60),
    ("ChST", 10 * 60),
];

/// Resolve a time-datum code to its UTC offset
pub fn offset_for(code: &str) -> Option<FixedOffset> {
    let code = code.trim();
    TIME_DATUM_OFFSETS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .and_then(|(_, minutes)| FixedOffset::east_opt(minutes * 60))
}

/// Convert a local wall-clock time in the given datum to naive UTC
pub fn to_utc(local: NaiveDateTime, code: &str) -> Option<NaiveDateTime> {
    let offset = offset_for(code)?;
    local
        .and_local_timezone(offset)
        .single()
        .map(|dt| dt.naive_utc())
}
