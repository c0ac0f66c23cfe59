//! Water-quality sample pre-shaping
//!
//! qwdata rows carry a local date, a local time and a time-datum code in
//! three separate columns. They are folded into a single UTC `datetime`.

use crate::constants::columns::{DATETIME, SAMPLE_DATE, SAMPLE_TIME, SAMPLE_TZ};
use crate::constants::{SAMPLE_DATE_FORMAT, SAMPLE_TIME_FORMAT};
use crate::error::{NwisError, Result};
use crate::timezones;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use tracing::{debug, warn};

/// Replace the sample date, time and datum columns with a UTC `datetime` column
pub fn derive_sample_datetime(mut df: DataFrame) -> Result<DataFrame> {
    for required in [SAMPLE_DATE, SAMPLE_TIME, SAMPLE_TZ] {
        if df.column(required).is_err() {
            return Err(NwisError::malformed(format!(
                "Sample table has no '{}' column",
                required
            )));
        }
    }

    let mut unresolved = 0usize;
    let timestamps: Vec<Option<i64>> = {
        let dates = df.column(SAMPLE_DATE)?.str()?;
        let times = df.column(SAMPLE_TIME)?.str()?;
        let zones = df.column(SAMPLE_TZ)?.str()?;

        dates
            .into_iter()
            .zip(times)
            .zip(zones)
            .map(|((date, time), zone)| {
                let resolved = sample_timestamp(date, time, zone);
                if resolved.is_none() {
                    unresolved += 1;
                }
                resolved.map(|dt| dt.and_utc().timestamp_millis())
            })
            .collect()
    };

    if unresolved > 0 {
        warn!(
            "{} of {} samples have no resolvable timestamp",
            unresolved,
            df.height()
        );
    }

    let datetime = Series::new(DATETIME.into(), timestamps)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

    for source in [SAMPLE_DATE, SAMPLE_TIME, SAMPLE_TZ] {
        df = df.drop(source)?;
    }
    df.with_column(datetime)?;

    debug!("Derived sample datetimes for {} rows", df.height());
    Ok(df)
}

/// Combine one row's components, `None` when any is missing or unknown
fn sample_timestamp(
    date: Option<&str>,
    time: Option<&str>,
    zone: Option<&str>,
) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date?.trim(), SAMPLE_DATE_FORMAT).ok()?;
    let time = NaiveTime::parse_from_str(time?.trim(), SAMPLE_TIME_FORMAT).ok()?;
    timezones::to_utc(date.and_time(time), zone?)
}
