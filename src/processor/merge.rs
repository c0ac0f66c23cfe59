//! Outer-join merging of partial tables
//!
//! The JSON path produces one small table per value block. They are folded
//! into a single wide table keyed on (`site_no`, `datetime`), or `datetime`
//! alone when a side carries no site column.
//!
//! [`merge_asof`] pairs two already indexed tables by nearest earlier
//! timestamp, per site when both tables carry one.

use crate::constants::columns::{DATETIME, SITE_NO};
use crate::error::{NwisError, Result};

use polars::prelude::*;
use chrono::Duration;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Suffix polars gives to right-hand columns that clash with the left side
const RIGHT_SUFFIX: &str = "__right";

/// Temporary row number used to split conflicting rows off the right table
const ROW_INDEX: &str = "__row";

/// Merge a partial table into the accumulator.
///
/// An absent accumulator is the identity: the partial table is returned as is.
pub fn merge_into(accumulator: Option<DataFrame>, partial: DataFrame) -> Result<DataFrame> {
    match accumulator {
        None => Ok(partial),
        Some(acc) => outer_merge(acc, partial),
    }
}

/// Key columns shared by both tables, in index order
pub fn shared_keys(left: &DataFrame, right: &DataFrame) -> Vec<&'static str> {
    [SITE_NO, DATETIME]
        .into_iter()
        .filter(|key| left.column(key).is_ok() && right.column(key).is_ok())
        .collect()
}

/// Full outer join on the shared key columns.
///
/// Value columns present on both sides (the same parameter reported for
/// another site) are coalesced, so rows for different keys stack instead of
/// producing suffixed duplicates. A right-hand row whose values disagree with
/// the accumulator on the same key is appended as a separate row, so both
/// readings survive under a duplicate index key.
pub fn outer_merge(left: DataFrame, right: DataFrame) -> Result<DataFrame> {
    let keys = shared_keys(&left, &right);
    if !keys.contains(&DATETIME) {
        return Err(NwisError::malformed(
            "Cannot merge tables without a shared datetime column",
        ));
    }

    let left_names: Vec<String> = left
        .get_column_names_str()
        .into_iter()
        .map(str::to_string)
        .collect();
    let right_names: Vec<String> = right
        .get_column_names_str()
        .into_iter()
        .map(str::to_string)
        .collect();
    let key_set: HashSet<&str> = keys.iter().copied().collect();
    let left_set: HashSet<&str> = left_names.iter().map(String::as_str).collect();

    let overlapping: Vec<&str> = right_names
        .iter()
        .map(String::as_str)
        .filter(|name| !key_set.contains(name) && left_set.contains(name))
        .collect();

    let (right, conflicting) = split_conflicts(&left, right, &keys, &overlapping)?;

    let key_exprs: Vec<Expr> = keys.iter().map(|key| col(*key)).collect();
    let joined = left.lazy().join(
        right.lazy(),
        key_exprs.clone(),
        key_exprs,
        JoinArgs::new(JoinType::Full)
            .with_coalesce(JoinCoalesce::CoalesceColumns)
            .with_suffix(Some(RIGHT_SUFFIX.into())),
    );

    let mut selection: Vec<Expr> = Vec::with_capacity(left_names.len() + right_names.len());
    for name in &left_names {
        if overlapping.contains(&name.as_str()) {
            let right_name = format!("{}{}", name, RIGHT_SUFFIX);
            selection.push(
                col(name.as_str())
                    .fill_null(col(right_name.as_str()))
                    .alias(name.as_str()),
            );
        } else {
            selection.push(col(name.as_str()));
        }
    }
    for name in &right_names {
        if !left_set.contains(name.as_str()) {
            selection.push(col(name.as_str()));
        }
    }

    let merged = joined.select(selection);
    let merged = match conflicting {
        Some(rows) => {
            warn!(
                "{} rows disagree with existing values on keys {:?}; keeping them as separate rows",
                rows.height(),
                keys
            );
            concat_lf_diagonal([merged, rows.lazy()], UnionArgs::default())?.collect()?
        }
        None => merged.collect()?,
    };

    debug!(
        "Merged tables on {:?}: {} rows x {} columns",
        keys,
        merged.height(),
        merged.width()
    );

    Ok(merged)
}

/// Split the right table into rows that merge cleanly and rows that conflict.
///
/// A row conflicts when a matching left row holds a different non-null value
/// in one of the overlapping columns.
fn split_conflicts(
    left: &DataFrame,
    right: DataFrame,
    keys: &[&str],
    overlapping: &[&str],
) -> Result<(DataFrame, Option<DataFrame>)> {
    let Some(differs) = overlapping
        .iter()
        .map(|name| {
            let other = col(format!("{}{}", name, RIGHT_SUFFIX));
            col(*name)
                .is_not_null()
                .and(other.clone().is_not_null())
                .and(col(*name).neq(other))
        })
        .reduce(|a, b| a.or(b))
    else {
        return Ok((right, None));
    };

    let key_exprs: Vec<Expr> = keys.iter().map(|key| col(*key)).collect();
    let rows = left
        .clone()
        .lazy()
        .join(
            right.with_row_index(ROW_INDEX.into(), None)?.lazy(),
            key_exprs.clone(),
            key_exprs,
            JoinArgs::new(JoinType::Inner).with_suffix(Some(RIGHT_SUFFIX.into())),
        )
        .filter(differs)
        .select([col(ROW_INDEX)])
        .collect()?;

    if rows.height() == 0 {
        return Ok((right, None));
    }

    let flagged: HashSet<IdxSize> = rows.column(ROW_INDEX)?.idx()?.into_no_null_iter().collect();
    let mask: BooleanChunked = (0..right.height() as IdxSize)
        .map(|row| flagged.contains(&row))
        .collect();

    let conflicting = right.filter(&mask)?;
    let clean = right.filter(&!&mask)?;
    Ok((clean, Some(conflicting)))
}

/// As-of merge of two indexed tables.
///
/// Each left row takes the right row with the latest `datetime` at or before
/// its own, within `tolerance` when one is given. Tables indexed on
/// (`site_no`, `datetime`) are matched within each site; tables indexed on
/// `datetime` alone are matched across the whole table. Both tables must use
/// the same index. Rows without a datetime are dropped first, and right-hand
/// value columns that clash with the left get a `_right` suffix.
pub fn merge_asof(
    left: &DataFrame,
    right: &DataFrame,
    tolerance: Option<Duration>,
) -> Result<DataFrame> {
    let has = |df: &DataFrame, name: &str| df.column(name).is_ok();
    if !has(left, DATETIME) || !has(right, DATETIME) {
        return Err(NwisError::malformed(
            "As-of merge needs a datetime column on both tables",
        ));
    }
    let by_site = match (has(left, SITE_NO), has(right, SITE_NO)) {
        (true, true) => true,
        (false, false) => false,
        _ => {
            return Err(NwisError::malformed(
                "As-of merge needs both tables indexed the same way (site_no present on one side only)",
            ));
        }
    };

    let tolerance = match (tolerance, left.column(DATETIME)?.dtype()) {
        (None, _) => None,
        (Some(delta), DataType::Datetime(unit, _)) => Some(AnyValue::Int64(in_time_unit(delta, *unit)?)),
        (Some(_), other) => {
            return Err(NwisError::malformed(format!(
                "As-of tolerance needs a datetime column, found {}",
                other
            )));
        }
    };

    let left = by_datetime(left)?;
    let right = by_datetime(right)?;

    let merged = if by_site {
        left.join_asof_by(
            &right,
            DATETIME,
            DATETIME,
            [SITE_NO],
            [SITE_NO],
            AsofStrategy::Backward,
            tolerance,
            true,
            false,
        )?
        .lazy()
        .sort_by_exprs(
            [col(SITE_NO), col(DATETIME)],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?
    } else {
        left.lazy()
            .join(
                right.lazy(),
                [col(DATETIME)],
                [col(DATETIME)],
                JoinArgs::new(JoinType::AsOf(AsOfOptions {
                    strategy: AsofStrategy::Backward,
                    tolerance,
                    allow_eq: true,
                    ..Default::default()
                })),
            )
            .collect()?
    };

    debug!(
        "As-of merged {} rows (by site: {})",
        merged.height(),
        by_site
    );
    Ok(merged)
}

fn in_time_unit(delta: Duration, unit: TimeUnit) -> Result<i64> {
    let value = match unit {
        TimeUnit::Milliseconds => Some(delta.num_milliseconds()),
        TimeUnit::Microseconds => delta.num_microseconds(),
        TimeUnit::Nanoseconds => delta.num_nanoseconds(),
    };
    value.ok_or_else(|| NwisError::configuration("As-of tolerance is out of range"))
}

fn by_datetime(df: &DataFrame) -> Result<DataFrame> {
    Ok(df
        .clone()
        .lazy()
        .filter(col(DATETIME).is_not_null())
        .sort_by_exprs(
            [col(DATETIME)],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn millis(day: u32, hour: u32) -> i64 {
        NaiveDate::from_ymd_opt(2018, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    fn block(site: &str, column: &str, rows: &[(i64, f64)]) -> DataFrame {
        let datetime = Series::new(
            DATETIME.into(),
            rows.iter().map(|(t, _)| *t).collect::<Vec<i64>>(),
        )
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .unwrap();
        let values = Series::new(
            column.into(),
            rows.iter().map(|(_, v)| *v).collect::<Vec<f64>>(),
        );
        let sites = Series::new(SITE_NO.into(), vec![site; rows.len()]);
        DataFrame::new(vec![sites.into(), datetime.into(), values.into()]).unwrap()
    }

    fn sorted(df: DataFrame) -> DataFrame {
        df.lazy()
            .sort_by_exprs(
                [col(SITE_NO), col(DATETIME)],
                SortMultipleOptions::default(),
            )
            .collect()
            .unwrap()
    }

    #[test]
    fn test_absent_accumulator_is_identity() {
        let partial = block("03339000", "00060", &[(millis(24, 0), 801.0)]);
        let merged = merge_into(None, partial.clone()).unwrap();
        assert!(merged.equals(&partial));
    }

    #[test]
    fn test_disjoint_timestamps_sum_row_counts() {
        let a = block("03339000", "00060", &[(millis(24, 0), 801.0), (millis(24, 1), 802.0)]);
        let b = block("03339000", "00065", &[(millis(25, 0), 4.1), (millis(25, 1), 4.2), (millis(25, 2), 4.3)]);

        let merged = sorted(merge_into(Some(a), b).unwrap());

        assert_eq!(merged.height(), 5);
        assert_eq!(merged.column("00060").unwrap().null_count(), 3);
        assert_eq!(merged.column("00065").unwrap().null_count(), 2);
    }

    #[test]
    fn test_matching_keys_combine_into_one_row() {
        let a = block("03339000", "00060", &[(millis(24, 0), 801.0)]);
        let b = block("03339000", "00065", &[(millis(24, 0), 4.1)]);

        let merged = merge_into(Some(a), b).unwrap();

        assert_eq!(merged.height(), 1);
        assert_eq!(
            merged.get_column_names_str(),
            vec!["site_no", "datetime", "00060", "00065"]
        );
        assert_eq!(merged.column("00060").unwrap().f64().unwrap().get(0), Some(801.0));
        assert_eq!(merged.column("00065").unwrap().f64().unwrap().get(0), Some(4.1));
    }

    #[test]
    fn test_same_parameter_at_two_sites_stacks() {
        let a = block("03339000", "00060", &[(millis(24, 0), 801.0)]);
        let b = block("05586300", "00060", &[(millis(24, 0), 12000.0)]);

        let merged = sorted(merge_into(Some(a), b).unwrap());

        assert_eq!(merged.height(), 2);
        assert_eq!(merged.width(), 3);
        let flow = merged.column("00060").unwrap().f64().unwrap();
        assert_eq!(flow.get(0), Some(801.0));
        assert_eq!(flow.get(1), Some(12000.0));
    }

    #[test]
    fn test_merge_order_does_not_change_cells() {
        let a = block("03339000", "00060", &[(millis(24, 0), 801.0), (millis(24, 1), 802.0)]);
        let b = block("03339000", "00065", &[(millis(24, 1), 4.2)]);
        let c = block("05586300", "00060", &[(millis(24, 0), 12000.0)]);

        let forward = merge_into(Some(merge_into(Some(a.clone()), b.clone()).unwrap()), c.clone()).unwrap();
        let backward = merge_into(Some(merge_into(Some(c), b).unwrap()), a).unwrap();

        let forward = sorted(forward).select(["site_no", "datetime", "00060", "00065"]).unwrap();
        let backward = sorted(backward).select(["site_no", "datetime", "00060", "00065"]).unwrap();
        assert!(forward.equals_missing(&backward));
    }

    #[test]
    fn test_conflicting_values_keep_both_rows() {
        let a = block("03339000", "00060", &[(millis(24, 0), 801.0), (millis(24, 1), 802.0)]);
        let b = block("03339000", "00060", &[(millis(24, 0), 805.0), (millis(24, 1), 802.0)]);

        let merged = merge_into(Some(a), b).unwrap();

        assert_eq!(merged.height(), 3);
        assert_eq!(merged.get_column_names_str(), vec!["site_no", "datetime", "00060"]);
        let mut flow: Vec<f64> = merged
            .column("00060")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        flow.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(flow, vec![801.0, 802.0, 805.0]);
    }

    #[test]
    fn test_equal_values_are_not_a_conflict() {
        let a = block("03339000", "00060", &[(millis(24, 0), 801.0)]);
        let b = block("03339000", "00060", &[(millis(24, 0), 801.0)]);

        let merged = merge_into(Some(a), b).unwrap();

        assert_eq!(merged.height(), 1);
        assert_eq!(merged.column("00060").unwrap().null_count(), 0);
    }

    #[test]
    fn test_asof_single_index_respects_tolerance() {
        let flow = block("03339000", "00060", &[(millis(24, 0), 801.0), (millis(24, 3), 804.0)])
            .drop(SITE_NO)
            .unwrap();
        let stage = block("03339000", "00065", &[(millis(23, 23), 4.1), (millis(24, 1), 4.2)])
            .drop(SITE_NO)
            .unwrap();

        let merged = merge_asof(&flow, &stage, Some(Duration::hours(1))).unwrap();
        assert_eq!(merged.height(), 2);
        let stage_values = merged.column("00065").unwrap().f64().unwrap();
        assert_eq!(stage_values.get(0), Some(4.1));
        // nearest earlier reading is two hours back
        assert_eq!(stage_values.get(1), None);

        let unbounded = merge_asof(&flow, &stage, None).unwrap();
        assert_eq!(unbounded.column("00065").unwrap().f64().unwrap().get(1), Some(4.2));
    }

    #[test]
    fn test_asof_composite_index_matches_within_site() {
        let flow = sorted(
            merge_into(
                Some(block("03339000", "00060", &[(millis(24, 2), 801.0)])),
                block("05586300", "00060", &[(millis(24, 2), 12000.0)]),
            )
            .unwrap(),
        );
        let stage = sorted(
            merge_into(
                Some(block("03339000", "00065", &[(millis(24, 0), 4.1)])),
                block("05586300", "00065", &[(millis(24, 1), 9.9)]),
            )
            .unwrap(),
        );

        let merged = merge_asof(&flow, &stage, Some(Duration::hours(3))).unwrap();

        assert_eq!(merged.height(), 2);
        let sites = merged.column(SITE_NO).unwrap().str().unwrap();
        let stage_values = merged.column("00065").unwrap().f64().unwrap();
        assert_eq!(sites.get(0), Some("03339000"));
        assert_eq!(stage_values.get(0), Some(4.1));
        assert_eq!(sites.get(1), Some("05586300"));
        assert_eq!(stage_values.get(1), Some(9.9));
    }

    #[test]
    fn test_asof_mismatched_index_is_rejected() {
        let flow = block("03339000", "00060", &[(millis(24, 0), 801.0)]);
        let stage = block("03339000", "00065", &[(millis(24, 0), 4.1)])
            .drop(SITE_NO)
            .unwrap();

        let err = merge_asof(&flow, &stage, None).unwrap_err();
        assert!(matches!(err, NwisError::MalformedResponse { .. }));
    }

    #[test]
    fn test_tables_without_datetime_cannot_merge() {
        let a = DataFrame::new(vec![Series::new(SITE_NO.into(), &["03339000"]).into()]).unwrap();
        let b = a.clone();
        let err = outer_merge(a, b).unwrap_err();
        assert!(matches!(err, NwisError::MalformedResponse { .. }));
    }
}
