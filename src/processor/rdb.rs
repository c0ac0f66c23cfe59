//! RDB (tab-delimited) response parsing
//!
//! Reads the data section of an RDB body into a DataFrame. Every column is
//! read as a string: site numbers such as `03339000` must keep their leading
//! zeros, and the services mix codes and numbers freely in the same field.

use crate::config::RdbConfig;
use crate::constants::RDB_SEPARATOR;
use crate::error::{NwisError, Result};
use crate::header::{RdbLayout, is_no_data, parse_rdb_header};

use polars::prelude::*;
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Parse an RDB body into a DataFrame with one String column per header field
pub fn parse_rdb(body: &str, config: &RdbConfig) -> Result<DataFrame> {
    if is_no_data(body, config) {
        return Err(NwisError::EmptyResult);
    }

    let layout = parse_rdb_header(body, config)?;
    validate_layout(body, &layout)?;

    let schema = Schema::from_iter(
        layout
            .columns
            .iter()
            .map(|name| Field::new(name.as_str().into(), DataType::String)),
    );

    if layout.data_rows == 0 {
        debug!("RDB body has a header but no data rows");
        return Ok(DataFrame::empty_with_schema(&schema));
    }

    let data = data_section(body, &layout);
    let missing_value = config.missing_value.clone();
    let df = CsvReadOptions::default()
        .with_has_header(false)
        .with_schema(Some(Arc::new(schema)))
        .map_parse_options(move |opts| {
            opts.with_separator(RDB_SEPARATOR)
                .with_quote_char(None)
                .with_null_values(Some(NullValues::AllColumnsSingle(
                    missing_value.as_str().into(),
                )))
        })
        .into_reader_with_file_handle(Cursor::new(data.into_bytes()))
        .finish()?;

    debug!(
        "Read RDB table: {} rows x {} columns",
        df.height(),
        df.width()
    );

    Ok(df)
}

/// Data lines only: preamble, header and format line removed, blank lines dropped
fn data_section(body: &str, layout: &RdbLayout) -> String {
    let mut data = String::with_capacity(body.len());
    for line in body
        .lines()
        .skip(layout.data_start)
        .filter(|line| !line.trim().is_empty())
    {
        data.push_str(line);
        data.push('\n');
    }
    data
}

/// Reject duplicate header names and data rows wider than the header
fn validate_layout(body: &str, layout: &RdbLayout) -> Result<()> {
    let mut seen = HashSet::new();
    for name in &layout.columns {
        if !seen.insert(name.as_str()) {
            return Err(NwisError::malformed(format!(
                "RDB header repeats column '{}'",
                name
            )));
        }
    }

    let width = layout.columns.len();
    for (line_num, line) in body.lines().enumerate().skip(layout.data_start) {
        if line.trim().is_empty() {
            continue;
        }
        let fields = line.split('\t').count();
        if fields != width {
            return Err(NwisError::malformed(format!(
                "RDB line {} has {} fields, header has {}",
                line_num + 1,
                fields,
                width
            )));
        }
    }

    Ok(())
}
