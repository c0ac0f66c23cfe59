//! RDB header parsing and layout detection.
//!
//! An RDB body is a run of `#` comment lines, one tab-separated header line,
//! one format-description line (`5s`, `15d`, `10n` ...) and then the data
//! rows. This module locates those sections so the data can be read with the
//! right column names and skip count.

use crate::config::RdbConfig;
use crate::error::{NwisError, Result};
use tracing::debug;

/// Section boundaries of an RDB body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdbLayout {
    /// Number of leading comment lines
    pub comment_lines: usize,
    /// Column names from the header line
    pub columns: Vec<String>,
    /// Index of the first data line
    pub data_start: usize,
    /// Number of non-empty data lines
    pub data_rows: usize,
}

/// True when the body is the service's "nothing matched" message
pub fn is_no_data(body: &str, config: &RdbConfig) -> bool {
    body.trim_start().starts_with(config.no_data_sentinel.as_str())
}

/// Detect the comment preamble, header and data boundaries of an RDB body
pub fn parse_rdb_header(body: &str, config: &RdbConfig) -> Result<RdbLayout> {
    let lines: Vec<&str> = body.lines().collect();

    let comment_lines = lines
        .iter()
        .take_while(|line| line.starts_with(config.comment_prefix))
        .count();

    let header_line = lines.get(comment_lines).ok_or_else(|| {
        NwisError::malformed(format!(
            "RDB body has {} comment lines and no header line",
            comment_lines
        ))
    })?;

    let columns: Vec<String> = header_line
        .split('\t')
        .map(|name| name.trim().to_string())
        .collect();

    if columns.iter().all(|name| name.is_empty()) {
        return Err(NwisError::malformed("RDB header line is empty"));
    }

    let data_start = comment_lines + 2;
    let data_rows = lines
        .iter()
        .skip(data_start)
        .filter(|line| !line.trim().is_empty())
        .count();

    debug!(
        "Parsed RDB header: comment_lines={}, columns={}, data_rows={}",
        comment_lines,
        columns.len(),
        data_rows
    );

    Ok(RdbLayout {
        comment_lines,
        columns,
        data_start,
        data_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RdbConfig {
        RdbConfig::default()
    }

    #[test]
    fn test_no_comment_lines() {
        let body = "site_no\tvalue\n5s\t10n\n03339000\t801\n";
        let layout = parse_rdb_header(body, &config()).unwrap();

        assert_eq!(layout.comment_lines, 0);
        assert_eq!(layout.columns, vec!["site_no", "value"]);
        assert_eq!(layout.data_start, 2);
        assert_eq!(layout.data_rows, 1);
    }

    #[test]
    fn test_single_comment_line() {
        let body = "#comment\nsite_no\tvalue\n5s\t10n\n03339000\t801\n";
        let layout = parse_rdb_header(body, &config()).unwrap();

        assert_eq!(layout.comment_lines, 1);
        assert_eq!(layout.data_start, 3);
        assert_eq!(layout.columns, vec!["site_no", "value"]);
        assert_eq!(layout.data_rows, 1);
    }

    #[test]
    fn test_many_comment_lines() {
        let mut body = String::new();
        for i in 0..37 {
            body.push_str(&format!("# retrieved line {}\n", i));
        }
        body.push_str("agency_cd\tsite_no\nUSGS\t5s\nUSGS\t05586300\nUSGS\t03339000\n");

        let layout = parse_rdb_header(&body, &config()).unwrap();

        assert_eq!(layout.comment_lines, 37);
        assert_eq!(layout.columns, vec!["agency_cd", "site_no"]);
        assert_eq!(layout.data_start, 39);
        assert_eq!(layout.data_rows, 2);
    }

    #[test]
    fn test_comment_only_body_is_malformed() {
        let err = parse_rdb_header("# nothing here\n# at all\n", &config()).unwrap_err();
        assert!(matches!(err, NwisError::MalformedResponse { .. }));
    }

    #[test]
    fn test_no_data_sentinel() {
        assert!(is_no_data("No sites/data found using the selection criteria specified \n", &config()));
        assert!(!is_no_data("# No sites/data in a comment\n", &config()));
    }
}
