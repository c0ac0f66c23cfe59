//! Writing normalized tables to disk.
//!
//! Parquet output uses Snappy compression with column statistics so the
//! files can be filtered by site and time range downstream.

use crate::error::{NwisError, Result};
use crate::models::NormalizedTable;

use polars::prelude::{CsvWriter, ParquetCompression, ParquetWriter, SerWriter, StatisticsOptions};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Output formats selected by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Parquet,
    Csv,
}

impl OutputFormat {
    /// Detect the format from the path's extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("parquet") => Ok(OutputFormat::Parquet),
            Some("csv") => Ok(OutputFormat::Csv),
            _ => Err(NwisError::configuration(format!(
                "Cannot infer output format from '{}' (use .parquet or .csv)",
                path.display()
            ))),
        }
    }
}

/// Writes a normalized table to a single file
#[derive(Debug)]
pub struct TableWriter {
    output_path: PathBuf,
    format: OutputFormat,
}

impl TableWriter {
    /// Create a writer for the given output path
    pub fn new(output_path: impl Into<PathBuf>) -> Result<Self> {
        let output_path = output_path.into();
        let format = OutputFormat::from_path(&output_path)?;
        Ok(Self {
            output_path,
            format,
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Write the table, creating parent directories. Returns the rows written.
    pub fn write(&self, table: &NormalizedTable) -> Result<usize> {
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut df = table.frame.clone();
        let file = File::create(&self.output_path)?;

        match self.format {
            OutputFormat::Parquet => {
                ParquetWriter::new(file)
                    .with_compression(ParquetCompression::Snappy)
                    .with_statistics(StatisticsOptions::full())
                    .finish(&mut df)?;
            }
            OutputFormat::Csv => {
                CsvWriter::new(file).include_header(true).finish(&mut df)?;
            }
        }

        debug!(
            "Wrote {:?} table with index {:?}",
            self.format,
            table.index.columns()
        );
        info!(
            "Wrote {} rows to {}",
            df.height(),
            self.output_path.display()
        );

        Ok(df.height())
    }
}
