//! Code for reading time series tables (demand and renewable availability) from CSV files.
use super::input_err_msg;
use crate::snapshot::{Snapshot, parse_snapshot_for_row};
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use std::path::Path;

/// A table of values indexed by snapshot.
///
/// Value columns are stored as raw text. They are only parsed as numbers when requested, so a
/// malformed column that the model never uses is not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    snapshots: Vec<Snapshot>,
    columns: IndexMap<String, Vec<String>>,
}

impl TimeSeriesTable {
    /// Read a time series table from a CSV file.
    ///
    /// # Arguments
    ///
    /// * `file_path` - Path to the CSV file
    /// * `index_column` - Name of the column containing timestamps
    pub fn from_path(file_path: &Path, index_column: &str) -> Result<Self> {
        read_timeseries_file(file_path, index_column).with_context(|| input_err_msg(file_path))
    }

    /// The snapshots in the table's index
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// The number of rows in the table
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the table has no rows (never true for a table read from a file)
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// The names of the value columns
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Get the values of the named column as numbers
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let Some(values) = self.columns.get(name) else {
            bail!("Column {name} not found in time series");
        };

        values
            .iter()
            .zip(&self.snapshots)
            .map(|(value, snapshot)| {
                value.parse().with_context(|| {
                    format!("Invalid value '{value}' in column {name} for snapshot {snapshot}")
                })
            })
            .collect()
    }
}

fn read_timeseries_file(file_path: &Path, index_column: &str) -> Result<TimeSeriesTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)?;

    let headers = reader.headers()?.clone();
    let Some(index) = headers.iter().position(|header| header == index_column) else {
        bail!("Index column {index_column} not found");
    };

    let mut columns: IndexMap<String, Vec<String>> = IndexMap::new();
    for (i, header) in headers.iter().enumerate() {
        if i == index {
            continue;
        }

        ensure!(
            columns.insert(header.to_string(), Vec::new()).is_none(),
            "Duplicate column name: {header}"
        );
    }

    let mut snapshots = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;

        // Row numbers count from 1 and include the header
        snapshots.push(parse_snapshot_for_row(&record[index], row + 2)?);

        let values = record
            .iter()
            .enumerate()
            .filter_map(|(i, value)| (i != index).then_some(value));
        for (column, value) in columns.values_mut().zip(values) {
            column.push(value.to_string());
        }
    }
    ensure!(!snapshots.is_empty(), "Time series cannot be empty");

    Ok(TimeSeriesTable { snapshots, columns })
}
