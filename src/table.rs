//! Numeric feature tables.
//!
//! A [`FeatureTable`] is an ordered set of named `f64` columns of equal
//! length, one row per record. Tables are built either from columns directly
//! or from row-oriented JSON records, in which case each column is classified
//! and coerced:
//!
//! - a column is numeric when its first non-null value is a number or a
//!   string that parses as one; other columns are listed as text
//! - every column is coerced cell by cell: cells that do not coerce (nulls,
//!   unparsable strings, missing keys) become NaN
//! - NaN cells are filled with the column mean, or 0 when nothing in the
//!   column is numeric
//!
//! Only numeric columns are offered as the default selection, but a text or
//! all-null column can still be selected by name; it clusters as its coerced,
//! filled values (all zeros when nothing in it parses).
//!
//! Infinite values are kept as-is; the pairwise engine skips any pair that
//! still carries a non-finite value.

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use tracing::debug;

/// A row-oriented record as received from dataset storage.
pub type Record = Map<String, Value>;

/// Ordered, named numeric columns with a fixed row count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    /// Every column, in table order.
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
    numeric_columns: Vec<String>,
    text_columns: Vec<String>,
}

impl FeatureTable {
    /// Build a table from `(name, values)` columns.
    ///
    /// Column order is preserved. A repeated name replaces the earlier column.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut table = Self::default();
        let mut first = true;
        for (name, values) in columns {
            if first {
                table.n_rows = values.len();
                first = false;
            } else if values.len() != table.n_rows {
                return Err(Error::DimensionMismatch {
                    expected: table.n_rows,
                    found: values.len(),
                });
            }
            let name = name.into();
            match table.names.iter().position(|n| *n == name) {
                Some(idx) => table.columns[idx] = values,
                None => {
                    table.numeric_columns.push(name.clone());
                    table.names.push(name);
                    table.columns.push(values);
                }
            }
        }
        Ok(table)
    }

    /// Build a table from JSON records.
    pub fn from_records(records: &[Record]) -> Self {
        let mut names: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }

        let mut table = Self {
            n_rows: records.len(),
            ..Self::default()
        };
        for name in names {
            let first = records
                .iter()
                .filter_map(|r| r.get(&name))
                .find(|v| !v.is_null());
            if first.is_some_and(|v| coerce(v).is_some()) {
                table.numeric_columns.push(name.clone());
            } else {
                table.text_columns.push(name.clone());
            }

            let mut values: Vec<f64> = records
                .iter()
                .map(|r| r.get(&name).and_then(coerce).unwrap_or(f64::NAN))
                .collect();
            fill_missing(&mut values);
            table.names.push(name);
            table.columns.push(values);
        }

        debug!(
            rows = table.n_rows,
            numeric = table.numeric_columns.len(),
            text = table.text_columns.len(),
            "built feature table from records"
        );
        table
    }

    /// Number of records.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Numeric column names, in table order. This is the default selection.
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    /// Columns classified as non-numeric during ingestion. They are still
    /// selectable by name.
    pub fn text_columns(&self) -> &[String] {
        &self.text_columns
    }

    /// Look up one column, numeric or text.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Look up several columns, failing with every missing name at once.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&[f64]>> {
        let mut found = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.column(name.as_ref()) {
                Some(col) => found.push(col),
                None => missing.push(name.as_ref().to_string()),
            }
        }
        if missing.is_empty() {
            Ok(found)
        } else {
            Err(Error::Schema { missing })
        }
    }
}

/// Numeric value of a JSON cell, if it has one.
fn coerce(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Replace NaN with the mean of the remaining values, or 0 if none remain.
pub fn fill_missing(values: &mut [f64]) {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    let fill = if count == 0 { 0.0 } else { sum / count as f64 };
    for v in values.iter_mut().filter(|v| v.is_nan()) {
        *v = fill;
    }
}
