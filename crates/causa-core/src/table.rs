use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::{CausalError, ErrorInfo};

/// Named numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within a [`Table`].
    pub name: String,
    /// Row-aligned values.
    pub values: Vec<f64>,
}

impl Column {
    /// Creates a column from a name and its values.
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Ordered set of named numeric columns whose rows align by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Builds a table, rejecting empty or duplicate names and ragged columns.
    pub fn new(columns: Vec<Column>) -> Result<Self, CausalError> {
        let rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        let mut seen = BTreeSet::new();
        for column in &columns {
            if column.name.is_empty() {
                return Err(CausalError::Input(ErrorInfo::new(
                    "empty-column-name",
                    "column names must be non-empty",
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(CausalError::Input(
                    ErrorInfo::new("duplicate-column", "column names must be unique")
                        .with_context("column", &column.name),
                ));
            }
            if column.values.len() != rows {
                return Err(CausalError::Input(
                    ErrorInfo::new("ragged-columns", "all columns must have the same length")
                        .with_context("column", &column.name)
                        .with_context("expected", rows)
                        .with_context("found", column.values.len()),
                ));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Convenience constructor from `(name, values)` pairs.
    pub fn from_pairs<S, I>(pairs: I) -> Result<Self, CausalError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<f64>)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, values)| Column::new(name, values))
                .collect(),
        )
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column names in table order.
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Columns in table order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns whether a column with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Values of the named column.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Values of the named column, or an input error naming the column.
    pub fn require(&self, name: &str) -> Result<&[f64], CausalError> {
        self.column(name).ok_or_else(|| {
            CausalError::Input(
                ErrorInfo::new("missing-column", "column not found in table").with_context("column", name),
            )
        })
    }

    /// Returns a new table restricted to `names`, in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table, CausalError> {
        let columns = names
            .iter()
            .map(|name| {
                self.require(name.as_ref())
                    .map(|values| Column::new(name.as_ref(), values.to_vec()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Table::new(columns)
    }

    /// Returns a copy of the table with an extra column appended.
    pub fn with_column(&self, column: Column) -> Result<Table, CausalError> {
        let mut columns = self.columns.clone();
        columns.push(column);
        Table::new(columns)
    }

    /// Verifies that every cell holds a finite value.
    pub fn ensure_finite(&self) -> Result<(), CausalError> {
        for column in &self.columns {
            if let Some(row) = column.values.iter().position(|v| !v.is_finite()) {
                return Err(CausalError::Input(
                    ErrorInfo::new("non-finite-value", "table contains a missing or non-finite value")
                        .with_context("column", &column.name)
                        .with_context("row", row)
                        .with_hint("remove null rows before running the causal pipeline"),
                ));
            }
        }
        Ok(())
    }
}
