//! Header-first CSV loading and the pre-run cleanliness check.

use std::collections::HashSet;
use std::error::Error;
use std::path::Path;

use causa_core::errors::CausalError;
use causa_core::{Column, Table};
use serde::Serialize;

/// Numeric value of a cell; empty, non-numeric and non-finite cells are missing.
fn parse_cell(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Cell text with numeric spellings normalised so `1` and `1.0` compare equal.
fn normalized_cell(cell: &str) -> String {
    match parse_cell(cell) {
        Some(value) => value.to_string(),
        None => cell.trim().to_string(),
    }
}

/// Raw CSV contents, one string per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvFrame {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Row counts reported by the cleanliness check and by `--auto-clean`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningReport {
    pub original_rows: usize,
    pub null_rows_count: usize,
    pub duplicate_rows_count: usize,
    pub null_rows_removed: usize,
    pub duplicate_rows_removed: usize,
    pub cleaned_rows: usize,
    pub total_rows_removed: usize,
    pub cleaning_summary: String,
}

impl CsvFrame {
    /// Reads a header-first CSV file.
    pub fn read(path: &Path) -> Result<Self, Box<dyn Error>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, rows })
    }

    fn is_null_row(row: &[String]) -> bool {
        row.iter().any(|cell| parse_cell(cell).is_none())
    }

    /// Rows holding at least one missing or non-numeric cell.
    pub fn null_rows(&self) -> usize {
        self.rows.iter().filter(|row| Self::is_null_row(row)).count()
    }

    /// Rows repeating an earlier row; the first occurrence is not counted.
    pub fn duplicate_rows(&self) -> usize {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|row| !seen.insert(row.iter().map(|c| normalized_cell(c)).collect::<Vec<_>>()))
            .count()
    }

    /// Whether the frame must be cleaned before analysis.
    pub fn needs_cleaning(&self) -> bool {
        self.null_rows() > 0 || self.duplicate_rows() > 0
    }

    /// Drops rows with missing cells, then duplicate rows (keeping the first).
    pub fn clean(&self) -> (CsvFrame, CleaningReport) {
        let null_rows_count = self.null_rows();
        let duplicate_rows_count = self.duplicate_rows();

        let complete: Vec<Vec<String>> = self
            .rows
            .iter()
            .filter(|row| !Self::is_null_row(row))
            .cloned()
            .collect();
        let null_rows_removed = self.rows.len() - complete.len();

        let mut seen = HashSet::new();
        let unique: Vec<Vec<String>> = complete
            .into_iter()
            .filter(|row| seen.insert(row.iter().map(|c| normalized_cell(c)).collect::<Vec<_>>()))
            .collect();
        let duplicate_rows_removed = self.rows.len() - null_rows_removed - unique.len();

        let mut parts = Vec::new();
        if null_rows_removed > 0 {
            parts.push(format!("Removed {null_rows_removed} rows with nulls."));
        }
        if duplicate_rows_removed > 0 {
            parts.push(format!("Removed {duplicate_rows_removed} duplicate rows."));
        }
        let cleaning_summary = if parts.is_empty() {
            "Data already clean.".to_string()
        } else {
            parts.join(" ")
        };

        let report = CleaningReport {
            original_rows: self.rows.len(),
            null_rows_count,
            duplicate_rows_count,
            null_rows_removed,
            duplicate_rows_removed,
            cleaned_rows: unique.len(),
            total_rows_removed: self.rows.len() - unique.len(),
            cleaning_summary,
        };
        let cleaned = CsvFrame {
            headers: self.headers.clone(),
            rows: unique,
        };
        (cleaned, report)
    }

    /// Converts a clean frame into a numeric table.
    ///
    /// Missing cells become NaN, which the pipeline rejects as input.
    pub fn to_table(&self) -> Result<Table, CausalError> {
        let columns = self
            .headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values = self
                    .rows
                    .iter()
                    .map(|row| row.get(idx).and_then(|c| parse_cell(c)).unwrap_or(f64::NAN))
                    .collect();
                Column::new(name.clone(), values)
            })
            .collect();
        Table::new(columns)
    }
}
