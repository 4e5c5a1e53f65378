//! Core table types for order and stock exports

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A table loaded from a single export (order list or location stock)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Column definitions
    pub columns: Vec<Column>,
    /// Row data
    pub rows: Vec<Row>,
    /// Source file path (or a caller-chosen name for in-memory tables)
    pub source_path: PathBuf,
}

impl Table {
    /// Create a new empty table
    pub fn new(source_path: PathBuf) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            source_path,
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Index of the column with exactly this name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.find_column(name).map(|c| c.index)
    }

    /// Get a cell by row and column index
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Replace the column called `name` with `values`, or append it if absent.
    ///
    /// `values` must hold one cell per row; missing cells are padded with `Empty`.
    pub fn set_column(&mut self, name: &str, values: Vec<CellValue>) {
        let mut values = values.into_iter();
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row.cells[idx] = values.next().unwrap_or(CellValue::Empty);
                }
            }
            None => {
                let idx = self.columns.len();
                self.columns.push(Column::new(name.to_string(), idx));
                for row in &mut self.rows {
                    row.cells.push(values.next().unwrap_or(CellValue::Empty));
                }
            }
        }
    }

    /// Move the named column to the end, keeping the order of the others
    pub fn move_column_last(&mut self, name: &str) {
        let Some(idx) = self.column_index(name) else {
            return;
        };

        let column = self.columns.remove(idx);
        self.columns.push(column);
        for (i, col) in self.columns.iter_mut().enumerate() {
            col.index = i;
        }

        for row in &mut self.rows {
            let cell = row.cells.remove(idx);
            row.cells.push(cell);
        }
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// A column definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name as it appears in the header
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }
}

/// A row of data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    /// Cell values for each column
    pub cells: Vec<CellValue>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// A cell value with type detection
///
/// Spreadsheet exports routinely turn integer codes into floats (`123.0`), so
/// the type survives parsing and the normalizer decides how to compare it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    String(String),
    /// Empty/null cell
    Empty,
}

impl CellValue {
    /// Parse a string into a CellValue, detecting the type
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        // Try parsing as integer first
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }

        if is_long_numeric_code(trimmed) {
            return CellValue::String(trimmed.to_string());
        }

        // Reject "inf"/"nan" spellings so product names like "Infinity Tee" stay text
        if trimmed.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+' || c == '.') {
            if let Ok(f) = trimmed.parse::<f64>() {
                return CellValue::Float(f);
            }
        }

        // Otherwise, keep as string
        CellValue::String(trimmed.to_string())
    }

    /// Convenience constructor for text cells
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::String(s.into())
    }

    /// Check if the cell is empty (or a float NaN, which spreadsheets use for blanks)
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Convert to a display string
    pub fn to_string_value(&self) -> String {
        match self {
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

/// Digits an `f64` always holds exactly
const MAX_EXACT_FLOAT_DIGITS: usize = 15;

/// Plain decimal text (digits and at most one `.`) too long to survive a
/// round trip through `f64`, e.g. a 20-digit barcode
fn is_long_numeric_code(s: &str) -> bool {
    let digits = s.bytes().filter(u8::is_ascii_digit).count();
    digits > MAX_EXACT_FLOAT_DIGITS
        && s.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && s.bytes().filter(|&b| b == b'.').count() <= 1
}

impl From<u64> for CellValue {
    fn from(value: u64) -> Self {
        CellValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(fl) => write!(f, "{}", fl),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Empty => write!(f, ""),
        }
    }
}
