//! CSV parser for order and stock exports

use crate::error::{Error, Result};
use crate::table::{CellValue, Column, Row, Table};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Parse a CSV file into a Table
pub fn parse_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_reader(BufReader::new(file), path.to_path_buf())
}

/// Parse CSV from a string (useful for testing and in-memory callers)
pub fn parse_csv_str(content: &str, source_name: &str) -> Result<Table> {
    parse_reader(content.as_bytes(), PathBuf::from(source_name))
}

fn parse_reader<R: Read>(reader: R, path: PathBuf) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // Allow varying number of fields
        .from_reader(reader);

    // Parse headers into columns
    let headers = csv_reader.headers().map_err(|e| Error::Csv {
        path: path.clone(),
        source: e,
    })?;

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| Column::new(name.trim().to_string(), i))
        .collect();

    if columns.is_empty() || columns.iter().all(|c| c.name.is_empty()) {
        return Err(Error::CsvParse {
            path,
            message: "no columns found in CSV".to_string(),
        });
    }

    let mut rows = Vec::new();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| Error::Csv {
            path: path.clone(),
            source: e,
        })?;

        let mut cells: Vec<CellValue> = record.iter().map(CellValue::parse).collect();

        // Pad with empty cells if row is shorter than header
        while cells.len() < columns.len() {
            cells.push(CellValue::Empty);
        }

        if cells.len() > columns.len() {
            tracing::warn!(
                row = row_idx + 1,
                file = %path.display(),
                "row has more cells than columns, truncating"
            );
            cells.truncate(columns.len());
        }

        rows.push(Row::new(cells));
    }

    Ok(Table {
        columns,
        rows,
        source_path: path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_csv() {
        let csv = "Item Name,SKU,Quantity\nRed Shirt - M,RS-1,2\nBlue Shirt - L,BS-2,1\n";
        let table = parse_csv_str(csv, "orders.csv").unwrap();

        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.columns[0].name, "Item Name");
        assert_eq!(table.columns[2].name, "Quantity");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells[2], CellValue::Integer(2));
        assert_eq!(table.source_path, PathBuf::from("orders.csv"));
    }

    #[test]
    fn test_parse_with_empty_cells() {
        let csv = "Title,Size,Stock\nRed Shirt,,4\nBlue Shirt,L,\n";
        let table = parse_csv_str(csv, "ecom.csv").unwrap();

        assert_eq!(table.rows[0].cells[1], CellValue::Empty);
        assert_eq!(table.rows[1].cells[2], CellValue::Empty);
    }

    #[test]
    fn test_parse_pads_and_truncates_rows() {
        let csv = "Title,Size,Stock\nRed Shirt\nBlue Shirt,L,3,extra\n";
        let table = parse_csv_str(csv, "ecom.csv").unwrap();

        assert_eq!(table.rows[0].cells.len(), 3);
        assert_eq!(table.rows[0].cells[2], CellValue::Empty);
        assert_eq!(table.rows[1].cells.len(), 3);
        assert_eq!(table.rows[1].cells[2], CellValue::Integer(3));
    }

    #[test]
    fn test_parse_trims_headers() {
        let csv = " Item Name , Qty \nA,1\n";
        let table = parse_csv_str(csv, "orders.csv").unwrap();

        assert_eq!(table.columns[0].name, "Item Name");
        assert_eq!(table.columns[1].name, "Qty");
    }

    #[test]
    fn test_parse_empty_input_is_error() {
        assert!(matches!(
            parse_csv_str("", "empty.csv"),
            Err(Error::CsvParse { .. })
        ));
    }

    #[test]
    fn test_parse_missing_file() {
        assert!(matches!(
            parse_csv("/definitely/not/here.csv"),
            Err(Error::FileRead { .. })
        ));
    }
}
