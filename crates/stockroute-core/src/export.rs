//! Writing fulfillment results to CSV or JSON

use crate::config::OutputFormat;
use crate::error::Result;
use crate::pipeline::FulfillmentReport;
use crate::table::Table;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a table as CSV (header row first)
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(table.columns.iter().map(|c| c.name.as_str()))?;
    for row in &table.rows {
        csv_writer.write_record(row.cells.iter().map(|c| c.to_string_value()))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the whole report (table, resolved lines, warnings) as pretty JSON
pub fn write_json<W: Write>(report: &FulfillmentReport, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    Ok(())
}

/// Write the report in `format`
pub fn write_report<W: Write>(report: &FulfillmentReport, format: OutputFormat, writer: W) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(&report.table, writer),
        OutputFormat::Json => write_json(report, writer),
    }
}

/// Write the report to a file, creating parent directories as needed
pub fn export_report<P: AsRef<Path>>(
    report: &FulfillmentReport,
    path: P,
    format: OutputFormat,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_report(report, format, &mut writer)?;
    writer.flush()?;

    tracing::info!(path = %path.display(), %format, rows = report.table.row_count(), "report written");
    Ok(())
}
