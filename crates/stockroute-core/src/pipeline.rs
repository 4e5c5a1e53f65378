//! End-to-end fulfillment run: products + stock tables in, augmented table out

use crate::columns::{find_group_column, identify_columns};
use crate::config::RunConfig;
use crate::dispatch::{allocate, parcel_counts, DispatchSuggestion};
use crate::error::{Error, Result};
use crate::inventory::{aggregate, AggregationWarning, LocationStock};
use crate::parser::parse_csv;
use crate::resolver::{extract_order_lines, resolve_lines, ResolvedLine};
use crate::scanner::LocationSource;
use crate::table::{CellValue, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FULFILLMENT_COLUMN: &str = "Fulfillment";
pub const DISPATCH_COLUMN: &str = "Dispatch Suggestion";
pub const MATCH_STATUS_COLUMN: &str = "Match Status";

/// Result of one fulfillment run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentReport {
    /// Product table with fulfillment, per-location stock, dispatch and match columns
    pub table: Table,
    /// Known locations in priority order
    pub locations: Vec<String>,
    /// Header used to group lines into orders, if any
    pub group_column: Option<String>,
    pub lines: Vec<ResolvedLine>,
    pub suggestions: Vec<DispatchSuggestion>,
    pub warnings: Vec<AggregationWarning>,
    /// Lines that resolved to an inventory key
    pub matched_lines: usize,
    pub generated_at: DateTime<Utc>,
}

impl FulfillmentReport {
    /// Number of distinct shipping locations per order group
    pub fn parcels(&self) -> std::collections::BTreeMap<String, usize> {
        parcel_counts(&self.lines, &self.suggestions)
    }
}

/// Match every product line against the stock tables and suggest dispatch.
///
/// The input tables are not modified. Fails only when the product table has
/// no title-like column; stock table problems become warnings.
pub fn fulfill(products: &Table, stock: &[LocationStock]) -> Result<FulfillmentReport> {
    let roles = identify_columns(products);
    if !roles.is_matchable() {
        return Err(Error::MissingTitleColumn {
            table: products.source_path.display().to_string(),
        });
    }
    let group_col = find_group_column(products);

    let aggregation = aggregate(stock);
    let inventory = &aggregation.inventory;
    let locations = inventory.locations().to_vec();

    let order_lines = extract_order_lines(products, &roles, group_col);
    let lines = resolve_lines(&order_lines, inventory);
    let suggestions = allocate(&lines, &locations);
    let matched_lines = lines.iter().filter(|l| l.is_matched()).count();

    let table = augment(products, &locations, &lines, &suggestions);

    tracing::info!(
        lines = lines.len(),
        matched = matched_lines,
        locations = locations.len(),
        "fulfillment run complete"
    );

    Ok(FulfillmentReport {
        table,
        locations,
        group_column: group_col.map(|c| products.columns[c].name.clone()),
        lines,
        suggestions,
        warnings: aggregation.warnings,
        matched_lines,
        generated_at: Utc::now(),
    })
}

/// Build the output table: the products plus `Fulfillment`, one stock column
/// per location, `Dispatch Suggestion`, and `Match Status` last.
pub fn augment(
    products: &Table,
    locations: &[String],
    lines: &[ResolvedLine],
    suggestions: &[DispatchSuggestion],
) -> Table {
    let mut table = products.clone();

    table.set_column(
        MATCH_STATUS_COLUMN,
        lines.iter().map(|l| CellValue::text(l.status.to_string())).collect(),
    );
    table.set_column(
        FULFILLMENT_COLUMN,
        lines.iter().map(|l| CellValue::text(l.fulfillment.to_string())).collect(),
    );
    for loc in locations {
        table.set_column(
            loc,
            lines.iter().map(|l| CellValue::from(l.available_at(loc))).collect(),
        );
    }
    table.set_column(
        DISPATCH_COLUMN,
        suggestions.iter().map(|s| CellValue::text(s.to_string())).collect(),
    );
    table.move_column_last(MATCH_STATUS_COLUMN);

    table
}

/// Read every configured stock export.
///
/// A file that cannot be read or parsed does not stop the others; its
/// location is kept with the error attached and reported during aggregation.
pub fn load_location_tables(sources: &[LocationSource]) -> Vec<LocationStock> {
    sources
        .iter()
        .map(|source| match parse_csv(&source.path) {
            Ok(table) => LocationStock::new(source.name.clone(), table),
            Err(e) => LocationStock::unreadable(source.name.clone(), source.path.clone(), e.to_string()),
        })
        .collect()
}

/// Load the files named by a run config and fulfill
pub fn run(config: &RunConfig) -> Result<FulfillmentReport> {
    let products = parse_csv(&config.products)?;
    let stock = load_location_tables(&config.locations);
    fulfill(&products, &stock)
}
