//! Aggregation of per-location stock tables into one lookup structure

use crate::columns::identify_columns;
use crate::normalize::{fold, normalize_key, normalize_size, NO_SIZE};
use crate::table::{CellValue, Table};
use crate::variant::build_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Quantity on hand per location name
pub type StockLevels = BTreeMap<String, u64>;

/// One uploaded stock export and the location it belongs to
#[derive(Debug, Clone)]
pub struct LocationStock {
    /// Location name (warehouse, shop, sales channel)
    pub name: String,
    /// The stock export for that location
    pub table: Table,
    /// Why the export could not be loaded, if it couldn't
    pub load_error: Option<String>,
}

impl LocationStock {
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
            load_error: None,
        }
    }

    /// A location whose export failed to load. It still counts as a known
    /// location, with no stock.
    pub fn unreadable(name: impl Into<String>, path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: Table::new(path.into()),
            load_error: Some(reason.into()),
        }
    }
}

/// Which totals a resolved order line draws its stock from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum StockKey {
    /// Totals keyed by variant key (title + size)
    Variant(String),
    /// Totals keyed by normalized SKU
    Sku(String),
}

/// Stock of every variant at every known location, plus the SKU index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    /// Known locations in priority order
    locations: Vec<String>,
    /// Variant key -> stock per location
    by_variant: BTreeMap<String, StockLevels>,
    /// Normalized SKU -> stock per location
    by_sku: BTreeMap<String, StockLevels>,
    /// Normalized SKU -> variant key it was last seen with
    sku_index: BTreeMap<String, String>,
}

impl Inventory {
    /// Create an empty inventory over the given locations (duplicates collapse)
    pub fn new<I, S>(locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut known: Vec<String> = Vec::new();
        for loc in locations {
            let loc = loc.into();
            if !known.contains(&loc) {
                known.push(loc);
            }
        }

        Self {
            locations: known,
            ..Self::default()
        }
    }

    /// Known locations in priority order
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Stock for a variant key
    pub fn variant(&self, key: &str) -> Option<&StockLevels> {
        self.by_variant.get(key)
    }

    /// Stock for a normalized SKU
    pub fn sku(&self, sku: &str) -> Option<&StockLevels> {
        self.by_sku.get(sku)
    }

    /// The variant key a SKU is currently bound to
    pub fn indexed_variant(&self, sku: &str) -> Option<&str> {
        self.sku_index.get(sku).map(String::as_str)
    }

    /// The whole SKU index
    pub fn sku_index(&self) -> &BTreeMap<String, String> {
        &self.sku_index
    }

    pub fn contains_variant(&self, key: &str) -> bool {
        self.by_variant.contains_key(key)
    }

    /// Number of distinct variants
    pub fn variant_count(&self) -> usize {
        self.by_variant.len()
    }

    /// Stock levels behind a stock key
    pub fn levels(&self, key: &StockKey) -> Option<&StockLevels> {
        match key {
            StockKey::Variant(k) => self.variant(k),
            StockKey::Sku(k) => self.sku(k),
        }
    }

    /// Quantity of `key` at one location (0 when unknown)
    pub fn available_at(&self, key: &StockKey, location: &str) -> u64 {
        self.levels(key)
            .and_then(|levels| levels.get(location))
            .copied()
            .unwrap_or(0)
    }

    /// Total quantity of `key` across all locations
    pub fn total(&self, key: &StockKey) -> u64 {
        self.levels(key)
            .map(|levels| levels.values().fold(0u64, |acc, &q| acc.saturating_add(q)))
            .unwrap_or(0)
    }

    /// Add `qty` of a variant at `location`, creating a zeroed row first.
    ///
    /// Quantities saturate at `u64::MAX`.
    pub fn add_variant(&mut self, key: &str, location: &str, qty: u64) {
        let row = Self::row(&mut self.by_variant, &self.locations, key);
        let held = row.entry(location.to_string()).or_insert(0);
        *held = held.saturating_add(qty);
    }

    /// Add `qty` under a SKU and (re)bind the SKU to `variant_key`.
    ///
    /// A SKU seen with several variants keeps the last binding.
    pub fn add_sku(&mut self, sku: &str, variant_key: &str, location: &str, qty: u64) {
        let row = Self::row(&mut self.by_sku, &self.locations, sku);
        let held = row.entry(location.to_string()).or_insert(0);
        *held = held.saturating_add(qty);

        if let Some(previous) = self.sku_index.insert(sku.to_string(), variant_key.to_string()) {
            if previous != variant_key {
                tracing::debug!(
                    sku,
                    previous = %previous,
                    current = variant_key,
                    "SKU rebound to a different variant"
                );
            }
        }
    }

    fn row<'a>(
        map: &'a mut BTreeMap<String, StockLevels>,
        locations: &[String],
        key: &str,
    ) -> &'a mut StockLevels {
        map.entry(key.to_string())
            .or_insert_with(|| locations.iter().map(|l| (l.clone(), 0)).collect())
    }
}

/// A non-fatal problem found while reading a stock table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregationWarning {
    /// No title column: the location was skipped entirely
    MissingTitleColumn { location: String },
    /// No quantity column: every row of the location counts as 0
    MissingQuantityColumn { location: String },
    /// The export could not be read or parsed: the location was skipped
    Unreadable { location: String, reason: String },
}

impl AggregationWarning {
    /// Location the warning refers to
    pub fn location(&self) -> &str {
        match self {
            AggregationWarning::MissingTitleColumn { location }
            | AggregationWarning::MissingQuantityColumn { location }
            | AggregationWarning::Unreadable { location, .. } => location,
        }
    }
}

impl fmt::Display for AggregationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationWarning::MissingTitleColumn { location } => {
                write!(f, "{location}: missing title/item name column, skipped")
            }
            AggregationWarning::MissingQuantityColumn { location } => {
                write!(f, "{location}: missing quantity column, assuming 0 stock")
            }
            AggregationWarning::Unreadable { location, reason } => {
                write!(f, "{location}: could not be read ({reason}), skipped")
            }
        }
    }
}

/// Result of aggregating all location tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregation {
    pub inventory: Inventory,
    pub warnings: Vec<AggregationWarning>,
}

/// Merge every location's stock table into one [`Inventory`].
///
/// Rows are summed, never deduplicated: uploading the same table twice for a
/// location doubles its stock. An unreadable export or a table without a title
/// column is skipped with a warning and does not affect the others.
pub fn aggregate(sources: &[LocationStock]) -> Aggregation {
    let mut inventory = Inventory::new(sources.iter().map(|s| s.name.clone()));
    let mut warnings = Vec::new();

    for source in sources {
        if let Some(reason) = &source.load_error {
            let warning = AggregationWarning::Unreadable {
                location: source.name.clone(),
                reason: reason.clone(),
            };
            tracing::warn!("{warning}");
            warnings.push(warning);
            continue;
        }

        let roles = identify_columns(&source.table);

        let Some(title_col) = roles.title else {
            let warning = AggregationWarning::MissingTitleColumn {
                location: source.name.clone(),
            };
            tracing::warn!("{warning}");
            warnings.push(warning);
            continue;
        };

        if roles.quantity.is_none() {
            let warning = AggregationWarning::MissingQuantityColumn {
                location: source.name.clone(),
            };
            tracing::warn!("{warning}");
            warnings.push(warning);
        }

        let mut rows_counted = 0usize;
        for row in &source.table.rows {
            let title = row.get(title_col).map(normalize_key).unwrap_or_default();
            let size = roles
                .size
                .and_then(|c| row.get(c))
                .map(normalize_size)
                .unwrap_or_else(|| NO_SIZE.to_string());

            let key = build_key(&title, &size);
            if key.is_empty() {
                continue;
            }

            let qty = roles
                .quantity
                .and_then(|c| row.get(c))
                .map(parse_stock_quantity)
                .unwrap_or(0);

            inventory.add_variant(&key, &source.name, qty);

            if let Some(sku_col) = roles.sku {
                let sku = row.get(sku_col).map(normalize_key).unwrap_or_default();
                if !sku.is_empty() {
                    inventory.add_sku(&fold(&sku), &key, &source.name, qty);
                }
            }
            rows_counted += 1;
        }

        tracing::debug!(location = %source.name, rows = rows_counted, "aggregated stock table");
    }

    tracing::info!(
        locations = inventory.locations().len(),
        variants = inventory.variant_count(),
        warnings = warnings.len(),
        "inventory aggregated"
    );

    Aggregation {
        inventory,
        warnings,
    }
}

/// Parse a stock quantity cell.
///
/// Blank or unparseable cells count as 0, thousands separators are ignored,
/// fractions are floored and negative stock is clamped to 0.
pub fn parse_stock_quantity(value: &CellValue) -> u64 {
    match parse_number(value) {
        Some(f) if f > 0.0 => f.floor() as u64,
        _ => 0,
    }
}

/// Numeric value of a cell, ignoring thousands separators in text
pub(crate) fn parse_number(value: &CellValue) -> Option<f64> {
    let f = match value {
        CellValue::Integer(i) => *i as f64,
        CellValue::Float(f) => *f,
        CellValue::String(s) => s.replace(',', "").trim().parse::<f64>().ok()?,
        CellValue::Empty => return None,
    };
    f.is_finite().then_some(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_csv_str;

    fn stock(name: &str, csv: &str) -> LocationStock {
        LocationStock::new(name, parse_csv_str(csv, &format!("{name}.csv")).unwrap())
    }

    #[test]
    fn test_aggregate_single_location() {
        let ecom = stock("Ecom", "Title,Size,Stock\nRed Shirt,M,2\nRed Shirt,L,5\n");
        let agg = aggregate(&[ecom]);

        assert!(agg.warnings.is_empty());
        let levels = agg.inventory.variant("red shirt - m").unwrap();
        assert_eq!(levels.get("Ecom"), Some(&2));
        assert_eq!(agg.inventory.variant_count(), 2);
    }

    #[test]
    fn test_every_variant_has_every_location() {
        let ecom = stock("Ecom", "Title,Size,Stock\nRed Shirt,M,2\n");
        let mirpur = stock("Mirpur", "Title,Size,Stock\nBlue Shirt,L,1\n");
        let agg = aggregate(&[ecom, mirpur]);

        let red = agg.inventory.variant("red shirt - m").unwrap();
        assert_eq!(red.get("Mirpur"), Some(&0));
        let blue = agg.inventory.variant("blue shirt - l").unwrap();
        assert_eq!(blue.get("Ecom"), Some(&0));
        assert_eq!(blue.get("Mirpur"), Some(&1));
    }

    #[test]
    fn test_same_table_twice_is_additive() {
        let csv = "Title,Size,Stock\nRed Shirt,M,2\nRed Shirt,M,1\n";
        let agg = aggregate(&[stock("Ecom", csv), stock("Ecom", csv)]);

        assert_eq!(agg.inventory.locations(), &["Ecom".to_string()]);
        let levels = agg.inventory.variant("red shirt - m").unwrap();
        assert_eq!(levels.get("Ecom"), Some(&6));
    }

    #[test]
    fn test_huge_quantities_saturate() {
        let ecom = stock("Ecom", "Title,Size,Stock,SKU\nRed Shirt,M,1e30,RS-1\nRed Shirt,M,1e30,RS-1\n");
        let mirpur = stock("Mirpur", "Title,Size,Stock,SKU\nRed Shirt,M,5,RS-1\n");
        let agg = aggregate(&[ecom, mirpur]);

        let levels = agg.inventory.variant("red shirt - m").unwrap();
        assert_eq!(levels.get("Ecom"), Some(&u64::MAX));
        assert_eq!(levels.get("Mirpur"), Some(&5));
        assert_eq!(agg.inventory.total(&StockKey::Variant("red shirt - m".into())), u64::MAX);
        assert_eq!(agg.inventory.total(&StockKey::Sku("rs-1".into())), u64::MAX);
    }

    #[test]
    fn test_missing_title_column_skips_only_that_location() {
        let broken = stock("Mirpur", "Name,Stock\nRed Shirt,9\n");
        let ecom = stock("Ecom", "Title,Size,Stock\nRed Shirt,M,2\n");
        let agg = aggregate(&[broken, ecom]);

        assert_eq!(agg.warnings.len(), 1);
        assert_eq!(agg.warnings[0].location(), "Mirpur");
        assert!(matches!(
            agg.warnings[0],
            AggregationWarning::MissingTitleColumn { .. }
        ));

        let levels = agg.inventory.variant("red shirt - m").unwrap();
        assert_eq!(levels.get("Ecom"), Some(&2));
        // Skipped location is still a known, empty column
        assert_eq!(levels.get("Mirpur"), Some(&0));
    }

    #[test]
    fn test_unreadable_location_is_kept_empty() {
        let broken = LocationStock::unreadable("Mirpur", "missing.csv", "file not found");
        let ecom = stock("Ecom", "Title,Size,Stock\nRed Shirt,M,2\n");
        let agg = aggregate(&[ecom, broken]);

        assert_eq!(
            agg.warnings,
            vec![AggregationWarning::Unreadable {
                location: "Mirpur".into(),
                reason: "file not found".into(),
            }]
        );
        assert_eq!(agg.inventory.locations(), &["Ecom".to_string(), "Mirpur".to_string()]);
        let levels = agg.inventory.variant("red shirt - m").unwrap();
        assert_eq!(levels.get("Mirpur"), Some(&0));
    }

    #[test]
    fn test_missing_quantity_column_counts_zero() {
        let agg = aggregate(&[stock("Ecom", "Title,Size\nRed Shirt,M\n")]);

        assert_eq!(
            agg.warnings,
            vec![AggregationWarning::MissingQuantityColumn {
                location: "Ecom".into()
            }]
        );
        let levels = agg.inventory.variant("red shirt - m").unwrap();
        assert_eq!(levels.get("Ecom"), Some(&0));
    }

    #[test]
    fn test_sku_totals_and_index() {
        let csv = "Title,Size,Stock,SKU\nPanjabi Classic,L,3,PJ-100\nPanjabi Classic,XL,1,PJ-101\n";
        let agg = aggregate(&[stock("Ecom", csv)]);

        assert_eq!(agg.inventory.indexed_variant("pj-100"), Some("panjabi classic - l"));
        assert_eq!(agg.inventory.sku("pj-100").unwrap().get("Ecom"), Some(&3));
        assert_eq!(agg.inventory.total(&StockKey::Sku("pj-101".into())), 1);
    }

    #[test]
    fn test_sku_index_last_write_wins() {
        let ecom = stock("Ecom", "Title,Size,Stock,SKU\nRed Shirt,M,2,RS-1\n");
        let mirpur = stock("Mirpur", "Title,Size,Stock,SKU\nRed Shirt,L,1,RS-1\n");
        let agg = aggregate(&[ecom, mirpur]);

        assert_eq!(agg.inventory.indexed_variant("rs-1"), Some("red shirt - l"));
        // SKU totals still count both rows
        assert_eq!(agg.inventory.total(&StockKey::Sku("rs-1".into())), 3);
    }

    #[test]
    fn test_rows_without_title_are_ignored() {
        let agg = aggregate(&[stock("Ecom", "Title,Stock\n,5\nRed Shirt,1\n")]);
        assert_eq!(agg.inventory.variant_count(), 1);
    }

    #[test]
    fn test_parse_stock_quantity() {
        assert_eq!(parse_stock_quantity(&CellValue::Integer(4)), 4);
        assert_eq!(parse_stock_quantity(&CellValue::Float(2.9)), 2);
        assert_eq!(parse_stock_quantity(&CellValue::text("1,200")), 1200);
        assert_eq!(parse_stock_quantity(&CellValue::text(" 7.0 ")), 7);
        assert_eq!(parse_stock_quantity(&CellValue::text("n/a")), 0);
        assert_eq!(parse_stock_quantity(&CellValue::Empty), 0);
        assert_eq!(parse_stock_quantity(&CellValue::Integer(-3)), 0);
        assert_eq!(parse_stock_quantity(&CellValue::Float(f64::NAN)), 0);
    }
}
