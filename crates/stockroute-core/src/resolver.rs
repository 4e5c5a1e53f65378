//! Matching order lines against the inventory and classifying fulfillment
//!
//! Most products are matched name-first: the variant key parsed from the item
//! name is looked up directly and the SKU only confirms it (or stands in when
//! the name is unknown). Categories listed in [`STRICT_CATEGORIES`] are matched
//! SKU-first instead, and never fall back to the name.

use crate::columns::ColumnRoles;
use crate::inventory::{parse_number, Inventory, StockKey};
use crate::normalize::{fold, normalize_key, NO_SIZE};
use crate::table::{CellValue, Row, Table};
use crate::variant::{build_key, parse_item_name};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Requested quantity when the order does not say (or says nonsense)
pub const DEFAULT_REQUESTED: u64 = 1;

/// How a line's identity is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// Variant key first, SKU as confirmation or fallback
    NameFirst,
    /// SKU must be indexed and bound to the line's own variant key
    SkuFirstStrict,
}

/// A product category that overrides the default strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductCategory {
    /// Case-insensitive keyword looked for in the parsed title
    pub keyword: &'static str,
    /// Label used in match status text
    pub label: &'static str,
    pub strategy: MatchStrategy,
}

/// Categories whose names collide across size/style variants in the source
/// data, so identity is anchored to the SKU.
pub const STRICT_CATEGORIES: &[ProductCategory] = &[ProductCategory {
    keyword: "panjabi",
    label: "Panjabi",
    strategy: MatchStrategy::SkuFirstStrict,
}];

/// Category of a product title, if it has one
pub fn classify(title: &str) -> Option<&'static ProductCategory> {
    let title = fold(title);
    STRICT_CATEGORIES.iter().find(|c| title.contains(c.keyword))
}

/// One row of the order/product table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Row index in the product table
    pub row: usize,
    /// Item name, usually "Title - Size"
    pub item_name: CellValue,
    /// Size from a dedicated column, used when the name carries none
    pub size: CellValue,
    pub sku: CellValue,
    pub requested: u64,
    /// Order number or phone that ties lines into one parcel decision
    pub group: Option<String>,
}

impl OrderLine {
    pub fn new(row: usize, item_name: impl Into<String>) -> Self {
        Self {
            row,
            item_name: CellValue::parse(&item_name.into()),
            size: CellValue::Empty,
            sku: CellValue::Empty,
            requested: DEFAULT_REQUESTED,
            group: None,
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = CellValue::parse(&sku.into());
        self
    }

    pub fn with_requested(mut self, requested: u64) -> Self {
        self.requested = requested;
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Variant key from the item name (and size column, if any)
    pub fn name_key(&self) -> String {
        let (title, size) = parse_item_name(&self.item_name);
        if size == NO_SIZE && !self.size.is_empty() {
            return build_key(&title, &self.size.to_string_value());
        }
        build_key(&title, &size)
    }

    /// Normalized, case-folded SKU, `None` when blank
    pub fn sku_key(&self) -> Option<String> {
        let sku = normalize_key(&self.sku);
        (!sku.is_empty()).then(|| fold(&sku))
    }
}

/// Read every row of the product table as an order line.
///
/// Missing quantity cells fall back to [`DEFAULT_REQUESTED`]; rows without a
/// group value get no group.
pub fn extract_order_lines(
    table: &Table,
    roles: &ColumnRoles,
    group_col: Option<usize>,
) -> Vec<OrderLine> {
    let cell = |row: &Row, col: Option<usize>| {
        col.and_then(|c| row.get(c)).cloned().unwrap_or(CellValue::Empty)
    };

    table
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let group = normalize_key(&cell(row, group_col));
            OrderLine {
                row: idx,
                item_name: cell(row, roles.title),
                size: cell(row, roles.size),
                sku: cell(row, roles.sku),
                requested: requested_quantity(roles.quantity.and_then(|c| row.get(c))),
                group: (!group.is_empty()).then_some(group),
            }
        })
        .collect()
}

/// Requested quantity of a line, defaulting to 1 when absent, unparseable or negative
pub fn requested_quantity(cell: Option<&CellValue>) -> u64 {
    match cell.and_then(parse_number) {
        Some(f) if f >= 0.0 => f.floor() as u64,
        _ => DEFAULT_REQUESTED,
    }
}

/// Outcome of matching one line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchStatus {
    /// Name found and the SKU points at the same variant
    PerfectMatch,
    /// Name found, SKU points elsewhere; the name wins
    KeySkuMismatch { indexed: String },
    /// Name found, SKU unknown to the inventory
    KeySkuNotIndexed,
    /// Name found, line has no SKU
    KeyNoSku,
    /// Name unknown, matched through the SKU index
    SkuOnly { indexed: String },
    /// SKU indexed and bound to the line's own variant
    StrictMatch { category: String },
    /// SKU indexed but bound to another variant
    StrictNameMismatch {
        category: String,
        line_key: String,
        indexed: String,
    },
    StrictSkuNotIndexed { category: String },
    StrictNoSku { category: String },
    NoMatch,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::PerfectMatch => write!(f, "Perfect Match (Key + SKU)"),
            MatchStatus::KeySkuMismatch { indexed } => {
                write!(f, "Key Match (SKU mismatch -> {indexed})")
            }
            MatchStatus::KeySkuNotIndexed => write!(f, "Key Match (SKU not in Inv)"),
            MatchStatus::KeyNoSku => write!(f, "Key Match (No SKU in Product)"),
            MatchStatus::SkuOnly { indexed } => {
                write!(f, "SKU Match Only (Name mismatch -> {indexed})")
            }
            MatchStatus::StrictMatch { category } => {
                write!(f, "Perfect Match (SKU + Name) [{category}]")
            }
            MatchStatus::StrictNameMismatch {
                category,
                line_key,
                indexed,
            } => write!(
                f,
                "{category} SKU Match, Name Mismatch (PL: {line_key} vs INV: {indexed})"
            ),
            MatchStatus::StrictSkuNotIndexed { category } => {
                write!(f, "{category} SKU not in Inventory")
            }
            MatchStatus::StrictNoSku { category } => write!(f, "{category} No SKU in Product"),
            MatchStatus::NoMatch => write!(f, "No Match"),
        }
    }
}

/// Whether the available stock covers the requested quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Fulfillment {
    NoMatch,
    OutOfStock,
    Available,
    Partial { available: u64, requested: u64 },
}

impl fmt::Display for Fulfillment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fulfillment::NoMatch => write!(f, "No Match"),
            Fulfillment::OutOfStock => write!(f, "Out of Stock"),
            Fulfillment::Available => write!(f, "Available"),
            Fulfillment::Partial {
                available,
                requested,
            } => write!(f, "Partial ({available}/{requested})"),
        }
    }
}

/// Classify fulfillment for a line.
///
/// Zero total stock is "Out of Stock" even when nothing was requested.
pub fn classify_fulfillment(matched: bool, available: u64, requested: u64) -> Fulfillment {
    if !matched {
        Fulfillment::NoMatch
    } else if available == 0 {
        Fulfillment::OutOfStock
    } else if available >= requested {
        Fulfillment::Available
    } else {
        Fulfillment::Partial {
            available,
            requested,
        }
    }
}

/// Stock of a resolved line at one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationQuantity {
    pub location: String,
    pub quantity: u64,
}

/// An order line with its match, stock snapshot and fulfillment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLine {
    pub line: OrderLine,
    pub status: MatchStatus,
    /// Variant key the line resolved to
    pub resolved_key: Option<String>,
    /// Totals the stock snapshot was read from
    pub stock_key: Option<StockKey>,
    /// Stock per known location, in priority order
    pub stock: Vec<LocationQuantity>,
    pub total_available: u64,
    pub fulfillment: Fulfillment,
}

impl ResolvedLine {
    pub fn is_matched(&self) -> bool {
        self.stock_key.is_some()
    }

    /// Stock visible to this line at `location`
    pub fn available_at(&self, location: &str) -> u64 {
        self.stock
            .iter()
            .find(|s| s.location == location)
            .map(|s| s.quantity)
            .unwrap_or(0)
    }
}

struct Resolution {
    status: MatchStatus,
    resolved_key: Option<String>,
    stock_key: Option<StockKey>,
}

impl Resolution {
    fn unmatched(status: MatchStatus) -> Self {
        Self {
            status,
            resolved_key: None,
            stock_key: None,
        }
    }
}

/// Resolve one order line against the inventory
pub fn resolve_line(line: &OrderLine, inventory: &Inventory) -> ResolvedLine {
    let name_key = line.name_key();
    let sku_key = line.sku_key();
    let (title, _) = parse_item_name(&line.item_name);

    let resolution = match classify(&title) {
        Some(category) if category.strategy == MatchStrategy::SkuFirstStrict => {
            resolve_sku_first(category, &name_key, sku_key.as_deref(), inventory)
        }
        _ => resolve_name_first(&name_key, sku_key.as_deref(), inventory),
    };

    let stock: Vec<LocationQuantity> = inventory
        .locations()
        .iter()
        .map(|loc| LocationQuantity {
            location: loc.clone(),
            quantity: resolution
                .stock_key
                .as_ref()
                .map(|k| inventory.available_at(k, loc))
                .unwrap_or(0),
        })
        .collect();

    let total_available = resolution
        .stock_key
        .as_ref()
        .map(|k| inventory.total(k))
        .unwrap_or(0);

    let fulfillment = classify_fulfillment(
        resolution.stock_key.is_some(),
        total_available,
        line.requested,
    );

    ResolvedLine {
        line: line.clone(),
        status: resolution.status,
        resolved_key: resolution.resolved_key,
        stock_key: resolution.stock_key,
        stock,
        total_available,
        fulfillment,
    }
}

/// Resolve every line in order
pub fn resolve_lines(lines: &[OrderLine], inventory: &Inventory) -> Vec<ResolvedLine> {
    lines.iter().map(|l| resolve_line(l, inventory)).collect()
}

fn resolve_name_first(name_key: &str, sku_key: Option<&str>, inventory: &Inventory) -> Resolution {
    if !name_key.is_empty() && inventory.contains_variant(name_key) {
        let status = match sku_key {
            Some(sku) => match inventory.indexed_variant(sku) {
                Some(indexed) if indexed == name_key => MatchStatus::PerfectMatch,
                Some(indexed) => {
                    tracing::debug!(name_key, sku, indexed, "SKU points at another variant, name wins");
                    MatchStatus::KeySkuMismatch {
                        indexed: indexed.to_string(),
                    }
                }
                None => MatchStatus::KeySkuNotIndexed,
            },
            None => MatchStatus::KeyNoSku,
        };

        return Resolution {
            status,
            resolved_key: Some(name_key.to_string()),
            stock_key: Some(StockKey::Variant(name_key.to_string())),
        };
    }

    if let Some((sku, indexed)) = sku_key.and_then(|s| inventory.indexed_variant(s).map(|i| (s, i))) {
        tracing::debug!(name_key, sku, indexed, "name unknown, matched by SKU");
        return Resolution {
            status: MatchStatus::SkuOnly {
                indexed: indexed.to_string(),
            },
            resolved_key: Some(indexed.to_string()),
            stock_key: Some(StockKey::Variant(indexed.to_string())),
        };
    }

    Resolution::unmatched(MatchStatus::NoMatch)
}

fn resolve_sku_first(
    category: &ProductCategory,
    name_key: &str,
    sku_key: Option<&str>,
    inventory: &Inventory,
) -> Resolution {
    let category_label = category.label.to_string();

    let Some(sku) = sku_key else {
        return Resolution::unmatched(MatchStatus::StrictNoSku {
            category: category_label,
        });
    };

    match inventory.indexed_variant(sku) {
        Some(indexed) if indexed == name_key => Resolution {
            status: MatchStatus::StrictMatch {
                category: category_label,
            },
            resolved_key: Some(name_key.to_string()),
            stock_key: Some(StockKey::Sku(sku.to_string())),
        },
        Some(indexed) => {
            tracing::debug!(name_key, sku, indexed, "strict SKU bound to another variant");
            Resolution::unmatched(MatchStatus::StrictNameMismatch {
                category: category_label,
                line_key: name_key.to_string(),
                indexed: indexed.to_string(),
            })
        }
        None => Resolution::unmatched(MatchStatus::StrictSkuNotIndexed {
            category: category_label,
        }),
    }
}
