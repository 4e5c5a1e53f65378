//! stockroute-core: Stock matching and parcel dispatch for apparel orders
//!
//! This library provides functionality to:
//! - Parse order and per-location stock exports into structured tables
//! - Normalize product identity (title, size, SKU) across differently-shaped exports
//! - Aggregate location stock into a variant -> location -> quantity lookup
//! - Resolve each ordered line to a variant and classify its fulfillment
//! - Suggest which location(s) should ship each order, preferring one parcel

pub mod columns;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod inventory;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod scanner;
pub mod table;
pub mod variant;

pub use columns::{find_group_column, identify_columns, ColumnRoles};
pub use config::{OutputFormat, RunConfig};
pub use dispatch::{allocate, DispatchSuggestion};
pub use error::{Error, Result};
pub use export::{export_report, write_csv, write_json, write_report};
pub use inventory::{aggregate, Aggregation, AggregationWarning, Inventory, LocationStock, StockKey};
pub use normalize::{normalize_key, normalize_size, NO_SIZE};
pub use parser::{parse_csv, parse_csv_str};
pub use pipeline::{fulfill, load_location_tables, run, FulfillmentReport};
pub use resolver::{
    resolve_line, resolve_lines, Fulfillment, MatchStatus, MatchStrategy, OrderLine, ResolvedLine,
};
pub use scanner::{discover_locations, LocationSource};
pub use table::{CellValue, Column, Row, Table};
pub use variant::{build_key, parse_item_name};
