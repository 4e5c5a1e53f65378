//! Header heuristics for locating the columns each stage needs
//!
//! Exports from different shops name their columns freely ("Item Name",
//! "Product Title", "Qty", "Stock on hand"...), so roles are found by
//! case-insensitive substring matching over the header, first match wins.

use crate::table::Table;
use serde::{Deserialize, Serialize};

const SIZE_HINTS: &[&str] = &["size"];
const QUANTITY_HINTS: &[&str] = &["quantity", "qty", "stock"];
const ITEM_NAME_HINTS: &[&str] = &["item name", "product name"];
const TITLE_HINTS: &[&str] = &["title"];
const SKU_HINTS: &[&str] = &["sku"];

const ORDER_HINTS: &[&str] = &["order number", "order no", "order no.", "order #", "order id", "order"];
const PHONE_HINTS: &[&str] = &["phone", "phone number", "mobile", "contact"];

/// Column indices for each semantic role found in a table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    pub title: Option<usize>,
    pub size: Option<usize>,
    pub quantity: Option<usize>,
    pub sku: Option<usize>,
}

impl ColumnRoles {
    /// A table without a title column cannot be matched against anything
    pub fn is_matchable(&self) -> bool {
        self.title.is_some()
    }
}

/// Identify the title, size, quantity and SKU columns of a table.
///
/// An item/product name column is preferred over a generic title column.
pub fn identify_columns(table: &Table) -> ColumnRoles {
    let headers = lowered_headers(table);

    ColumnRoles {
        title: first_containing(&headers, ITEM_NAME_HINTS)
            .or_else(|| first_containing(&headers, TITLE_HINTS)),
        size: first_containing(&headers, SIZE_HINTS),
        quantity: first_containing(&headers, QUANTITY_HINTS),
        sku: first_containing(&headers, SKU_HINTS),
    }
}

/// Find a column that groups rows into one customer order.
///
/// An exact "Order Number" header wins, then any order-like header, then any
/// phone-like header. Within a tier, hints are tried in order and the first
/// header containing the hint is taken.
pub fn find_group_column(table: &Table) -> Option<usize> {
    let headers = lowered_headers(table);

    if let Some(idx) = headers.iter().position(|h| h == "order number") {
        return Some(idx);
    }

    ORDER_HINTS
        .iter()
        .chain(PHONE_HINTS)
        .find_map(|hint| headers.iter().position(|h| h.contains(hint)))
}

fn lowered_headers(table: &Table) -> Vec<String> {
    table
        .columns
        .iter()
        .map(|c| c.name.trim().to_lowercase())
        .collect()
}

/// First header (in header order) containing any of the hints
fn first_containing(headers: &[String], hints: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| hints.iter().any(|hint| h.contains(hint)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_csv_str;

    fn table(header: &str) -> Table {
        parse_csv_str(&format!("{header}\n"), "t.csv").unwrap()
    }

    #[test]
    fn test_identify_stock_columns() {
        let roles = identify_columns(&table("Title,Variant Size,Stock On Hand,SKU Code"));

        assert_eq!(roles.title, Some(0));
        assert_eq!(roles.size, Some(1));
        assert_eq!(roles.quantity, Some(2));
        assert_eq!(roles.sku, Some(3));
        assert!(roles.is_matchable());
    }

    #[test]
    fn test_item_name_preferred_over_title() {
        let roles = identify_columns(&table("Page Title,Product Name,Qty"));
        assert_eq!(roles.title, Some(1));

        let roles = identify_columns(&table("Title,Item Name"));
        assert_eq!(roles.title, Some(1));
    }

    #[test]
    fn test_first_match_wins_per_role() {
        let roles = identify_columns(&table("Quantity,Stock,Qty"));
        assert_eq!(roles.quantity, Some(0));
    }

    #[test]
    fn test_missing_roles() {
        let roles = identify_columns(&table("Name,Amount"));
        assert_eq!(roles, ColumnRoles::default());
        assert!(!roles.is_matchable());
    }

    #[test]
    fn test_group_column_exact_order_number_first() {
        let t = table("Order ID,Phone,ORDER NUMBER");
        assert_eq!(find_group_column(&t), Some(2));
    }

    #[test]
    fn test_group_column_order_synonyms_before_phone() {
        assert_eq!(find_group_column(&table("Phone,Order No.,Item Name")), Some(1));
        assert_eq!(find_group_column(&table("Customer,Mobile,Item Name")), Some(1));
        assert_eq!(find_group_column(&table("Item Name,Quantity")), None);
    }
}
