//! Variant keys: the case-folded `title - size` identity shared by orders and stock

use crate::normalize::{fold, normalize_key, normalize_key_str, normalize_size_str, NO_SIZE};
use crate::table::CellValue;

/// Separator between title and size in product names
pub const SIZE_SEPARATOR: &str = " - ";

/// Split a free-text item name like `"Red Shirt - M"` into `(title, size)`.
///
/// Titles may contain hyphens themselves, so the split happens at the last
/// separator. When no usable size follows it the whole name is the title and
/// the size is [`NO_SIZE`].
pub fn parse_item_name(name: &CellValue) -> (String, String) {
    let s = normalize_key(name);
    if s.is_empty() {
        return (String::new(), NO_SIZE.to_string());
    }

    if let Some((left, right)) = s.rsplit_once(SIZE_SEPARATOR) {
        let title = left.trim();
        let size = normalize_size_str(right);
        if !title.is_empty() && size != NO_SIZE {
            return (title.to_string(), size);
        }
    }

    (s.trim().to_string(), NO_SIZE.to_string())
}

/// Build the comparison key for a title and size.
///
/// Returns an empty string when the title is empty; callers treat that as
/// "no identity" and never match on it.
pub fn build_key(title: &str, size: &str) -> String {
    let title = normalize_key_str(title);
    if title.is_empty() {
        return String::new();
    }

    let size = normalize_size_str(size);
    if size == NO_SIZE {
        fold(&title)
    } else {
        fold(&format!("{title}{SIZE_SEPARATOR}{size}"))
    }
}

/// Key for a single item-name cell, e.g. an order line
pub fn item_key(name: &CellValue) -> String {
    let (title, size) = parse_item_name(name);
    build_key(&title, &size)
}
