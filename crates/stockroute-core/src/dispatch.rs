//! Choosing which location ships each order
//!
//! Every group of lines (one customer order) is ideally shipped as a single
//! parcel. When no location can cover the whole order, locations are picked
//! greedily by how many of the remaining lines they cover. This is the
//! classic greedy set-cover approximation: deterministic and fast, but not
//! guaranteed to find the minimum number of parcels.

use crate::inventory::StockKey;
use crate::resolver::ResolvedLine;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Where a line should ship from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum DispatchSuggestion {
    /// Ship from this location
    Location(String),
    /// No grouping available, or nothing requested
    NotApplicable,
    /// No location can cover the line (out of stock or unmatched)
    Unfulfillable,
}

impl fmt::Display for DispatchSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchSuggestion::Location(name) => write!(f, "{}", name),
            DispatchSuggestion::NotApplicable => write!(f, "N/A"),
            DispatchSuggestion::Unfulfillable => write!(f, "OOS / No Match"),
        }
    }
}

/// Stock already promised per (location, stock key) within one group
type Ledger<'a> = HashMap<(&'a str, &'a StockKey), u64>;

/// Suggest a location for every line.
///
/// `locations` is the priority order used for tie-breaking. Lines without a
/// group, and lines requesting nothing, get [`DispatchSuggestion::NotApplicable`].
pub fn allocate(lines: &[ResolvedLine], locations: &[String]) -> Vec<DispatchSuggestion> {
    let mut suggestions = vec![DispatchSuggestion::NotApplicable; lines.len()];

    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, line) in lines.iter().enumerate() {
        if let Some(group) = line.line.group.as_deref() {
            if line.line.requested > 0 {
                groups.entry(group).or_default().push(idx);
            }
        }
    }

    for (group, members) in &groups {
        allocate_group(group, members, lines, locations, &mut suggestions);
    }

    suggestions
}

fn allocate_group(
    group: &str,
    members: &[usize],
    lines: &[ResolvedLine],
    locations: &[String],
    suggestions: &mut [DispatchSuggestion],
) {
    let empty = Ledger::new();

    // One parcel if any single location covers everything
    if let Some(loc) = locations
        .iter()
        .find(|loc| covered_by(loc, members, lines, &empty).len() == members.len())
    {
        tracing::debug!(group, location = %loc, lines = members.len(), "single parcel");
        for &idx in members {
            suggestions[idx] = DispatchSuggestion::Location(loc.clone());
        }
        return;
    }

    let mut remaining: Vec<usize> = members.to_vec();
    let mut ledger = Ledger::new();
    let mut parcels = 0usize;

    while !remaining.is_empty() {
        // Strictly greater keeps the earliest location on ties
        let mut best: Option<(&String, Vec<usize>)> = None;
        for loc in locations {
            let covered = covered_by(loc, &remaining, lines, &ledger);
            if covered.len() > best.as_ref().map_or(0, |(_, c)| c.len()) {
                best = Some((loc, covered));
            }
        }

        let Some((loc, covered)) = best else {
            for &idx in &remaining {
                suggestions[idx] = DispatchSuggestion::Unfulfillable;
            }
            tracing::debug!(group, unfulfillable = remaining.len(), "lines left without a location");
            break;
        };

        for &idx in &covered {
            suggestions[idx] = DispatchSuggestion::Location(loc.clone());
            if let Some(key) = &lines[idx].stock_key {
                let promised = ledger.entry((loc.as_str(), key)).or_insert(0);
                *promised = promised.saturating_add(lines[idx].line.requested);
            }
        }
        remaining.retain(|idx| !covered.contains(idx));
        parcels += 1;
    }

    tracing::debug!(group, parcels, "split across locations");
}

/// Lines (in order) that `location` can still ship, given stock already
/// promised in `ledger`. Lines sharing a stock key draw from the same units.
fn covered_by<'a>(
    location: &str,
    candidates: &[usize],
    lines: &'a [ResolvedLine],
    ledger: &Ledger<'_>,
) -> Vec<usize> {
    let mut taken: HashMap<&'a StockKey, u64> = HashMap::new();
    let mut covered = Vec::new();

    for &idx in candidates {
        let line = &lines[idx];
        let Some(key) = line.stock_key.as_ref() else {
            continue;
        };

        let promised = ledger.get(&(location, key)).copied().unwrap_or(0);
        let already = taken.get(key).copied().unwrap_or(0);
        let needed = line.line.requested;
        let required = promised.saturating_add(already).saturating_add(needed);

        if line.available_at(location) >= required {
            let held = taken.entry(key).or_insert(0);
            *held = held.saturating_add(needed);
            covered.push(idx);
        }
    }

    covered
}

/// Number of distinct shipping locations per group
pub fn parcel_counts(
    lines: &[ResolvedLine],
    suggestions: &[DispatchSuggestion],
) -> BTreeMap<String, usize> {
    let mut per_group: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (line, suggestion) in lines.iter().zip(suggestions) {
        if let (Some(group), DispatchSuggestion::Location(loc)) = (&line.line.group, suggestion) {
            let locs = per_group.entry(group.clone()).or_default();
            if !locs.contains(&loc.as_str()) {
                locs.push(loc);
            }
        }
    }

    per_group.into_iter().map(|(g, locs)| (g, locs.len())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{aggregate, Inventory, LocationStock};
    use crate::parser::parse_csv_str;
    use crate::resolver::{resolve_lines, OrderLine};

    fn inventory(locations: &[(&str, &str)]) -> Inventory {
        let sources: Vec<LocationStock> = locations
            .iter()
            .map(|(name, csv)| LocationStock::new(*name, parse_csv_str(csv, name).unwrap()))
            .collect();
        aggregate(&sources).inventory
    }

    fn red_shirt_inventory() -> Inventory {
        inventory(&[
            ("Ecom", "Title,Size,Stock\nRed Shirt,M,2\n"),
            ("Mirpur", "Title,Size,Stock\nRed Shirt,M,0\n"),
        ])
    }

    fn run(lines: Vec<OrderLine>, inv: &Inventory) -> (Vec<ResolvedLine>, Vec<DispatchSuggestion>) {
        let resolved = resolve_lines(&lines, inv);
        let suggestions = allocate(&resolved, inv.locations());
        (resolved, suggestions)
    }

    fn at(loc: &str) -> DispatchSuggestion {
        DispatchSuggestion::Location(loc.to_string())
    }

    #[test]
    fn test_no_groups_means_not_applicable() {
        let inv = red_shirt_inventory();
        let (_, suggestions) = run(vec![OrderLine::new(0, "Red Shirt - M")], &inv);

        assert_eq!(suggestions, vec![DispatchSuggestion::NotApplicable]);
        assert_eq!(suggestions[0].to_string(), "N/A");
    }

    #[test]
    fn test_single_location_covers_group() {
        let inv = red_shirt_inventory();
        let lines = vec![
            OrderLine::new(0, "Red Shirt - M").with_group("1001"),
            OrderLine::new(1, "Red Shirt - M").with_group("1001"),
        ];
        let (resolved, suggestions) = run(lines, &inv);

        assert_eq!(suggestions, vec![at("Ecom"), at("Ecom")]);
        assert_eq!(parcel_counts(&resolved, &suggestions).get("1001"), Some(&1));
    }

    #[test]
    fn test_shared_stock_is_not_double_counted() {
        let inv = red_shirt_inventory();
        let lines = vec![
            OrderLine::new(0, "Red Shirt - M").with_requested(2).with_group("1001"),
            OrderLine::new(1, "Red Shirt - M").with_requested(1).with_group("1001"),
        ];
        let (_, suggestions) = run(lines, &inv);

        assert_eq!(suggestions, vec![at("Ecom"), DispatchSuggestion::Unfulfillable]);
        assert_eq!(suggestions[1].to_string(), "OOS / No Match");
    }

    #[test]
    fn test_greedy_split_prefers_widest_coverage() {
        let inv = inventory(&[
            ("Ecom", "Title,Size,Stock\nRed Shirt,M,1\n"),
            (
                "Mirpur",
                "Title,Size,Stock\nBlue Shirt,L,1\nGreen Shirt,S,1\n",
            ),
        ]);
        let lines = vec![
            OrderLine::new(0, "Red Shirt - M").with_group("A"),
            OrderLine::new(1, "Blue Shirt - L").with_group("A"),
            OrderLine::new(2, "Green Shirt - S").with_group("A"),
        ];
        let (resolved, suggestions) = run(lines, &inv);

        assert_eq!(suggestions, vec![at("Ecom"), at("Mirpur"), at("Mirpur")]);
        assert_eq!(parcel_counts(&resolved, &suggestions).get("A"), Some(&2));
    }

    #[test]
    fn test_ties_follow_priority_order() {
        let inv = inventory(&[
            ("Ecom", "Title,Size,Stock\nRed Shirt,M,1\n"),
            ("Mirpur", "Title,Size,Stock\nRed Shirt,M,1\n"),
        ]);
        let lines = vec![
            OrderLine::new(0, "Red Shirt - M").with_group("A"),
            OrderLine::new(1, "Blue Shirt - L").with_group("A"),
        ];
        let resolved = resolve_lines(&lines, &inv);

        let suggestions = allocate(&resolved, inv.locations());
        assert_eq!(suggestions, vec![at("Ecom"), DispatchSuggestion::Unfulfillable]);

        let reversed = vec!["Mirpur".to_string(), "Ecom".to_string()];
        let suggestions = allocate(&resolved, &reversed);
        assert_eq!(suggestions, vec![at("Mirpur"), DispatchSuggestion::Unfulfillable]);
    }

    #[test]
    fn test_unmatched_lines_are_unfulfillable() {
        let inv = red_shirt_inventory();
        let lines = vec![
            OrderLine::new(0, "Red Shirt - M").with_group("A"),
            OrderLine::new(1, "Mystery Item").with_group("A"),
        ];
        let (_, suggestions) = run(lines, &inv);

        assert_eq!(suggestions, vec![at("Ecom"), DispatchSuggestion::Unfulfillable]);
    }

    #[test]
    fn test_huge_quantities_do_not_overflow() {
        let inv = inventory(&[
            ("Ecom", "Title,Size,Stock\nRed Shirt,M,1e30\n"),
            ("Mirpur", "Title,Size,Stock\nRed Shirt,M,5\n"),
        ]);
        let lines = vec![
            OrderLine::new(0, "Red Shirt - M").with_requested(u64::MAX).with_group("A"),
            OrderLine::new(1, "Red Shirt - M").with_requested(u64::MAX).with_group("A"),
        ];
        let (resolved, suggestions) = run(lines, &inv);

        assert_eq!(resolved[0].total_available, u64::MAX);
        assert_eq!(suggestions, vec![at("Ecom"), at("Ecom")]);
    }

    #[test]
    fn test_zero_requested_lines_are_left_out() {
        let inv = red_shirt_inventory();
        let lines = vec![
            OrderLine::new(0, "Red Shirt - M").with_requested(0).with_group("A"),
            OrderLine::new(1, "Red Shirt - M").with_group("A"),
        ];
        let (_, suggestions) = run(lines, &inv);

        assert_eq!(suggestions, vec![DispatchSuggestion::NotApplicable, at("Ecom")]);
    }

    #[test]
    fn test_assigned_location_always_has_stock() {
        let inv = inventory(&[
            ("Ecom", "Title,Size,Stock\nRed Shirt,M,3\nBlue Shirt,L,1\n"),
            ("Mirpur", "Title,Size,Stock\nRed Shirt,M,1\nBlue Shirt,L,5\n"),
        ]);
        let lines = vec![
            OrderLine::new(0, "Red Shirt - M").with_requested(2).with_group("A"),
            OrderLine::new(1, "Blue Shirt - L").with_requested(4).with_group("A"),
            OrderLine::new(2, "Red Shirt - M").with_requested(5).with_group("B"),
            OrderLine::new(3, "Blue Shirt - L").with_group("B"),
        ];
        let (resolved, suggestions) = run(lines, &inv);

        for (line, suggestion) in resolved.iter().zip(&suggestions) {
            if let DispatchSuggestion::Location(loc) = suggestion {
                assert!(line.available_at(loc) >= line.line.requested);
            }
        }
        assert_eq!(suggestions[2], DispatchSuggestion::Unfulfillable);
    }
}
