//! Discovery of location stock exports

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A location and the stock export that describes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSource {
    /// Location name (e.g., "Ecom", "Mirpur")
    pub name: String,
    /// Path to the stock CSV
    pub path: PathBuf,
}

impl LocationSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Parse a command-line location of the form `NAME=PATH`
    pub fn parse_spec(spec: &str) -> Result<Self> {
        match spec.split_once('=') {
            Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
                Ok(Self::new(name.trim(), path.trim()))
            }
            _ => Err(Error::InvalidLocationSpec(spec.to_string())),
        }
    }
}

/// Find every CSV under `root`; each file is one location named after its stem.
///
/// Results are sorted by name so the priority order is stable between runs.
pub fn discover_locations<P: AsRef<Path>>(root: P) -> Result<Vec<LocationSource>> {
    let mut sources = Vec::new();

    for entry in WalkDir::new(root.as_ref()).follow_links(true) {
        let entry = entry?;
        let path = entry.path();

        if !entry.file_type().is_file() {
            continue;
        }

        // Only process CSV files
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                sources.push(LocationSource::new(stem, path));
            }
        }
    }

    sources.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
    tracing::debug!(root = %root.as_ref().display(), found = sources.len(), "discovered locations");

    Ok(sources)
}
