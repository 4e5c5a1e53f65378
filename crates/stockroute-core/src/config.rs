//! Run configuration files
//!
//! A run config names the product/order export, the stock exports in dispatch
//! priority order, and where to write the result.

use crate::error::{Error, Result};
use crate::scanner::LocationSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output format for the augmented table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Everything needed for one fulfillment run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Product/order export
    pub products: PathBuf,
    /// Stock exports; order is dispatch priority
    pub locations: Vec<LocationSource>,
    /// Output file; printed to stdout when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub format: OutputFormat,
}

impl RunConfig {
    pub fn new(products: impl Into<PathBuf>) -> Self {
        Self {
            products: products.into(),
            locations: Vec::new(),
            output: None,
            format: OutputFormat::default(),
        }
    }

    /// Append a location at the lowest priority
    pub fn add_location(&mut self, location: LocationSource) {
        self.locations.push(location);
    }

    /// Load a run config from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the run config to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!(" json ".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!(matches!(
            "xlsx".parse::<OutputFormat>(),
            Err(Error::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_run_config_serialization() {
        let mut config = RunConfig::new("orders.csv");
        config.add_location(LocationSource::new("Ecom", "stock/ecom.csv"));
        config.add_location(LocationSource::new("Mirpur", "stock/mirpur.csv"));
        config.format = OutputFormat::Json;

        let json = serde_json::to_string_pretty(&config).unwrap();
        let loaded: RunConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.locations[0].name, "Ecom");
        assert!(!json.contains("output"));
    }

    #[test]
    fn test_run_config_defaults() {
        let json = r#"{"products": "orders.csv", "locations": []}"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.format, OutputFormat::Csv);
        assert_eq!(config.output, None);
    }

    #[test]
    fn test_run_config_save_and_load() {
        let path = std::env::temp_dir().join(format!("stockroute-config-{}.json", std::process::id()));
        let mut config = RunConfig::new("orders.csv");
        config.output = Some(PathBuf::from("out.csv"));

        config.save(&path).unwrap();
        let loaded = RunConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        fs::remove_file(&path).unwrap();
    }
}
