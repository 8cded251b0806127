//! Engine configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::common::ConsolidationError;

/// Holds raw engine config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
struct RawConsolidationConfig {
    pub algorithm: Option<String>,
}

/// Represents engine configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ConsolidationConfig {
    /// Consolidation algorithm config string,
    /// e.g. "SmallHostPreference" or "Base[interval=300]".
    pub algorithm: String,
}

impl ConsolidationConfig {
    /// Creates config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Result<Self, ConsolidationError> {
        let content = std::fs::read_to_string(file_name).map_err(|e| {
            ConsolidationError::InvalidInput(format!("can't read file {}: {}", file_name, e))
        })?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConsolidationError> {
        let raw: RawConsolidationConfig = serde_yaml::from_str(content)
            .map_err(|e| ConsolidationError::InvalidInput(format!("can't parse YAML: {}", e)))?;
        Ok(Self {
            algorithm: raw.algorithm.unwrap_or_else(|| "Dummy".to_string()),
        })
    }
}

/// Parses config value string, which consists of two parts - name and options.
/// Example: Base[interval=300] parts are name Base and options string "interval=300".
pub fn parse_config_value(config_str: &str) -> (String, Option<String>) {
    match config_str.split_once('[') {
        Some((l, r)) => (l.to_string(), Some(r.to_string().replace(']', ""))),
        None => (config_str.to_string(), None),
    }
}

/// Parses options string from config value, returns map with option names and values.
///
/// # Examples
///
/// ```rust
/// use vm_consolidation::core::config::parse_options;
///
/// let options = parse_options("option1=0.8,option2=something");
/// assert_eq!(options.get("option1").unwrap(), "0.8");
/// assert_eq!(options.get("option2").unwrap(), "something");
/// assert_eq!(options.get("option3"), None);
/// ```
pub fn parse_options(options_str: &str) -> HashMap<String, String> {
    let mut options = HashMap::new();
    for option_str in options_str.split(',') {
        if let Some((name, value)) = option_str.split_once('=') {
            options.insert(name.to_string(), value.to_string());
        }
    }
    options
}
