//! Application configuration

use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Match mount prefixes byte for byte instead of ASCII case-insensitively
    pub case_sensitive_routing: bool,
    /// Publish the first constructed application as the global root
    pub publish_global: bool,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            case_sensitive_routing: false,
            publish_global: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json(r#"{ "case_sensitive_routing": true }"#).unwrap();
        assert!(config.case_sensitive_routing);
        assert!(config.publish_global);
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(Config::from_json("{ nope").is_err());
    }
}
