//! Interception configuration

use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptConfig {
    /// Take over link clicks
    pub links: bool,
    /// Take over form submissions
    pub forms: bool,
    /// Refresh on back/forward when a history state is present
    pub popstate: bool,
    /// Delegation selector for links
    pub link_selector: String,
    /// Delegation selector for forms
    pub form_selector: String,
}

impl InterceptConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for InterceptConfig {
    fn default() -> Self {
        Self {
            links: true,
            forms: true,
            popstate: true,
            link_selector: "a[href]".to_string(),
            form_selector: "form[action]".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InterceptConfig::default();
        assert!(config.links && config.forms && config.popstate);
        assert_eq!(config.link_selector, "a[href]");
        assert_eq!(config.form_selector, "form[action]");
    }

    #[test]
    fn test_from_json() {
        let config =
            InterceptConfig::from_json(r#"{ "forms": false, "link_selector": "a[data-nav]" }"#)
                .unwrap();
        assert!(!config.forms);
        assert!(config.links);
        assert_eq!(config.link_selector, "a[data-nav]");
        assert_eq!(config.form_selector, "form[action]");
    }
}
