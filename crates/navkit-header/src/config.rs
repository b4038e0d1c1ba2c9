//! Header configuration
//!
//! Every field has a default, so a JSON config only names what it
//! overrides. Page metadata can still redirect the fragment paths.

use serde::Deserialize;

use crate::breakpoint::Mode;
use crate::HeaderError;

/// Settings for the header and footer decorators
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Nav fragment path, overridden by `<meta name="nav">`
    pub nav_path: String,
    /// Footer fragment path, overridden by `<meta name="footer">`
    pub footer_path: String,
    /// Media condition that means "desktop"
    pub desktop_query: String,
    /// Mode used when the media condition cannot be watched
    pub fallback_mode: Mode,
    /// Regions the hamburger shows and hides, by element id
    pub hamburger_controls: Vec<String>,
    /// `title` for a brand link with no text
    pub brand_title: String,
    pub search: SearchConfig,
}

/// The lazily loaded search widget
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Directory holding `index.html`, `styles.css` and `scripts.js`
    pub base_path: String,
    /// Id of the generated form
    pub modal_id: String,
    /// Where a submitted query goes (`?q=` is appended)
    pub results_url: String,
    /// JSON list of suggested links
    pub suggestions_path: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            nav_path: "/nav".into(),
            footer_path: "/footer".into(),
            desktop_query: "(width >= 1200px)".into(),
            fallback_mode: Mode::Mobile,
            hamburger_controls: vec![
                "nav-sections".into(),
                "nav-language-picker".into(),
                "nav-support".into(),
            ],
            brand_title: "Home".into(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_path: "/blocks/header/search".into(),
            modal_id: "search-modal".into(),
            results_url: "https://www.ups.com/us/en/SearchResults.page".into(),
            suggestions_path: "/fragments/search-suggestions.json".into(),
        }
    }
}

impl HeaderConfig {
    /// Parse a JSON config; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, HeaderError> {
        serde_json::from_str(json).map_err(|e| HeaderError::Config(e.to_string()))
    }
}
