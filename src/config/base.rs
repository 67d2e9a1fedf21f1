//! `[base]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in quire.toml - site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "personal website"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site name, appended to every page title by the default layout.
    #[serde(default = "defaults::base::title")]
    #[educe(Default = defaults::base::title())]
    pub title: String,
}

impl BaseConfig {
    /// Compose the document title for a page.
    ///
    /// `"About"` on site `"notes"` → `"About - notes"`.
    pub fn page_title(&self, page_title: &str) -> String {
        match (page_title.is_empty(), self.title.is_empty()) {
            (true, _) => self.title.clone(),
            (false, true) => page_title.to_owned(),
            (false, false) => format!("{page_title} - {}", self.title),
        }
    }
}
