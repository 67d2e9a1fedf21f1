//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn title() -> String {
        "personal website".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn output() -> PathBuf {
        "_build".into()
    }

    pub fn sitemap() -> PathBuf {
        "sitemap_gen.toml".into()
    }

    pub fn assets() -> Vec<PathBuf> {
        vec!["favicon.ico".into(), "assets".into()]
    }

    pub fn layout() -> PathBuf {
        "layout.html".into()
    }

    pub fn source_ext() -> String {
        "page".into()
    }

    pub fn output_ext() -> String {
        "html".into()
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        8000
    }

    pub fn debounce_ms() -> u64 {
        50
    }
}
