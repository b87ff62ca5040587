//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [site] Section Defaults
// ============================================================================

pub mod site {
    pub fn markers() -> Vec<String> {
        vec!["website".into()]
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn skip() -> Vec<String> {
        vec!["node_modules".into(), ".git".into()]
    }
}

// ============================================================================
// [images] Section Defaults
// ============================================================================

pub mod images {
    use super::super::ImageSlot;

    pub fn fallback() -> String {
        "../../".into()
    }

    pub fn header() -> Vec<ImageSlot> {
        ["dtu-logo", "instagram-icon", "facebook-icon", "linkedin-icon", "x-icon"]
            .into_iter()
            .map(|name| ImageSlot::new(name, name))
            .collect()
    }

    pub fn footer() -> Vec<ImageSlot> {
        vec![ImageSlot::new("footer-dtu-logo", "dtu-logo")]
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
        5277
    }
}
