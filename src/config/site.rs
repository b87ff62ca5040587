//! `[site]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[site]` section in stitch.toml - how pages locate the site root.
///
/// # Example
/// ```toml
/// [site]
/// markers = ["dtu-website", "website"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Path segments that identify the site root inside a longer URL path,
    /// matched case-insensitively as substrings. The last matching segment wins.
    #[serde(default = "defaults::site::markers")]
    #[educe(Default = defaults::site::markers())]
    pub markers: Vec<String>,
}
