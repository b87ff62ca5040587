//! `[images]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// One `<img id=...>` whose `src` is resolved against the root prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSlot {
    /// Element id inside the fragment.
    pub id: String,
    /// File stem under `images/`, without the `.png` extension.
    pub image: String,
}

impl ImageSlot {
    pub fn new(id: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image: image.into(),
        }
    }
}

/// `[images]` section in stitch.toml - header/footer image slots.
///
/// # Example
/// ```toml
/// [images]
/// fallback = "../../"
/// header = [
///     { id = "dtu-logo", image = "dtu-logo" },
///     { id = "x-icon", image = "x-icon" },
/// ]
/// footer = [{ id = "footer-dtu-logo", image = "dtu-logo" }]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ImagesConfig {
    /// Fixed relative prefix tried once when the computed path fails to load.
    #[serde(default = "defaults::images::fallback")]
    #[educe(Default = defaults::images::fallback())]
    pub fallback: String,

    #[serde(default = "defaults::images::header")]
    #[educe(Default = defaults::images::header())]
    pub header: Vec<ImageSlot>,

    #[serde(default = "defaults::images::footer")]
    #[educe(Default = defaults::images::footer())]
    pub footer: Vec<ImageSlot>,
}
