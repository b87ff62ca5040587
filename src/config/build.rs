//! `[build]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in stitch.toml - output of `stitch build`.
///
/// # Example
/// ```toml
/// [build]
/// output = "dist"
/// minify = true
/// skip = ["node_modules", ".git", "drafts"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Output directory, relative to the site root until normalized.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Minify composed pages.
    #[serde(default)]
    pub minify: bool,

    /// Remove the output directory before building.
    #[serde(default)]
    pub clean: bool,

    /// Directory names never walked into.
    #[serde(default = "defaults::build::skip")]
    #[educe(Default = defaults::build::skip())]
    pub skip: Vec<String>,
}
