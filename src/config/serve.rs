//! `[serve]` section configuration.
//!
//! `stitch serve` has no build step: each `.html` request is composed from
//! the site root when it arrives, so the only state worth watching is
//! `stitch.toml` itself.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[serve]` section in stitch.toml.
///
/// ```toml
/// [serve]
/// interface = "0.0.0.0"  # reachable from phones on the LAN
/// port = 5277            # next free port is tried when taken
/// watch = false          # keep the config read at startup
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// IP address to bind, checked by [`SiteConfig::validate`](super::SiteConfig::validate).
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// First port tried; up to ten consecutive ports are attempted.
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// Swap in a fresh config when stitch.toml changes and log edits under
    /// `components/`. Pages pick up fragment edits on the next request either way.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub watch: bool,
}
