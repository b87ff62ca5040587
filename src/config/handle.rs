//! Global config with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement, so the
//! dev server can pick up `stitch.toml` edits between requests.
//!
//! ```text
//!   request threads            watcher thread
//!        │                           │
//!      cfg() ◀── ArcSwap<SiteConfig> ◀── reload_config()
//!   (lock-free)                (atomic replace)
//! ```

use super::SiteConfig;
use anyhow::{Result, anyhow};
use arc_swap::ArcSwap;
use rustc_hash::FxHasher;
use std::{
    fs,
    hash::{Hash, Hasher},
    sync::{
        Arc, LazyLock,
        atomic::{AtomicU64, Ordering},
    },
};

/// Initialized with the default config, replaced with the loaded one in main.
pub static CONFIG: LazyLock<ArcSwap<SiteConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(SiteConfig::default()));

/// Hash of the config file content behind the current `CONFIG`.
static CONFIG_HASH: AtomicU64 = AtomicU64::new(0);

/// Get current config as `Arc<SiteConfig>`. Wait-free.
#[inline]
pub fn cfg() -> Arc<SiteConfig> {
    CONFIG.load_full()
}

fn content_hash(content: &str) -> u64 {
    let mut hasher = FxHasher::default();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Initialize global config (called once at startup).
pub fn init_config(config: SiteConfig) {
    if let Ok(content) = fs::read_to_string(&config.config_path) {
        CONFIG_HASH.store(content_hash(&content), Ordering::Relaxed);
    }
    CONFIG.store(Arc::new(config));
}

/// Re-read stitch.toml and swap it in.
///
/// Returns `Ok(false)` when the file content is unchanged since the last load.
/// Readers holding the previous `Arc` keep a consistent view until they drop it.
pub fn reload_config() -> Result<bool> {
    let current = cfg();
    let cli = current
        .cli
        .ok_or_else(|| anyhow!("config was never initialized from the command line"))?;

    let content = fs::read_to_string(&current.config_path)?;
    let new_hash = content_hash(&content);
    if new_hash == CONFIG_HASH.load(Ordering::Relaxed) {
        return Ok(false);
    }

    let new_config = SiteConfig::load(cli)?;
    CONFIG.store(Arc::new(new_config));
    CONFIG_HASH.store(new_hash, Ordering::Relaxed);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_changes_with_content() {
        assert_eq!(content_hash("[serve]"), content_hash("[serve]"));
        assert_ne!(content_hash("port = 1"), content_hash("port = 2"));
    }
}
