//! Site configuration management for `stitch.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `[site]`    | Root markers used to compute page depth        |
//! | `[build]`   | Output directory, minify, skipped directories  |
//! | `[images]`  | Header/footer image slots and fallback prefix  |
//! | `[serve]`   | Development server (port, interface, watch)    |
//!
//! Every section is optional; a site without `stitch.toml` builds with defaults.
//!
//! # Example
//!
//! ```toml
//! [site]
//! markers = ["dtu-website"]
//!
//! [build]
//! output = "public"
//! minify = true
//!
//! [serve]
//! port = 5277
//! ```

mod build;
pub mod defaults;
mod error;
mod handle;
mod images;
mod serve;
mod site;

pub use error::ConfigError;
pub use handle::{cfg, init_config, reload_config};
pub use images::{ImageSlot, ImagesConfig};

use build::BuildConfig;
use serve::ServeConfig;
use site::SiteSection;

use crate::cli::{Cli, Commands};
use anyhow::Result;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    net::IpAddr,
    path::{Path, PathBuf},
};

/// Root configuration structure representing stitch.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Absolute site root (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub site: SiteSection,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub images: ImagesConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load `stitch.toml` for the given CLI invocation, apply CLI overrides,
    /// normalize paths and validate.
    ///
    /// A missing config file is not an error: the defaults describe a plain
    /// static site with `components/` and `images/` at its root.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        if self.root.as_os_str().is_empty() {
            Path::new("./")
        } else {
            &self.root
        }
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);

        let root = Self::normalize_path(cli.root.as_deref().unwrap_or(Path::new("./")));
        self.config_path = Self::normalize_path(&root.join(&cli.config));

        match &cli.command {
            Commands::Build {
                output,
                clean,
                minify,
            } => {
                Self::update_option(&mut self.build.output, output.as_ref());
                Self::update_option(&mut self.build.minify, minify.as_ref());
                self.build.clean |= *clean;
            }
            Commands::Serve {
                interface,
                port,
                watch,
            } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.watch, watch.as_ref());
            }
        }

        self.build.output = Self::normalize_path(&root.join(&self.build.output));
        self.root = root;
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.serve.interface.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "[serve.interface] `{}` is not an IP address",
                self.serve.interface
            ))
            .into());
        }

        if !self.root.as_os_str().is_empty() && self.build.output == self.root {
            return Err(
                ConfigError::Validation("[build.output] must not be the site root".into()).into(),
            );
        }

        let slots = self.images.header.iter().chain(&self.images.footer);
        for slot in slots {
            if slot.id.trim().is_empty() || slot.image.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "[images] slots need a non-empty `id` and `image`".into(),
                )
                .into());
            }
        }

        Ok(())
    }
}
