//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Compose static pages from shared html fragments
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Site root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to the site root
    #[arg(short = 'C', long, default_value = "stitch.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compose every page of the site into the output directory
    Build {
        /// Output directory path (relative to site root)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Remove the output directory before building
        #[arg(long)]
        clean: bool,

        /// Minify the composed html
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        minify: Option<bool>,
    },

    /// Serve the site, composing each page on request
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Reload stitch.toml when it changes
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },
}

impl Cli {
    /// Whether the subcommand runs the dev server rather than a build.
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::parse_from(["stitch", "-r", "site", "build", "--clean", "-m"]);
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert_eq!(cli.config, PathBuf::from("stitch.toml"));
        assert!(!cli.is_serve());
        match cli.command {
            Commands::Build { clean, minify, output } => {
                assert!(clean);
                assert_eq!(minify, Some(true));
                assert_eq!(output, None);
            }
            Commands::Serve { .. } => panic!("expected build"),
        }
    }

    #[test]
    fn test_parse_serve_flags() {
        let cli = Cli::parse_from(["stitch", "serve", "-p", "8080", "--watch=false"]);
        assert!(cli.is_serve());
        match cli.command {
            Commands::Serve { port, watch, interface } => {
                assert_eq!(port, Some(8080));
                assert_eq!(watch, Some(false));
                assert_eq!(interface, None);
            }
            Commands::Build { .. } => panic!("expected serve"),
        }
    }
}
