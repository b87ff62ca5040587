//! stitch - compose static pages from shared html fragments.

use anyhow::Result;
use clap::Parser;
use stitch::{
    build::build_site,
    cli::Cli,
    config::{SiteConfig, cfg, init_config},
    serve::serve_site,
};

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    init_config(SiteConfig::load(cli)?);

    if cli.is_serve() {
        serve_site()
    } else {
        build_site(&cfg()).map(|_| ())
    }
}
