//! Static build: compose every page of the site ahead of time.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── collect_files()  ── walk root, skip [build.skip] + output dir
//!     │
//!     └── rayon::join
//!             ├── pages  ── par_iter ── bootstrap ── minify ── write
//!             └── assets ── par_iter ── copy
//! ```
//!
//! Pages are every `.html` file outside `components/`. Each page is composed
//! with the path context of its own location, exactly as a browser would
//! compose it when served from the root.

use crate::{
    bootstrap::Bootstrapper,
    config::SiteConfig,
    fragment::{FsSource, page_dir},
    log,
    path::PathContext,
    utils::{log::ProgressBars, minify::minify_page},
};
use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};
use walkdir::{DirEntry, WalkDir};

/// Directory holding the shared fragments; never composed as pages.
pub const COMPONENTS_DIR: &str = "components";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub pages: usize,
    pub assets: usize,
    /// Fragments that failed to load or were malformed, over all pages.
    pub failed_fragments: usize,
}

/// Build the entire site into `[build.output]`.
///
/// If `config.build.clean` is true, clears the output directory first.
pub fn build_site(config: &SiteConfig) -> Result<BuildSummary> {
    let root = config.get_root();
    let output = &config.build.output;

    if config.build.clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;

    let (pages, assets): (Vec<_>, Vec<_>) = collect_files(config)
        .into_iter()
        .partition(|path| path.strip_prefix(root).is_ok_and(is_page));

    log!("build"; "composing {} pages", pages.len());
    let progress = ProgressBars::new(&[("pages", pages.len()), ("assets", assets.len())]);

    let has_error = AtomicBool::new(false);
    let failed_fragments = AtomicUsize::new(0);

    let (pages_result, assets_result) = rayon::join(
        || {
            pages.par_iter().try_for_each(|path| {
                if has_error.load(Ordering::Relaxed) {
                    return Err(anyhow!("Aborted"));
                }
                match compose_page(path, config) {
                    Ok(failed) => {
                        failed_fragments.fetch_add(failed, Ordering::Relaxed);
                        progress.inc_by_name("pages");
                        Ok(())
                    }
                    Err(e) => {
                        if !has_error.swap(true, Ordering::Relaxed) {
                            log!("error"; "{}: {:#}", path.display(), e);
                        }
                        Err(anyhow!("Build failed"))
                    }
                }
            })
        },
        || {
            assets.par_iter().try_for_each(|path| {
                if has_error.load(Ordering::Relaxed) {
                    return Err(anyhow!("Aborted"));
                }
                if let Err(e) = copy_asset(path, config) {
                    if !has_error.swap(true, Ordering::Relaxed) {
                        log!("error"; "{}: {:#}", path.display(), e);
                    }
                    return Err(anyhow!("Build failed"));
                }
                progress.inc_by_name("assets");
                Ok(())
            })
        },
    );

    progress.finish();
    pages_result?;
    assets_result?;

    let summary = BuildSummary {
        pages: pages.len(),
        assets: assets.len(),
        failed_fragments: failed_fragments.into_inner(),
    };
    log_build_result(&summary);
    Ok(summary)
}

/// Every file under the site root, minus skipped directories, the output
/// directory and the config file.
pub fn collect_files(config: &SiteConfig) -> Vec<PathBuf> {
    let output = &config.build.output;
    let skip = &config.build.skip;

    WalkDir::new(config.get_root())
        .into_iter()
        .filter_entry(|e| !is_skipped(e, output, skip))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(DirEntry::into_path)
        .filter(|path| *path != config.config_path)
        .collect()
}

fn is_skipped(entry: &DirEntry, output: &Path, skip: &[String]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_str().unwrap_or_default();
    entry.path() == output || skip.iter().any(|s| s == name)
}

/// `rel` is a page: an `.html` file outside the components directory.
pub fn is_page(rel: &Path) -> bool {
    let is_html = rel
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"));
    let in_components = rel
        .components()
        .next()
        .is_some_and(|c| c.as_os_str() == COMPONENTS_DIR);
    is_html && !in_components
}

/// URL path a page is served under, e.g. `/pages/rules.html`.
pub fn url_path(rel: &Path) -> String {
    let segments: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    format!("/{}", segments.join("/"))
}

/// Compose one page into the output directory.
///
/// Returns the number of fragments that failed.
fn compose_page(path: &Path, config: &SiteConfig) -> Result<usize> {
    let root = config.get_root();
    let rel = path.strip_prefix(root)?;

    let html = fs::read_to_string(path)
        .with_context(|| format!("Failed to read page: {}", rel.display()))?;

    let ctx = PathContext::resolve(&url_path(rel), &config.site.markers);
    let source = FsSource::new(root, page_dir(rel));
    let report = Bootstrapper::new(config, &source).bootstrap(&html, &ctx);

    let dest = config.build.output.join(rel);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&dest, minify_page(report.html.as_bytes(), config))
        .with_context(|| format!("Failed to write page: {}", dest.display()))?;

    Ok(report.failed())
}

fn copy_asset(path: &Path, config: &SiteConfig) -> Result<()> {
    let rel = path.strip_prefix(config.get_root())?;
    let dest = config.build.output.join(rel);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(path, &dest)?;
    Ok(())
}

fn log_build_result(summary: &BuildSummary) {
    if summary.pages == 0 {
        log!("warn"; "no pages found, check the site root");
    } else if summary.failed_fragments > 0 {
        log!(
            "warn";
            "done with {} missing fragments over {} pages",
            summary.failed_fragments,
            summary.pages
        );
    } else {
        log!("build"; "done: {} pages, {} assets", summary.pages, summary.assets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PAGE: &str = r#"<html><body><div class="wrapper"><div id="header"></div><main>x</main></div><footer id="footer"></footer></body></html>"#;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn site() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "components/header.html", r#"<img id="dtu-logo">"#);
        write(root, "components/navbar.html", r#"<ul><li><a href="/pages/rules.html">Rules</a></li></ul>"#);
        write(root, "components/footer.html", r#"<a href="disclaimer.html">Disclaimer</a>"#);
        write(root, "index.html", PAGE);
        write(root, "pages/rules.html", PAGE);
        write(root, "pages/hostels/aryabhatta.html", PAGE);
        write(root, "images/dtu-logo.png", "png");
        write(root, "node_modules/pkg/index.html", "<p>skip</p>");
        write(root, "stitch.toml", "");

        let mut config = SiteConfig::default();
        config.root = root.to_path_buf();
        config.config_path = root.join("stitch.toml");
        config.build.output = root.join("public");
        (dir, config)
    }

    #[test]
    fn test_is_page() {
        assert!(is_page(Path::new("index.html")));
        assert!(is_page(Path::new("pages/rules.HTML")));
        assert!(!is_page(Path::new("components/header.html")));
        assert!(!is_page(Path::new("styles/main.css")));
    }

    #[test]
    fn test_url_path() {
        assert_eq!(url_path(Path::new("index.html")), "/index.html");
        assert_eq!(url_path(Path::new("pages/hostels/a.html")), "/pages/hostels/a.html");
    }

    #[test]
    fn test_build_site() {
        let (dir, config) = site();
        let summary = build_site(&config).unwrap();

        assert_eq!(summary.pages, 3);
        // 3 components + image; node_modules and stitch.toml skipped
        assert_eq!(summary.assets, 4);
        // no sidebar placeholder anywhere, so nothing failed
        assert_eq!(summary.failed_fragments, 0);

        let out = dir.path().join("public");
        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(index.contains(r#"src="./images/dtu-logo.png""#));
        assert!(index.contains(r#"<a href="./pages/rules.html">Rules</a>"#));

        let nested = fs::read_to_string(out.join("pages/hostels/aryabhatta.html")).unwrap();
        assert!(nested.contains(r#"<a href="../../pages/rules.html">Rules</a>"#));
        assert!(nested.contains(r#"<a href="../../pages/disclaimer.html">Disclaimer</a>"#));

        assert!(out.join("images/dtu-logo.png").exists());
        assert!(!out.join("node_modules").exists());
        assert!(!out.join("stitch.toml").exists());
    }

    #[test]
    fn test_rebuild_skips_output_and_cleans() {
        let (dir, mut config) = site();
        build_site(&config).unwrap();

        let stale = dir.path().join("public/stale.html");
        fs::write(&stale, "old").unwrap();

        // output dir is not walked as part of the site
        let summary = build_site(&config).unwrap();
        assert_eq!(summary.pages, 3);
        assert!(stale.exists());

        config.build.clean = true;
        build_site(&config).unwrap();
        assert!(!stale.exists());
    }

    #[test]
    fn test_missing_fragments_counted() {
        let (dir, config) = site();
        fs::remove_file(dir.path().join("components/footer.html")).unwrap();

        let summary = build_site(&config).unwrap();
        assert_eq!(summary.failed_fragments, 3);
        let index = fs::read_to_string(dir.path().join("public/index.html")).unwrap();
        assert!(index.contains(r#"<footer id="footer"></footer>"#));
    }
}
