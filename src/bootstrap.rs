//! Page bootstrapping: pull shared fragments into one page.
//!
//! # Flow
//!
//! ```text
//! bootstrap(page, ctx)
//!     │
//!     ├── placeholders present?  (missing → warn, no fetch)
//!     │
//!     ├── rayon::join ─┬─ header  ── fetch ── resolve header images
//!     │                ├─ navbar  ── fetch ── first <ul> ── wrap ── links ── dropdowns
//!     │                ├─ sidebar ── fetch
//!     │                └─ footer  ── fetch ── year ── disclaimer links ── footer images
//!     │
//!     └── inject in order: header, navbar (after #header), sidebar, footer
//! ```
//!
//! Every fragment depends only on its own fetch. A failure is logged and
//! recorded in the [`BootReport`]; the page is still produced with whatever
//! fragments did load. Nothing is retried.

use crate::{
    config::SiteConfig,
    fragment::{FragmentError, FragmentKind, FragmentSource},
    html::{
        ImageResolver,
        markup::{find_by_id, replace_content},
        nav, rewrite_disclaimer_links, rewrite_links,
    },
    log,
    path::PathContext,
};
use chrono::Datelike;

/// Id of the element holding the copyright year in the footer.
const YEAR_ELEMENT: &str = "current-year";

/// What happened to one fragment during a page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentOutcome {
    Injected,
    /// The page has no place for the fragment; it was not fetched.
    MissingPlaceholder,
    FetchFailed(String),
    Malformed(FragmentError),
}

/// A bootstrapped page and the outcome of every fragment.
#[derive(Debug, Clone)]
pub struct BootReport {
    pub html: String,
    pub outcomes: Vec<(FragmentKind, FragmentOutcome)>,
}

impl BootReport {
    pub fn outcome(&self, kind: FragmentKind) -> Option<&FragmentOutcome> {
        self.outcomes
            .iter()
            .find_map(|(k, outcome)| (*k == kind).then_some(outcome))
    }

    pub fn injected(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == FragmentOutcome::Injected)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| {
                matches!(
                    outcome,
                    FragmentOutcome::FetchFailed(_) | FragmentOutcome::Malformed(_)
                )
            })
            .count()
    }
}

type Loaded = Result<String, FragmentOutcome>;

/// Loads and injects the shared fragments of a page.
///
/// The image resolvers are built up front, so header image fixing only waits
/// for the header fetch itself.
pub struct Bootstrapper<'a> {
    source: &'a dyn FragmentSource,
    header_images: ImageResolver,
    footer_images: ImageResolver,
    year: i32,
}

impl<'a> Bootstrapper<'a> {
    pub fn new(config: &SiteConfig, source: &'a dyn FragmentSource) -> Self {
        let images = &config.images;
        Self {
            source,
            header_images: ImageResolver::new(images.header.clone(), images.fallback.clone()),
            footer_images: ImageResolver::new(images.footer.clone(), images.fallback.clone()),
            year: chrono::Local::now().year(),
        }
    }

    /// Stamp `year` into footers instead of the current year.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn bootstrap(&self, page: &str, ctx: &PathContext) -> BootReport {
        let present = |kind: FragmentKind| match kind.placeholder() {
            Some(id) => find_by_id(page, id).is_some(),
            None => nav::find_anchor(page).is_some(),
        };

        let ((header, navbar), (sidebar, footer)) = rayon::join(
            || {
                rayon::join(
                    || self.load(FragmentKind::Header, present(FragmentKind::Header), ctx),
                    || self.load(FragmentKind::Navbar, present(FragmentKind::Navbar), ctx),
                )
            },
            || {
                rayon::join(
                    || self.load(FragmentKind::Sidebar, present(FragmentKind::Sidebar), ctx),
                    || self.load(FragmentKind::Footer, present(FragmentKind::Footer), ctx),
                )
            },
        );

        let mut html = page.to_owned();
        let mut outcomes = Vec::with_capacity(FragmentKind::ALL.len());
        for (kind, loaded) in FragmentKind::ALL.into_iter().zip([header, navbar, sidebar, footer]) {
            let outcome = match loaded {
                Ok(markup) => match inject(&html, kind, &markup) {
                    Some(injected) => {
                        html = injected;
                        FragmentOutcome::Injected
                    }
                    None => FragmentOutcome::MissingPlaceholder,
                },
                Err(outcome) => {
                    // a navbar left over from an earlier composition is dropped either way
                    if kind == FragmentKind::Navbar
                        && outcome != FragmentOutcome::MissingPlaceholder
                        && let Some(cleaned) = nav::remove_stale_navbar(&html)
                    {
                        html = cleaned;
                    }
                    outcome
                }
            };
            outcomes.push((kind, outcome));
        }

        BootReport { html, outcomes }
    }

    /// Fetch one fragment and run its post-processing.
    fn load(&self, kind: FragmentKind, present: bool, ctx: &PathContext) -> Loaded {
        if !present {
            match kind.placeholder() {
                Some(id) => log!("warn"; "container #{id} not found, skipping {kind}"),
                None => log!("warn"; ".wrapper or #header not found, skipping {kind}"),
            }
            return Err(FragmentOutcome::MissingPlaceholder);
        }

        let url = ctx.to_root(kind.url());
        let markup = self.source.fetch(&url).map_err(|err| {
            log!("error"; "loading {kind} from {url}: {err}");
            FragmentOutcome::FetchFailed(err.to_string())
        })?;

        match kind {
            FragmentKind::Header => Ok(self.finish_header(&markup, ctx)),
            FragmentKind::Navbar => finish_navbar(&markup, ctx).map_err(|err| {
                log!("error"; "{kind} from {url}: {err}");
                FragmentOutcome::Malformed(err)
            }),
            FragmentKind::Sidebar => Ok(markup),
            FragmentKind::Footer => Ok(self.finish_footer(&markup, ctx)),
        }
    }

    fn finish_header(&self, markup: &str, ctx: &PathContext) -> String {
        let resolved = self.header_images.resolve(markup, ctx);
        for id in &resolved.missing {
            log!("warn"; "{id} element not found in header");
        }
        resolved.markup
    }

    fn finish_footer(&self, markup: &str, ctx: &PathContext) -> String {
        let markup = match find_by_id(markup, YEAR_ELEMENT) {
            Some(span) => replace_content(markup, &span, &self.year.to_string()),
            None => markup.to_owned(),
        };
        let markup = rewrite_disclaimer_links(&markup, ctx);
        self.footer_images.resolve(&markup, ctx).markup
    }
}

fn finish_navbar(markup: &str, ctx: &PathContext) -> Result<String, FragmentError> {
    let list = nav::extract_list(markup)?;
    let navbar = rewrite_links(&nav::wrap_navbar(list), ctx);
    Ok(nav::wire_dropdowns(&navbar))
}

fn inject(html: &str, kind: FragmentKind, markup: &str) -> Option<String> {
    match kind.placeholder() {
        Some(id) => find_by_id(html, id).map(|span| replace_content(html, &span, markup)),
        None => nav::insert_navbar(html, markup),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::FetchError;
    use std::{collections::HashMap, sync::Mutex};

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
<div class="wrapper">
  <div id="header"></div>
  <main><h1>Rules</h1></main>
  <aside id="sidebar-widget" class="sidebar-widget-container"></aside>
</div>
<footer id="footer"></footer>
</body>
</html>"#;

    const HEADER: &str = r#"<div class="brand"><img id="dtu-logo" alt="DTU"><img id="x-icon"></div>"#;
    const NAVBAR: &str = r#"<div><ul><li><a href="index.html">Home</a></li><li class="dropdown"><a href="/pages/hostels.html">Hostels</a></li></ul></div>"#;
    const SIDEBAR: &str = "<p>Notices</p>";
    const FOOTER: &str = r#"<p>&copy; <span id="current-year"></span> <a href="disclaimer.html">Disclaimer</a></p><img id="footer-dtu-logo">"#;

    /// In-memory fragments keyed by the exact URL requested.
    struct MemorySource {
        files: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl MemorySource {
        fn at_depth(depth: usize, fragments: &[(FragmentKind, &str)]) -> Self {
            let ctx = PathContext::from_depth(depth);
            Self {
                files: fragments
                    .iter()
                    .map(|(kind, markup)| (ctx.to_root(kind.url()), markup.to_string()))
                    .collect(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn all(depth: usize) -> Self {
            Self::at_depth(
                depth,
                &[
                    (FragmentKind::Header, HEADER),
                    (FragmentKind::Navbar, NAVBAR),
                    (FragmentKind::Sidebar, SIDEBAR),
                    (FragmentKind::Footer, FOOTER),
                ],
            )
        }

        fn requests(&self) -> Vec<String> {
            let mut requests = self.requests.lock().unwrap().clone();
            requests.sort();
            requests
        }
    }

    impl FragmentSource for MemorySource {
        fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requests.lock().unwrap().push(url.to_owned());
            self.files
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::NotFound(url.to_owned()))
        }
    }

    fn boot(source: &MemorySource, page: &str, depth: usize) -> BootReport {
        let config = SiteConfig::default();
        Bootstrapper::new(&config, source)
            .with_year(2025)
            .bootstrap(page, &PathContext::from_depth(depth))
    }

    #[test]
    fn test_full_page_at_depth_one() {
        let source = MemorySource::all(1);
        let report = boot(&source, PAGE, 1);
        assert_eq!(report.injected(), 4);

        let html = &report.html;
        assert!(html.contains(r#"<img id="dtu-logo" alt="DTU" src="../images/dtu-logo.png""#));
        assert!(html.contains(r#"<div id="header"><div class="brand">"#));
        assert!(html.contains(
            r#"</div><nav class="navbar"><ul><li><a href="../index.html">Home</a></li>"#
        ));
        assert!(html.contains(r#"<a href="../pages/hostels.html">Hostels<span class="dropdown-arrow">"#));
        assert!(html.contains(r#"class="sidebar-widget-container"><p>Notices</p></aside>"#));
        assert!(html.contains(r#"<span id="current-year">2025</span>"#));
        assert!(html.contains(r#"<a href="../pages/disclaimer.html">Disclaimer</a>"#));
        assert!(html.contains(r#"<img id="footer-dtu-logo" src="../images/dtu-logo.png""#));
    }

    #[test]
    fn test_one_fetch_per_fragment() {
        let source = MemorySource::all(2);
        boot(&source, PAGE, 2);
        assert_eq!(
            source.requests(),
            [
                "../../components/footer.html",
                "../../components/header.html",
                "../../components/navbar.html",
                "../../components/sidebar-widget.html",
            ]
        );
    }

    #[test]
    fn test_sidebar_failure_is_isolated() {
        let source = MemorySource::at_depth(
            0,
            &[
                (FragmentKind::Header, HEADER),
                (FragmentKind::Navbar, NAVBAR),
                (FragmentKind::Footer, FOOTER),
            ],
        );
        let report = boot(&source, PAGE, 0);

        assert!(matches!(
            report.outcome(FragmentKind::Sidebar),
            Some(FragmentOutcome::FetchFailed(_))
        ));
        assert_eq!(report.outcome(FragmentKind::Header), Some(&FragmentOutcome::Injected));
        assert_eq!(report.outcome(FragmentKind::Navbar), Some(&FragmentOutcome::Injected));
        assert_eq!(report.outcome(FragmentKind::Footer), Some(&FragmentOutcome::Injected));
        assert_eq!(report.failed(), 1);
        // the placeholder stays empty
        assert!(report.html.contains(r#"class="sidebar-widget-container"></aside>"#));
    }

    #[test]
    fn test_missing_placeholder_is_not_fetched() {
        let page = r#"<div class="wrapper"><div id="header"></div></div>"#;
        let source = MemorySource::all(0);
        let report = boot(&source, page, 0);

        assert_eq!(
            report.outcome(FragmentKind::Sidebar),
            Some(&FragmentOutcome::MissingPlaceholder)
        );
        assert_eq!(
            report.outcome(FragmentKind::Footer),
            Some(&FragmentOutcome::MissingPlaceholder)
        );
        assert_eq!(
            source.requests(),
            ["./components/header.html", "./components/navbar.html"]
        );
    }

    #[test]
    fn test_navbar_without_wrapper_is_skipped() {
        let page = r#"<div id="header"></div><div id="footer"></div>"#;
        let source = MemorySource::all(0);
        let report = boot(&source, page, 0);
        assert_eq!(
            report.outcome(FragmentKind::Navbar),
            Some(&FragmentOutcome::MissingPlaceholder)
        );
        assert!(!report.html.contains("navbar"));
    }

    #[test]
    fn test_malformed_navbar_not_inserted() {
        let source = MemorySource::at_depth(
            0,
            &[
                (FragmentKind::Header, HEADER),
                (FragmentKind::Navbar, "<div>menu coming soon</div>"),
            ],
        );
        let report = boot(&source, PAGE, 0);
        assert_eq!(
            report.outcome(FragmentKind::Navbar),
            Some(&FragmentOutcome::Malformed(FragmentError::MissingList))
        );
        assert!(!report.html.contains(r#"class="navbar""#));
        assert_eq!(report.outcome(FragmentKind::Header), Some(&FragmentOutcome::Injected));
    }

    #[test]
    fn test_failed_navbar_drops_stale_one() {
        let page = PAGE.replace(
            r#"<div id="header"></div>"#,
            r#"<div id="header"></div><nav class="navbar"><ul><li>old</li></ul></nav><button class="mobile-menu-toggle">☰ Menu</button>"#,
        );
        let source = MemorySource::at_depth(0, &[(FragmentKind::Header, HEADER)]);
        let report = boot(&source, &page, 0);
        assert!(matches!(
            report.outcome(FragmentKind::Navbar),
            Some(FragmentOutcome::FetchFailed(_))
        ));
        assert!(!report.html.contains("old"));
        assert!(!report.html.contains("mobile-menu-toggle"));
        assert_eq!(report.outcome(FragmentKind::Header), Some(&FragmentOutcome::Injected));
    }

    #[test]
    fn test_all_fetches_fail_page_survives() {
        let source = MemorySource::at_depth(0, &[]);
        let report = boot(&source, PAGE, 0);
        assert_eq!(report.injected(), 0);
        assert_eq!(report.failed(), 4);
        assert_eq!(report.html, PAGE);
    }

    #[test]
    fn test_bootstrap_twice_is_stable() {
        let source = MemorySource::all(1);
        let once = boot(&source, PAGE, 1).html;
        let twice = boot(&source, &once, 1).html;
        assert_eq!(once, twice);
    }
}
