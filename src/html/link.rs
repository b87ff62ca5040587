//! Link rewriting for injected fragments.
//!
//! Fragments are written once for the whole site, so their links are either
//! root-relative (`/pages/rules.html`) or relative to the root (`pages/rules.html`).
//! Inside a page that sits `depth` levels down they must go through the page's
//! root prefix.
//!
//! # Rules
//!
//! Evaluated in order, first match wins, no match leaves the link unchanged:
//!
//! | Link                                  | Condition  | Result                         |
//! |---------------------------------------|------------|--------------------------------|
//! | `http...`, `#...`, `javascript:...`   | always     | unchanged                      |
//! | `/pages/rules.html`                   | always     | `prefix + "pages/rules.html"`  |
//! | `../about.html`                       | depth 0    | unchanged                      |
//! | `pages/contact.html`                  | depth > 0  | `prefix + href`                |
//! | `index.html`                          | depth > 0  | `prefix + href`                |
//! | anything containing `disclaimer.html` | always     | `prefix + "pages/disclaimer.html"` |
//!
//! The disclaimer rule overrides the four rules before it. Rewriting is
//! idempotent: a rewritten link matches none of the rewriting rules again.

use crate::path::PathContext;

use super::markup::rewrite_tags;

const DISCLAIMER_PAGE: &str = "disclaimer.html";
const DISCLAIMER_PATH: &str = "pages/disclaimer.html";

/// External, same-page and script links are never touched.
#[inline]
fn is_untouchable(href: &str) -> bool {
    href.is_empty()
        || href.starts_with("http")
        || href.starts_with('#')
        || href.starts_with("javascript:")
}

/// Rewrite one `href` for the page described by `ctx`.
///
/// Returns `None` when the link stays as it is.
pub fn rewrite_href(href: &str, ctx: &PathContext) -> Option<String> {
    if is_untouchable(href) {
        return None;
    }
    if href.contains(DISCLAIMER_PAGE) {
        return Some(ctx.to_root(DISCLAIMER_PATH));
    }

    let depth = ctx.depth();
    if let Some(rest) = href.strip_prefix('/') {
        Some(ctx.to_root(rest))
    } else if href.starts_with("../") && depth == 0 {
        None
    } else if (href.starts_with("pages/") || href == "index.html") && depth > 0 {
        Some(ctx.to_root(href))
    } else {
        None
    }
}

/// Only the disclaimer rule; used for the footer.
pub fn rewrite_disclaimer_href(href: &str, ctx: &PathContext) -> Option<String> {
    (!is_untouchable(href) && href.contains(DISCLAIMER_PAGE))
        .then(|| ctx.to_root(DISCLAIMER_PATH))
}

/// Apply [`rewrite_href`] to every `<a href>` in `markup`.
pub fn rewrite_links(markup: &str, ctx: &PathContext) -> String {
    rewrite_anchors(markup, |href| rewrite_href(href, ctx))
}

/// Apply [`rewrite_disclaimer_href`] to every `<a href>` in `markup`.
pub fn rewrite_disclaimer_links(markup: &str, ctx: &PathContext) -> String {
    rewrite_anchors(markup, |href| rewrite_disclaimer_href(href, ctx))
}

fn rewrite_anchors<F>(markup: &str, rewrite: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    rewrite_tags(markup, |tag| {
        if !tag.is("a") {
            return None;
        }
        let new_href = rewrite(tag.attr("href")?.trim())?;
        Some(tag.rebuild(
            |key, value| {
                if key.eq_ignore_ascii_case("href") {
                    Some(new_href.clone())
                } else {
                    Some(value.to_owned())
                }
            },
            &[],
        ))
    })
}
