//! Path-to-root resolution.
//!
//! Every page needs a relative prefix (`./`, `../`, `../../`, ...) so that
//! `prefix + "components/header.html"` or `prefix + "images/x.png"` reaches the
//! site root no matter how deeply the page is nested.
//!
//! The depth comes from the page's URL path, checked in this order:
//!
//! | Rule       | Condition                                  | Depth                              |
//! |------------|--------------------------------------------|------------------------------------|
//! | marker     | a segment contains a configured marker     | directories after the last marker  |
//! | `pages`    | a `pages` directory segment exists         | directories from `pages` onwards   |
//! | index      | no segments, or an `index.html` segment    | 0                                  |
//! | counting   | anything else                              | every directory is one level       |
//!
//! The last segment counts as a file (not a directory) when it contains a `.`,
//! so `/pages/rules.html` and `/pages/` both sit one level below the root.
//! This is a heuristic: a path matching several rules takes the first one.

use std::fmt;

/// Relative prefix from a page back to the site root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RootPrefix(String);

impl RootPrefix {
    /// `./` for depth 0, otherwise `depth` repetitions of `../`.
    pub fn for_depth(depth: usize) -> Self {
        if depth == 0 {
            Self("./".into())
        } else {
            Self("../".repeat(depth))
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `prefix + rel`, where `rel` is relative to the site root.
    #[inline]
    pub fn join(&self, rel: &str) -> String {
        format!("{}{}", self.0, rel)
    }
}

impl fmt::Display for RootPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Depth and root prefix of one page load.
///
/// Built once per page and passed by reference to every loader and rewriter,
/// so all of them agree on the same prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathContext {
    depth: usize,
    prefix: RootPrefix,
}

impl PathContext {
    pub fn from_depth(depth: usize) -> Self {
        Self {
            depth,
            prefix: RootPrefix::for_depth(depth),
        }
    }

    /// Resolve the context for a page at `url_path` (the `pathname` part of
    /// its URL; query and fragment are ignored).
    pub fn resolve<S: AsRef<str>>(url_path: &str, markers: &[S]) -> Self {
        Self::from_depth(detect_depth(url_path, markers))
    }

    #[inline]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn prefix(&self) -> &RootPrefix {
        &self.prefix
    }

    /// Shorthand for `self.prefix().join(rel)`.
    #[inline]
    pub fn to_root(&self, rel: &str) -> String {
        self.prefix.join(rel)
    }
}

/// Split a URL path into its non-empty segments.
fn segments(url_path: &str) -> Vec<String> {
    let path = url_path.split(['?', '#']).next().unwrap_or_default();
    path.replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn detect_depth<S: AsRef<str>>(url_path: &str, markers: &[S]) -> usize {
    let segments = segments(url_path);
    let dir_count = match segments.last() {
        Some(last) if last.contains('.') => segments.len() - 1,
        _ => segments.len(),
    };
    let dirs = &segments[..dir_count];

    let marker_index = segments.iter().rposition(|segment| {
        let segment = segment.to_lowercase();
        markers.iter().any(|m| {
            let m = m.as_ref();
            !m.is_empty() && segment.contains(&m.to_lowercase())
        })
    });

    if let Some(index) = marker_index {
        // A marker on the file segment itself leaves the page at the root.
        return dir_count.saturating_sub(index + 1);
    }

    if let Some(pages) = dirs.iter().position(|s| s == "pages") {
        return dir_count - pages;
    }

    if segments.is_empty() || segments.iter().any(|s| s == "index.html") {
        return 0;
    }

    dir_count
}
