//! Shared fragments and where they are fetched from.

use std::{
    fmt, fs, io,
    path::{Component, Path, PathBuf},
};
use thiserror::Error;

/// The four shared fragments every page may pull in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    Header,
    Navbar,
    Sidebar,
    Footer,
}

impl FragmentKind {
    pub const ALL: [Self; 4] = [Self::Header, Self::Navbar, Self::Sidebar, Self::Footer];

    /// Root-relative URL of the fragment markup.
    pub const fn url(self) -> &'static str {
        match self {
            Self::Header => "components/header.html",
            Self::Navbar => "components/navbar.html",
            Self::Sidebar => "components/sidebar-widget.html",
            Self::Footer => "components/footer.html",
        }
    }

    /// Id of the element whose content the fragment replaces.
    ///
    /// The navbar has no placeholder of its own: it is inserted after `#header`.
    pub const fn placeholder(self) -> Option<&'static str> {
        match self {
            Self::Header => Some("header"),
            Self::Navbar => None,
            Self::Sidebar => Some("sidebar-widget"),
            Self::Footer => Some("footer"),
        }
    }

    /// Log module name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Navbar => "navbar",
            Self::Sidebar => "sidebar",
            Self::Footer => "footer",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("`{0}` not found")]
    NotFound(String),

    #[error("`{0}` resolves outside the site root")]
    OutsideRoot(String),

    #[error("failed to read `{0}`")]
    Io(String, #[source] io::Error),
}

/// Fetched fragment content that cannot be used.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FragmentError {
    #[error("navbar markup has no <ul> list")]
    MissingList,
}

/// Something that turns a fragment URL into markup.
///
/// URLs are relative to the page being bootstrapped, exactly like the
/// `fetch()` of a browser page: `../components/header.html` from a page one
/// level deep.
pub trait FragmentSource: Sync {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Reads fragments from the site's source tree.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
    page_dir: PathBuf,
}

impl FsSource {
    /// `page_dir` is the directory of the page, relative to `root`.
    pub fn new(root: impl Into<PathBuf>, page_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            page_dir: page_dir.into(),
        }
    }

    /// Resolve `url` against the page directory without touching the disk.
    ///
    /// Returns `None` when the result would leave the site root.
    fn resolve(&self, url: &str) -> Option<PathBuf> {
        let url = url.split(['?', '#']).next().unwrap_or_default();
        let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
        let joined = self.page_dir.join(url);
        for component in joined.components() {
            match component {
                Component::Normal(part) => parts.push(part),
                Component::ParentDir => {
                    parts.pop()?;
                }
                Component::CurDir => {}
                // a rooted URL or page dir still means "relative to the site root"
                Component::RootDir | Component::Prefix(_) => parts.clear(),
            }
        }
        Some(parts.iter().fold(self.root.clone(), |acc, p| acc.join(p)))
    }
}

impl FragmentSource for FsSource {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let path = self
            .resolve(url)
            .ok_or_else(|| FetchError::OutsideRoot(url.to_owned()))?;
        fs::read_to_string(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound(url.to_owned()),
            _ => FetchError::Io(url.to_owned(), err),
        })
    }
}

/// Directory part of a page's root-relative path (empty for root pages).
pub fn page_dir(rel_page: &Path) -> PathBuf {
    rel_page.parent().map(Path::to_path_buf).unwrap_or_default()
}
