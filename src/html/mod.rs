//! HTML processing for pages and fragments.

pub mod images;
pub mod link;
pub mod markup;
pub mod nav;

pub use images::{ImageResolver, ImageSource};
pub use link::{rewrite_disclaimer_links, rewrite_href, rewrite_links};
