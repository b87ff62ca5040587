//! Navbar assembly and placement.
//!
//! The navbar fragment may carry arbitrary wrapper markup; only its first
//! `<ul>` list is kept. The list is wrapped in a fresh `<nav class="navbar">`,
//! wired for dropdowns and placed directly after `#header` inside `.wrapper`.

use crate::fragment::FragmentError;

use super::markup::{
    Edit, ElementSpan, Tag, TagKind, Tags, apply_edits, find_by_class, find_element,
};

const ARROW: &str = r#"<span class="dropdown-arrow">&#9660;</span>"#;
const ALIGN_RIGHT: &str = "align-right";

/// The first `<ul>` element of the fragment, matched structurally.
pub fn extract_list(markup: &str) -> Result<&str, FragmentError> {
    find_element(markup, 0, |tag| tag.is("ul"))
        .map(|span| span.outer(markup))
        .ok_or(FragmentError::MissingList)
}

#[inline]
pub fn wrap_navbar(list: &str) -> String {
    format!(r#"<nav class="navbar">{list}</nav>"#)
}

/// Static dropdown wiring.
///
/// - every `li.dropdown > a` gets a trailing arrow marker unless it has one
/// - with more than two dropdowns, the last two open to the left (`align-right`)
pub fn wire_dropdowns(nav: &str) -> String {
    struct Open {
        name: String,
        dropdown: bool,
    }

    let mut stack: Vec<Open> = Vec::new();
    let mut dropdown_tags = Vec::new();
    let mut edits = Vec::new();
    // (depth of the `a`, has arrow) for the link currently open under a dropdown
    let mut link: Option<(usize, bool)> = None;

    for tag in Tags::new(nav) {
        match tag.kind {
            TagKind::Open => {
                let parent_is_dropdown = stack.last().is_some_and(|o| o.dropdown);
                let dropdown = tag.is("li") && tag.has_class("dropdown");
                if dropdown {
                    dropdown_tags.push(add_class(&tag, ALIGN_RIGHT));
                }
                if tag.is("span") && tag.has_class("dropdown-arrow") {
                    if let Some((_, has_arrow)) = link.as_mut() {
                        *has_arrow = true;
                    }
                }
                if tag.is("a") && parent_is_dropdown && link.is_none() {
                    link = Some((stack.len(), false));
                }
                stack.push(Open {
                    name: tag.name,
                    dropdown,
                });
            }
            TagKind::Close => {
                let Some(pos) = stack.iter().rposition(|o| o.name == tag.name) else {
                    continue;
                };
                stack.truncate(pos);
                if let Some((depth, has_arrow)) = link
                    && tag.is("a")
                    && depth == pos
                {
                    if !has_arrow {
                        edits.push(Edit::insert(tag.range.start, ARROW));
                    }
                    link = None;
                }
            }
            TagKind::Empty => {}
        }
    }

    if dropdown_tags.len() > 2 {
        let last_two = dropdown_tags.split_off(dropdown_tags.len() - 2);
        edits.extend(last_two.into_iter().flatten());
    }

    apply_edits(nav, edits)
}

/// Where the navbar goes in a page: right after `#header` inside `.wrapper`.
pub fn find_anchor(page: &str) -> Option<ElementSpan> {
    let wrapper = find_by_class(page, 0, "wrapper")?;
    let header = find_element(page, wrapper.open_end, |tag| tag.has_id("header"))?;
    (header.end <= wrapper.close_start).then_some(header)
}

/// Insert `nav` after `#header`, first removing any `.navbar` or
/// `.mobile-menu-toggle` elements that directly follow it.
///
/// Returns `None` when the page has no `.wrapper` containing `#header`.
pub fn insert_navbar(page: &str, nav: &str) -> Option<String> {
    let header = find_anchor(page)?;
    let mut edits = stale_navbar_edits(page, header.end);
    edits.push(Edit::insert(header.end, nav));
    Some(apply_edits(page, edits))
}

/// Remove `.navbar` and `.mobile-menu-toggle` elements directly after
/// `#header`, leaving the page without a navbar.
///
/// Returns `None` when the page has no `.wrapper` containing `#header`.
pub fn remove_stale_navbar(page: &str) -> Option<String> {
    let header = find_anchor(page)?;
    let edits = stale_navbar_edits(page, header.end);
    Some(apply_edits(page, edits))
}

fn stale_navbar_edits(page: &str, after: usize) -> Vec<Edit> {
    let mut edits = Vec::new();
    let mut cursor = after;
    while let Some(next) = next_sibling(page, cursor) {
        let stale = Tags::from_offset(page, next.start)
            .next()
            .is_some_and(|tag| tag.has_class("navbar") || tag.has_class("mobile-menu-toggle"));
        if !stale {
            break;
        }
        edits.push(Edit::replace(cursor..next.end, ""));
        cursor = next.end;
    }
    edits
}

/// The element starting right after `pos`, separated only by whitespace.
fn next_sibling(page: &str, pos: usize) -> Option<ElementSpan> {
    let tag = Tags::from_offset(page, pos).next()?;
    if !tag.opens() || !page[pos..tag.range.start].trim().is_empty() {
        return None;
    }
    find_element(page, tag.range.start, |_| true)
}

/// Edit adding `class` to a start tag, or `None` if it already has it.
fn add_class(tag: &Tag<'_>, class: &str) -> Option<Edit> {
    if tag.has_class(class) {
        return None;
    }
    let rebuilt = tag.rebuild(
        |key, value| {
            if key.eq_ignore_ascii_case("class") {
                Some(format!("{} {class}", value.trim()))
            } else {
                Some(value.to_owned())
            }
        },
        &[],
    );
    Some(Edit::replace(tag.range.clone(), rebuilt))
}
