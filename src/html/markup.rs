//! Tag scanning and splicing over raw HTML text.
//!
//! Pages and fragments are hand-written HTML, not XML: void elements are not
//! closed, attributes may be unquoted, scripts contain `<`. The scanner reads
//! tags with a lenient `quick_xml` reader and reports byte ranges into the
//! scanned text, so every edit is a splice and untouched markup stays
//! byte-for-byte identical.

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
    name::QName,
};
use std::{borrow::Cow, ops::Range};

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose content is raw text and must not be scanned for tags.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[inline]
fn create_reader(content: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(content.as_bytes());
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);
    reader
}

// ============================================================================
// Tags
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `<div ...>`
    Open,
    /// `<br>`, `<img .../>`, or a whole `<script>...</script>` element
    Empty,
    /// `</div>`
    Close,
}

/// One tag found by [`Tags`], with its byte range in the scanned text.
#[derive(Debug)]
pub struct Tag<'a> {
    pub kind: TagKind,
    /// Lowercased tag name.
    pub name: String,
    pub range: Range<usize>,
    /// Written as `<tag ... />`.
    pub self_closing: bool,
    elem: Option<BytesStart<'a>>,
}

impl Tag<'_> {
    #[inline]
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    #[inline]
    pub fn opens(&self) -> bool {
        matches!(self.kind, TagKind::Open | TagKind::Empty)
    }

    /// Raw (still escaped) attribute value, matched case-insensitively.
    pub fn attr(&self, key: &str) -> Option<String> {
        self.elem.as_ref()?.html_attributes().flatten().find_map(|attr| {
            attr.key
                .as_ref()
                .eq_ignore_ascii_case(key.as_bytes())
                .then(|| String::from_utf8_lossy(&attr.value).into_owned())
        })
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.attr("id").is_some_and(|v| v.trim() == id)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
    }

    /// Render this start tag again with transformed attributes.
    ///
    /// `transform(key, value)` returns the new value, or `None` to drop the
    /// attribute. `extra` attributes are appended after the existing ones.
    pub fn rebuild<F>(&self, mut transform: F, extra: &[(&str, &str)]) -> String
    where
        F: FnMut(&str, &str) -> Option<String>,
    {
        let Some(elem) = &self.elem else {
            return format!("</{}>", self.name);
        };
        let tag = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
        let mut new_elem = BytesStart::new(tag);
        for attr in elem.html_attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = String::from_utf8_lossy(&attr.value).into_owned();
            if let Some(value) = transform(&key, &value) {
                new_elem.push_attribute((key.as_bytes(), quote_safe(&value).as_bytes()));
            }
        }
        for (key, value) in extra {
            new_elem.push_attribute((key.as_bytes(), quote_safe(value).as_bytes()));
        }
        let body = String::from_utf8_lossy(&new_elem);
        if self.self_closing {
            format!("<{body} />")
        } else {
            format!("<{body}>")
        }
    }
}

/// Values are written back inside `"`, already entity-escaped apart from a
/// literal `"` taken from a single-quoted attribute.
fn quote_safe(value: &str) -> Cow<'_, str> {
    if value.contains('"') {
        Cow::Owned(value.replace('"', "&quot;"))
    } else {
        Cow::Borrowed(value)
    }
}

/// Iterator over the tags of an HTML text.
///
/// Comments, text, doctype and processing instructions are skipped. Stops at
/// the end of input or at the first unrecoverable syntax error.
pub struct Tags<'a> {
    reader: Reader<&'a [u8]>,
    base: usize,
}

impl<'a> Tags<'a> {
    pub fn new(html: &'a str) -> Self {
        Self::from_offset(html, 0)
    }

    /// Scan `html[from..]`, reporting ranges relative to the whole of `html`.
    pub fn from_offset(html: &'a str, from: usize) -> Self {
        Self {
            reader: create_reader(&html[from..]),
            base: from,
        }
    }

    #[inline]
    fn position(&self) -> usize {
        self.base + self.reader.buffer_position() as usize
    }
}

impl<'a> Iterator for Tags<'a> {
    type Item = Tag<'a>;

    fn next(&mut self) -> Option<Tag<'a>> {
        loop {
            let start = Tags::position(self);
            let (kind, self_closing, elem, name) = match self.reader.read_event() {
                Ok(Event::Start(elem)) => {
                    let name = lowercase_name(elem.name());
                    if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                        let raw_name = elem.name().as_ref().to_vec();
                        self.reader.read_text(QName(&raw_name)).ok()?;
                        (TagKind::Empty, false, Some(elem), name)
                    } else if VOID_ELEMENTS.contains(&name.as_str()) {
                        (TagKind::Empty, false, Some(elem), name)
                    } else {
                        (TagKind::Open, false, Some(elem), name)
                    }
                }
                Ok(Event::Empty(elem)) => {
                    let name = lowercase_name(elem.name());
                    (TagKind::Empty, true, Some(elem), name)
                }
                Ok(Event::End(elem)) => (TagKind::Close, false, None, lowercase_name(elem.name())),
                Ok(Event::Eof) | Err(_) => return None,
                Ok(_) => continue,
            };
            return Some(Tag {
                kind,
                name,
                range: start..Tags::position(self),
                self_closing,
                elem,
            });
        }
    }
}

#[inline]
fn lowercase_name(name: QName<'_>) -> String {
    String::from_utf8_lossy(name.as_ref()).to_ascii_lowercase()
}

// ============================================================================
// Element spans
// ============================================================================

/// Byte ranges of one element: `start..open_end` is the start tag,
/// `open_end..close_start` the content, `close_start..end` the end tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpan {
    pub name: String,
    pub start: usize,
    pub open_end: usize,
    pub close_start: usize,
    pub end: usize,
    pub self_closing: bool,
}

impl ElementSpan {
    #[inline]
    pub fn outer<'a>(&self, html: &'a str) -> &'a str {
        &html[self.start..self.end]
    }

    #[inline]
    pub fn inner<'a>(&self, html: &'a str) -> &'a str {
        &html[self.open_end..self.close_start]
    }
}

/// First element at or after byte `from` whose start tag satisfies `pred`.
///
/// An element that is never closed extends to the end of the text.
pub fn find_element<P>(html: &str, from: usize, pred: P) -> Option<ElementSpan>
where
    P: Fn(&Tag<'_>) -> bool,
{
    let mut tags = Tags::from_offset(html, from);
    let tag = tags.by_ref().find(|tag| tag.opens() && pred(tag))?;

    if tag.kind == TagKind::Empty {
        return Some(ElementSpan {
            name: tag.name,
            start: tag.range.start,
            open_end: tag.range.end,
            close_start: tag.range.end,
            end: tag.range.end,
            self_closing: tag.self_closing,
        });
    }

    let name = tag.name.clone();
    let mut depth = 1usize;
    for inner in tags.by_ref().filter(|t| t.name == name) {
        match inner.kind {
            TagKind::Open => depth += 1,
            TagKind::Close => {
                depth -= 1;
                if depth == 0 {
                    return Some(ElementSpan {
                        name: tag.name,
                        start: tag.range.start,
                        open_end: tag.range.end,
                        close_start: inner.range.start,
                        end: inner.range.end,
                        self_closing: false,
                    });
                }
            }
            TagKind::Empty => {}
        }
    }

    Some(ElementSpan {
        name: tag.name,
        start: tag.range.start,
        open_end: tag.range.end,
        close_start: html.len(),
        end: html.len(),
        self_closing: false,
    })
}

#[inline]
pub fn find_by_id(html: &str, id: &str) -> Option<ElementSpan> {
    find_element(html, 0, |tag| tag.has_id(id))
}

#[inline]
pub fn find_by_class(html: &str, from: usize, class: &str) -> Option<ElementSpan> {
    find_element(html, from, |tag| tag.has_class(class))
}

// ============================================================================
// Splicing
// ============================================================================

/// Replace the content of `span` in full. A self-closing element is reopened
/// as `<tag ...>content</tag>`.
pub fn replace_content(html: &str, span: &ElementSpan, content: &str) -> String {
    let mut out = String::with_capacity(html.len() + content.len());
    if span.self_closing {
        let open = html[span.start..span.open_end]
            .trim_end_matches('>')
            .trim_end_matches('/')
            .trim_end();
        out.push_str(&html[..span.start]);
        out.push_str(open);
        out.push('>');
        out.push_str(content);
        out.push_str(&format!("</{}>", span.name));
        out.push_str(&html[span.end..]);
    } else {
        out.push_str(&html[..span.open_end]);
        out.push_str(content);
        out.push_str(&html[span.close_start..]);
    }
    out
}

/// A pending replacement of `range` by `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub text: String,
}

impl Edit {
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at..at, text)
    }
}

/// Apply non-overlapping edits in one pass.
pub fn apply_edits(html: &str, mut edits: Vec<Edit>) -> String {
    if edits.is_empty() {
        return html.to_owned();
    }
    edits.sort_by_key(|edit| (edit.range.start, edit.range.end));

    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.range.start < cursor {
            continue;
        }
        out.push_str(&html[cursor..edit.range.start]);
        out.push_str(&edit.text);
        cursor = edit.range.end;
    }
    out.push_str(&html[cursor..]);
    out
}

/// Re-render selected start tags. `f` returns the replacement for a tag, or
/// `None` to keep it.
pub fn rewrite_tags<F>(html: &str, mut f: F) -> String
where
    F: FnMut(&Tag<'_>) -> Option<String>,
{
    let edits = Tags::new(html)
        .filter(Tag::opens)
        .filter_map(|tag| f(&tag).map(|text| Edit::replace(tag.range.clone(), text)))
        .collect();
    apply_edits(html, edits)
}
