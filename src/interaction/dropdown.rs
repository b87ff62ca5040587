//! Navbar dropdown state.

use crate::html::markup::Tags;

/// What a click on a dropdown's parent link does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The dropdown was closed: it opens and navigation is suppressed.
    Opened,
    /// The dropdown was already open: the link is followed.
    Navigate,
}

/// The dropdowns of one navbar. At most one is open at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropdownGroup {
    open: Option<usize>,
    count: usize,
}

impl DropdownGroup {
    pub const fn new(count: usize) -> Self {
        Self { open: None, count }
    }

    /// One dropdown per `li.dropdown` in the navbar markup.
    pub fn from_navbar(nav: &str) -> Self {
        let count = Tags::new(nav)
            .filter(|tag| tag.opens() && tag.is("li") && tag.has_class("dropdown"))
            .count();
        Self::new(count)
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub const fn open(&self) -> Option<usize> {
        self.open
    }

    #[inline]
    pub fn is_open(&self, index: usize) -> bool {
        self.open == Some(index)
    }

    /// Click on the parent link of dropdown `index`.
    ///
    /// Every other dropdown closes. Returns `None` for an unknown index.
    pub fn activate(&mut self, index: usize) -> Option<Activation> {
        if index >= self.count {
            return None;
        }
        if self.is_open(index) {
            Some(Activation::Navigate)
        } else {
            self.open = Some(index);
            Some(Activation::Opened)
        }
    }

    /// Interaction outside the navbar.
    #[inline]
    pub fn dismiss(&mut self) {
        self.close_all();
    }

    #[inline]
    pub fn close_all(&mut self) {
        self.open = None;
    }
}
