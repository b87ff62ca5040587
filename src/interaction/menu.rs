//! Mobile menu toggle.

use super::DropdownGroup;

/// Viewport width (px) at which the navbar stops collapsing.
pub const BREAKPOINT: u32 = 768;

pub const OPEN_LABEL: &str = "☰ Menu";
pub const CLOSE_LABEL: &str = "✕ Close";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MobileMenu {
    expanded: bool,
    breakpoint: u32,
}

impl Default for MobileMenu {
    fn default() -> Self {
        Self::new(BREAKPOINT)
    }
}

impl MobileMenu {
    pub const fn new(breakpoint: u32) -> Self {
        Self {
            expanded: false,
            breakpoint,
        }
    }

    #[inline]
    pub const fn is_expanded(&self) -> bool {
        self.expanded
    }

    #[inline]
    pub const fn is_mobile(&self, width: u32) -> bool {
        width < self.breakpoint
    }

    /// Toggle button clicked at viewport `width`. Returns the new state.
    ///
    /// Ignored on wide viewports, where the toggle is hidden.
    pub fn toggle(&mut self, width: u32) -> bool {
        if self.is_mobile(width) {
            self.expanded = !self.expanded;
        }
        self.expanded
    }

    /// Text of the toggle button.
    pub const fn label(&self) -> &'static str {
        if self.expanded { CLOSE_LABEL } else { OPEN_LABEL }
    }

    /// Viewport resized to `width`: leaving the mobile layout collapses the
    /// menu and closes every dropdown.
    pub fn resize(&mut self, width: u32, dropdowns: &mut DropdownGroup) {
        if !self.is_mobile(width) {
            self.expanded = false;
            dropdowns.close_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_below_breakpoint() {
        let mut menu = MobileMenu::default();
        assert_eq!(menu.label(), OPEN_LABEL);
        assert!(menu.toggle(375));
        assert_eq!(menu.label(), CLOSE_LABEL);
        assert!(!menu.toggle(375));
        assert_eq!(menu.label(), OPEN_LABEL);
    }

    #[test]
    fn test_toggle_ignored_on_desktop() {
        let mut menu = MobileMenu::default();
        assert!(!menu.toggle(BREAKPOINT));
        assert!(!menu.toggle(1280));
        assert_eq!(menu.label(), OPEN_LABEL);
    }

    #[test]
    fn test_resize_to_desktop_collapses() {
        let mut menu = MobileMenu::default();
        let mut dropdowns = DropdownGroup::new(3);
        menu.toggle(600);
        dropdowns.activate(1);

        menu.resize(700, &mut dropdowns);
        assert!(menu.is_expanded());
        assert!(dropdowns.is_open(1));

        menu.resize(BREAKPOINT, &mut dropdowns);
        assert!(!menu.is_expanded());
        assert_eq!(dropdowns.open(), None);
    }

    #[test]
    fn test_custom_breakpoint() {
        let mut menu = MobileMenu::new(1024);
        assert!(menu.toggle(900));
    }
}
