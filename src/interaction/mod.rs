//! Interaction state of a composed page.
//!
//! The markup side (dropdown arrows, `align-right`) is applied while composing,
//! see [`crate::html::nav::wire_dropdowns`]. This module holds the runtime
//! state machines behind it:
//!
//! - [`DropdownGroup`]: first click opens, second click follows the link
//! - [`MobileMenu`]: collapsible navbar below the breakpoint
//! - [`Slideshow`]: wrap-around cursor, driven by [`slideshow::spawn`]

pub mod dropdown;
pub mod menu;
pub mod slideshow;

pub use dropdown::{Activation, DropdownGroup};
pub use menu::MobileMenu;
pub use slideshow::{SlideCommand, SlideState, Slideshow, SlideshowHandle};
