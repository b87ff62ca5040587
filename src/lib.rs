//! stitch - compose static pages from shared html fragments.
//!
//! Every page of a site pulls in the same header, navbar, sidebar and footer
//! from `components/`, no matter how deeply it is nested. [`bootstrap`] does
//! that composition for one page; [`build`] runs it over a whole site and
//! [`serve`] runs it per request.

pub mod bootstrap;
pub mod build;
pub mod cli;
pub mod config;
pub mod fragment;
pub mod html;
pub mod interaction;
pub mod path;
pub mod serve;
pub mod utils;
pub mod watch;
