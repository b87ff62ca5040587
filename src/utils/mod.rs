//! Utility modules shared by build and serve.

pub mod log;
pub mod minify;
