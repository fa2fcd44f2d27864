//! Terminal output for prepared bundles.
//!
//! Formatting lives here so the preparation code never prints.

pub mod format;

pub use format::*;
