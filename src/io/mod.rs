//! Input/output helpers.
//!
//! - CSV ingest of raw task files and the merged dataset (`ingest`)
//! - merged-layout CSV export (`export`)
//! - prebuilt bundle store (`cache`)

pub mod cache;
pub mod export;
pub mod ingest;

pub use cache::*;
pub use export::*;
pub use ingest::*;
