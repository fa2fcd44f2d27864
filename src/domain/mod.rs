//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - option enums (`SplitType`, `ScalerKind`, `FillNan`) and run options (`LoadOptions`)
//! - dataset configuration (`DatasetConfig`)
//! - raw and cleaned series rows (`RawRecord`, `LoadSeries`)
//! - split containers and the output bundle (`SplitArray`, `DatasetBundle`)

pub mod types;

pub use types::*;
