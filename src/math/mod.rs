//! Mathematical utilities: descriptive statistics and feature scaling.

pub mod scaler;
pub mod stats;

pub use scaler::*;
pub use stats::*;
