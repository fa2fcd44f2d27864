//! Data preparation steps between ingest and the final bundle.
//!
//! - missing value handling (`fill`)
//! - hour-of-day detrending (`detrend`)
//! - temperature/calendar features (`exogenous`)
//! - train/valid/test partitioning (`split`)

pub mod detrend;
pub mod exogenous;
pub mod fill;
pub mod split;

pub use detrend::*;
pub use exogenous::*;
pub use fill::*;
pub use split::*;
