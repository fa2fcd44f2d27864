//! `gefcom-prep` library crate.
//!
//! Prepares the GEFCom2014 hourly load data for forecasting models: raw
//! ingest, missing-value handling, detrending, exogenous features, scaling and
//! train/valid/test splits, with a prebuilt on-disk cache.
//!
//! The binary (`gefcom`) is a thin wrapper around this library so the whole
//! pipeline is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod prep;
pub mod report;

pub use app::load_data;
