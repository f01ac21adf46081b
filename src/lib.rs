//! EDM: E-test Device Metadata
//!
//! Extracts per-device module placement and wafer geometry from wafer-probe
//! equipment files and folds it into a JSON collection keyed by device.

pub mod cli;
pub mod core;
pub mod formats;
