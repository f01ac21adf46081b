//! CLI command implementations

pub mod completions;
pub mod devices;
pub mod extract;
pub mod mods;
pub mod show;
