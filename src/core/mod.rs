//! Core module - extraction pipeline, persisted collection and settings

pub mod batch;
pub mod collection;
pub mod config;
pub mod error;
pub mod geometry;
pub mod query;
pub mod record;
pub mod reference;
pub mod resolver;
pub mod sources;

pub use batch::{run_batch, BatchStats, DeviceReport};
pub use collection::{DeviceCollection, MergeKind};
pub use config::Config;
pub use error::EdmError;
pub use geometry::{CenterDie, GridExtents};
pub use record::{assemble, Assembled, DeviceRecord, ModuleEntry, PointUm, WaferGeometry};
pub use reference::{DependencyClass, ReferenceTable};
pub use resolver::{resolve_order, DependencyGraph, Outcome, Resolution};
pub use sources::{DeviceSources, SourceLayout};
