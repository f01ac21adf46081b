//! Batch extraction over every device in the source directories
//!
//! Devices are independent: a failure on one is logged and counted, and the
//! batch moves on. Only discovery failures abort the run.

use crate::core::collection::{DeviceCollection, MergeKind};
use crate::core::error::EdmError;
use crate::core::record::{assemble, Assembled};
use crate::core::reference::ReferenceTable;
use crate::core::sources::SourceLayout;

/// Counts reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub processed: usize,
    pub skipped: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Devices whose module dependencies could not be fully ordered
    pub stalled: usize,
}

/// What happened to one device
#[derive(Debug)]
pub enum DeviceReport<'a> {
    Merged {
        device: &'a str,
        kind: MergeKind,
        assembled: &'a Assembled,
    },
    Failed {
        device: &'a str,
        error: &'a EdmError,
    },
}

/// Extract every device under `layout` and fold it into `collection`
///
/// `on_device` is called once per device, in processing order.
pub fn run_batch(
    layout: &SourceLayout,
    table: &ReferenceTable,
    collection: &mut DeviceCollection,
    mut on_device: impl FnMut(DeviceReport<'_>),
) -> Result<BatchStats, EdmError> {
    let devices = layout.discover_devices()?;
    log::info!("{} devices in {}", devices.len(), layout.dietest.display());

    let mut stats = BatchStats::default();
    for device in &devices {
        match process_device(layout, table, collection, device) {
            Ok((kind, assembled)) => {
                stats.processed += 1;
                match kind {
                    MergeKind::Inserted => stats.inserted += 1,
                    MergeKind::Updated => stats.updated += 1,
                }
                if !assembled.resolution.is_resolved() {
                    stats.stalled += 1;
                }
                on_device(DeviceReport::Merged {
                    device,
                    kind,
                    assembled: &assembled,
                });
            }
            Err(error) => {
                stats.skipped += 1;
                log::warn!("skipping {}: {}", device, error);
                on_device(DeviceReport::Failed {
                    device,
                    error: &error,
                });
            }
        }
    }

    Ok(stats)
}

fn process_device(
    layout: &SourceLayout,
    table: &ReferenceTable,
    collection: &mut DeviceCollection,
    device: &str,
) -> Result<(MergeKind, Assembled), EdmError> {
    let sources = layout.read(device)?;
    let assembled = assemble(&sources, table);
    let kind = collection.merge(device, &assembled.record)?;
    log::debug!(
        "{}: {} modules, {} grid dies",
        device,
        assembled.record.modules.len(),
        assembled.record.waf.len()
    );
    Ok((kind, assembled))
}
