//! Read-side views over a persisted collection

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::collection::DeviceCollection;
use crate::core::record::ModuleEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub name: String,
    pub prb: Option<String>,
    /// Length of the device's module list
    #[serde(skip)]
    pub module_count: usize,
}

/// A module name and the devices that carry it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSources {
    pub name: String,
    pub devices: Vec<String>,
}

fn module_list(entry: &Value) -> &[Value] {
    entry
        .get("mod")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Every device with its `prb`, sorted by name
///
/// With `only_with_modules`, devices whose module list is empty or missing
/// are left out.
pub fn list_devices(collection: &DeviceCollection, only_with_modules: bool) -> Vec<DeviceSummary> {
    let mut devices: Vec<DeviceSummary> = collection
        .iter()
        .map(|(name, entry)| DeviceSummary {
            name: name.to_string(),
            prb: entry.get("prb").and_then(Value::as_str).map(str::to_string),
            module_count: module_list(entry).len(),
        })
        .filter(|d| !only_with_modules || d.module_count > 0)
        .collect();
    devices.sort_by(|a, b| a.name.cmp(&b.name));
    devices
}

/// A device's ordered module list; empty when the device is unknown
///
/// Entries that do not have the `{name, x, y}` shape are skipped.
pub fn device_modules(collection: &DeviceCollection, device: &str) -> Vec<ModuleEntry> {
    collection
        .get(device)
        .map(module_list)
        .unwrap_or(&[])
        .iter()
        .filter_map(|m| serde_json::from_value(m.clone()).ok())
        .collect()
}

/// Distinct module names across `devices`, each with the sorted devices using it
///
/// Names are trimmed; blank names and unknown devices are ignored.
pub fn module_sources<S: AsRef<str>>(
    collection: &DeviceCollection,
    devices: &[S],
) -> Vec<ModuleSources> {
    let mut index: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for device in devices {
        let device = device.as_ref();
        let Some(entry) = collection.get(device) else {
            log::debug!("ignoring unknown device {}", device);
            continue;
        };
        for m in module_list(entry) {
            let Some(name) = m.get("name").and_then(Value::as_str).map(str::trim) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            index
                .entry(name.to_string())
                .or_default()
                .insert(device.to_string());
        }
    }

    index
        .into_iter()
        .map(|(name, devices)| ModuleSources {
            name,
            devices: devices.into_iter().collect(),
        })
        .collect()
}
