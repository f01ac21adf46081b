//! Persisted device collection
//!
//! The collection is a JSON object keyed by device identifier. It is held as
//! raw JSON so fields written by other tools (most importantly `prb`) survive
//! a rewrite untouched, and key order is kept so unchanged inputs produce a
//! byte-identical file.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::core::error::{CollectionSyntaxError, EdmError};
use crate::core::record::DeviceRecord;

/// Fields owned by the extractor; everything else in an entry is left alone
const REPLACED_FIELDS: [&str; 3] = ["mod", "waf", "wafer"];

/// How a device was folded into the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    Inserted,
    Updated,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceCollection {
    entries: Map<String, Value>,
}

impl DeviceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a collection; a missing or blank file is an empty collection
    pub fn load(path: &Path) -> Result<Self, EdmError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no collection at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(EdmError::CollectionRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::from_json_str(&content, path)
    }

    /// Parse collection text; `path` names the source in diagnostics
    pub fn from_json_str(content: &str, path: &Path) -> Result<Self, EdmError> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }

        let value: Value = serde_json::from_str(content).map_err(|e| {
            CollectionSyntaxError::from_serde_error(&e, content, &path.display().to_string())
        })?;

        match value {
            Value::Object(entries) => Ok(Self { entries }),
            _ => Err(EdmError::CollectionShape {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Fold a freshly assembled record into the collection
    ///
    /// An existing entry keeps its position and any unrelated fields; `mod`,
    /// `waf` and `wafer` are replaced and `prb` is only filled in while it is
    /// null or absent. A new device is inserted as the record stands.
    pub fn merge(&mut self, device: &str, record: &DeviceRecord) -> Result<MergeKind, EdmError> {
        let mut fresh = record_fields(record)?;

        let Some(existing) = self.entries.get_mut(device) else {
            self.entries.insert(device.to_string(), Value::Object(fresh));
            return Ok(MergeKind::Inserted);
        };

        let Some(entry) = existing.as_object_mut() else {
            log::warn!("{}: existing entry is not an object, replacing it", device);
            *existing = Value::Object(fresh);
            return Ok(MergeKind::Updated);
        };

        for field in REPLACED_FIELDS {
            if let Some(value) = fresh.remove(field) {
                entry.insert(field.to_string(), value);
            }
        }
        if entry.get("prb").map_or(true, Value::is_null) {
            let prb = fresh.remove("prb").unwrap_or(Value::Null);
            entry.insert("prb".to_string(), prb);
        }

        Ok(MergeKind::Updated)
    }

    pub fn get(&self, device: &str) -> Option<&Value> {
        self.entries.get(device)
    }

    pub fn contains(&self, device: &str) -> bool {
        self.entries.contains_key(device)
    }

    /// Entries in stored order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty JSON with 4-space indentation and a trailing newline
    pub fn to_json_string(&self) -> Result<String, EdmError> {
        let mut buf = Vec::new();
        let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.entries.serialize(&mut ser)?;
        buf.push(b'\n');
        String::from_utf8(buf)
            .map_err(|e| EdmError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    /// Write the collection, replacing `path` only once the new file is complete
    pub fn save(&self, path: &Path) -> Result<(), EdmError> {
        write_atomic(path, &self.to_json_string()?)
    }

    /// Human-readable rendering of every device
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for (device, entry) in self.iter() {
            render_device(&mut out, device, entry);
        }
        out
    }
}

/// Serialized fields of a record, in output order
fn record_fields(record: &DeviceRecord) -> Result<Map<String, Value>, EdmError> {
    let mut fields = Map::new();
    fields.insert("prb".to_string(), serde_json::to_value(&record.prb)?);
    fields.insert("mod".to_string(), serde_json::to_value(&record.modules)?);
    fields.insert("waf".to_string(), serde_json::to_value(&record.waf)?);
    fields.insert("wafer".to_string(), serde_json::to_value(&record.wafer)?);
    Ok(fields)
}

/// Write `content` to a temporary file beside `path`, then rename it over `path`
pub fn write_atomic(path: &Path, content: &str) -> Result<(), EdmError> {
    let write_err = |source| EdmError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Render a JSON scalar the way the text export shows it; null is `None`
fn scalar(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "None".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn pair(value: Option<&Value>, a: &str, b: &str) -> String {
    format!(
        "({}, {})",
        scalar(value.and_then(|v| v.get(a))),
        scalar(value.and_then(|v| v.get(b)))
    )
}

fn render_device(out: &mut String, device: &str, entry: &Value) {
    let empty = Vec::new();
    let list = |key: &str| entry.get(key).and_then(Value::as_array).unwrap_or(&empty);
    let wafer = entry.get("wafer");
    let w = |key: &str| wafer.and_then(|v| v.get(key));

    let _ = writeln!(out, "File: {}", device);
    let _ = writeln!(out, "PRB: {}", scalar(entry.get("prb")));
    let _ = writeln!(out, "MOD List (name, x, y):");
    for m in list("mod") {
        let _ = writeln!(
            out,
            "  - {}: x={}, y={}",
            scalar(m.get("name")),
            scalar(m.get("x")),
            scalar(m.get("y"))
        );
    }
    let _ = writeln!(out, "WAF die grid coords:");
    for cr in list("waf") {
        let _ = writeln!(out, "  - {}", scalar(Some(cr)));
    }
    let _ = writeln!(out, "Wafer summary:");
    let _ = writeln!(
        out,
        "  - stepX_um={}, stepY_um={}, flat={} ({}°)",
        scalar(w("stepX_um")),
        scalar(w("stepY_um")),
        scalar(w("flatLocation")),
        scalar(w("flatAngleDeg"))
    );
    let _ = writeln!(
        out,
        "  - alignDie={}, alignModule={}, alignModuleXY_um={}",
        pair(w("alignDie"), "x", "y"),
        scalar(w("alignModule")),
        pair(w("alignModuleXY_um"), "x", "y")
    );
    let _ = writeln!(
        out,
        "  - centerDie={}, offset_um={}",
        pair(w("centerDie"), "x", "y"),
        pair(w("centerDie"), "offsetX_um", "offsetY_um")
    );
    out.push('\n');
}
