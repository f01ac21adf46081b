//! Raw record reader
//!
//! A device is identified by its file name, which is the same in all four
//! family directories. The DIETEST file defines the device; the other three
//! are optional and a missing one parses as empty.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::core::error::EdmError;
use crate::formats::Family;

/// Locations of the four family directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    pub dietest: PathBuf,
    pub die: PathBuf,
    pub wafer: PathBuf,
    pub wafertest: PathBuf,
}

impl SourceLayout {
    /// Conventional layout: `DIETEST`, `DIE`, `WAFER`, `WAFERTEST` under `root`
    pub fn under(root: &Path) -> Self {
        Self {
            dietest: root.join(Family::DieTest.dir_name()),
            die: root.join(Family::Die.dir_name()),
            wafer: root.join(Family::Wafer.dir_name()),
            wafertest: root.join(Family::WaferTest.dir_name()),
        }
    }

    pub fn dir(&self, family: Family) -> &Path {
        match family {
            Family::DieTest => &self.dietest,
            Family::Die => &self.die,
            Family::Wafer => &self.wafer,
            Family::WaferTest => &self.wafertest,
        }
    }

    pub fn path(&self, family: Family, device: &str) -> PathBuf {
        self.dir(family).join(device)
    }

    /// Device identifiers: every regular file in the DIETEST directory, by name
    pub fn discover_devices(&self) -> Result<Vec<String>, EdmError> {
        if !self.dietest.is_dir() {
            return Err(EdmError::SourceDirNotFound {
                path: self.dietest.clone(),
            });
        }

        let mut devices = Vec::new();
        for entry in WalkDir::new(&self.dietest)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| EdmError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                devices.push(name.to_string());
            } else {
                log::warn!("skipping non UTF-8 file name {:?}", entry.file_name());
            }
        }

        Ok(devices)
    }

    /// Read all four files of a device
    pub fn read(&self, device: &str) -> Result<DeviceSources, EdmError> {
        let device_err = |source| EdmError::Device {
            device: device.to_string(),
            source,
        };

        let dietest = read_lossy(&self.path(Family::DieTest, device))
            .map_err(device_err)?
            .ok_or_else(|| {
                device_err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no {} file", Family::DieTest),
                ))
            })?;

        let optional = |family: Family| -> Result<Option<String>, EdmError> {
            let text = read_lossy(&self.path(family, device)).map_err(device_err)?;
            if text.is_none() {
                log::debug!("{}: no {} file", device, family);
            }
            Ok(text)
        };

        Ok(DeviceSources {
            device: device.to_string(),
            dietest,
            die: optional(Family::Die)?,
            wafer: optional(Family::Wafer)?,
            wafertest: optional(Family::WaferTest)?,
        })
    }
}

/// Raw text of one device's files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSources {
    pub device: String,
    pub dietest: String,
    pub die: Option<String>,
    pub wafer: Option<String>,
    pub wafertest: Option<String>,
}

impl DeviceSources {
    /// Text of a family, empty when the file is missing
    pub fn text(&self, family: Family) -> &str {
        match family {
            Family::DieTest => &self.dietest,
            Family::Die => self.die.as_deref().unwrap_or(""),
            Family::Wafer => self.wafer.as_deref().unwrap_or(""),
            Family::WaferTest => self.wafertest.as_deref().unwrap_or(""),
        }
    }
}

/// Read a file as text, dropping undecodable bytes
///
/// Returns `Ok(None)` when the file does not exist.
pub fn read_lossy(path: &Path) -> io::Result<Option<String>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let text = match String::from_utf8_lossy(&bytes) {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s.replace(char::REPLACEMENT_CHARACTER, ""),
    };
    Ok(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn layout_with(files: &[(Family, &str, &[u8])]) -> (tempfile::TempDir, SourceLayout) {
        let tmp = tempdir().unwrap();
        let layout = SourceLayout::under(tmp.path());
        for family in Family::ALL {
            fs::create_dir_all(layout.dir(family)).unwrap();
        }
        for (family, name, content) in files {
            fs::write(layout.path(*family, name), content).unwrap();
        }
        (tmp, layout)
    }

    #[test]
    fn test_discover_devices_sorted_files_only() {
        let (_tmp, layout) = layout_with(&[
            (Family::DieTest, "DEV_B", b"x"),
            (Family::DieTest, "DEV_A", b"x"),
            (Family::Die, "DEV_C", b"x"),
        ]);
        fs::create_dir(layout.dietest.join("subdir")).unwrap();
        assert_eq!(layout.discover_devices().unwrap(), vec!["DEV_A", "DEV_B"]);
    }

    #[test]
    fn test_discover_devices_missing_dir() {
        let layout = SourceLayout::under(Path::new("/nonexistent/root"));
        let err = layout.discover_devices().unwrap_err();
        assert!(matches!(err, EdmError::SourceDirNotFound { .. }));
    }

    #[test]
    fn test_read_optional_files_missing() {
        let (_tmp, layout) = layout_with(&[(Family::DieTest, "DEV", b"T-B\nM1: a\n")]);
        let sources = layout.read("DEV").unwrap();
        assert_eq!(sources.dietest, "T-B\nM1: a\n");
        assert!(sources.die.is_none());
        assert_eq!(sources.text(Family::Wafer), "");
    }

    #[test]
    fn test_read_without_dietest_fails() {
        let (_tmp, layout) = layout_with(&[(Family::Die, "DEV", b"x")]);
        let err = layout.read("DEV").unwrap_err();
        assert!(matches!(err, EdmError::Device { .. }));
    }

    #[test]
    fn test_read_lossy_drops_invalid_bytes() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("f");
        fs::write(&path, b"ab\xffcd").unwrap();
        assert_eq!(read_lossy(&path).unwrap(), Some("abcd".to_string()));
        assert_eq!(read_lossy(&tmp.path().join("missing")).unwrap(), None);
    }
}
