//! Reference classifier over the module definition table
//!
//! The table is an export of the module definition spreadsheet: one
//! `MODULE_NAME` column plus any number of attribute columns, with zero or
//! more rows per module. Each row is kept as its stringified text, every cell
//! joined by a single space, because dependency detection works by plain
//! substring containment over that text.

use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::core::error::EdmError;

const MODULE_NAME_COLUMN: &str = "module_name";

/// Whether a module has a colon-bearing definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyClass {
    /// No row mentions a colon (or the module is not in the table)
    NoColon,
    /// At least one row contains a colon; may depend on other modules
    YesColon,
}

/// Read-only module definition lookup, loaded once per batch
#[derive(Debug, Default, Clone)]
pub struct ReferenceTable {
    rows: HashMap<String, Vec<String>>,
}

impl ReferenceTable {
    /// Load the table from a CSV file
    pub fn load(path: &Path) -> Result<Self, EdmError> {
        let rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| EdmError::ReferenceTable {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_csv(rdr, path)
    }

    /// Load the table from any CSV reader; `path` is only used in errors
    pub fn from_reader<R: Read>(reader: R, path: &Path) -> Result<Self, EdmError> {
        let rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::from_csv(rdr, path)
    }

    fn from_csv<R: Read>(mut rdr: csv::Reader<R>, path: &Path) -> Result<Self, EdmError> {
        let to_err = |source| EdmError::ReferenceTable {
            path: path.to_path_buf(),
            source,
        };

        let headers = rdr.headers().map_err(to_err)?.clone();
        let name_idx = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(MODULE_NAME_COLUMN))
            .ok_or_else(|| EdmError::MissingModuleColumn {
                path: path.to_path_buf(),
            })?;

        let mut table = Self::default();
        for result in rdr.records() {
            let record = result.map_err(to_err)?;
            let Some(name) = record.get(name_idx).filter(|n| !n.is_empty()) else {
                continue;
            };
            let text = record.iter().collect::<Vec<_>>().join(" ");
            table.push_row(name, text);
        }

        log::debug!(
            "loaded {} module definitions from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Build a table from `(module name, row text)` pairs
    pub fn from_rows<I, N, T>(rows: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        let mut table = Self::default();
        for (name, text) in rows {
            table.push_row(name, text);
        }
        table
    }

    fn push_row(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.rows.entry(name.into()).or_default().push(text.into());
    }

    /// Row texts for a module, by exact name
    pub fn rows(&self, module: &str) -> &[String] {
        self.rows.get(module).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, module: &str) -> bool {
        self.rows.contains_key(module)
    }

    /// Classify a module; names missing from the table are `NoColon`
    pub fn classify(&self, module: &str) -> DependencyClass {
        if !self.contains(module) {
            log::debug!("{}: not in module definition table", module);
            return DependencyClass::NoColon;
        }
        if self.rows(module).iter().any(|row| row.contains(':')) {
            DependencyClass::YesColon
        } else {
            DependencyClass::NoColon
        }
    }

    /// Whether any of `module`'s rows mentions `other` as a substring
    pub fn mentions(&self, module: &str, other: &str) -> bool {
        self.rows(module).iter().any(|row| row.contains(other))
    }

    /// Number of distinct module names
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
