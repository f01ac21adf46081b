//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::error::EdmError;
use crate::core::sources::SourceLayout;
use crate::formats::Family;

/// Local config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "edm.yaml";

const DEFAULT_OUTPUT: &str = "output.json";

/// Extraction settings with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the four family directories
    pub source_root: Option<PathBuf>,

    /// Per-family overrides, relative to `source_root` unless absolute
    pub dietest_dir: Option<PathBuf>,
    pub die_dir: Option<PathBuf>,
    pub wafer_dir: Option<PathBuf>,
    pub wafertest_dir: Option<PathBuf>,

    /// Module definition table exported as CSV
    pub reference_table: Option<PathBuf>,

    /// Persisted collection path
    pub output: Option<PathBuf>,

    /// Optional text export written next to the collection
    pub text_output: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    ///
    /// `explicit` replaces the local `edm.yaml` lookup; unlike the implicit
    /// files it must exist and parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, EdmError> {
        let mut config = Config::default();

        // 1. Built-in defaults (applied by the accessors)

        // 2. Global user config (~/.config/edm/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                match Self::from_file(&global_path) {
                    Ok(global) => config.merge(global),
                    Err(e) => log::warn!("ignoring global config: {}", e),
                }
            }
        }

        // 3. Local config (edm.yaml or --config)
        match explicit {
            Some(path) => config.merge(Self::from_file(path)?),
            None => {
                let local = Path::new(LOCAL_CONFIG_FILE);
                if local.exists() {
                    match Self::from_file(local) {
                        Ok(local) => config.merge(local),
                        Err(e) => log::warn!("ignoring {}: {}", LOCAL_CONFIG_FILE, e),
                    }
                }
            }
        }

        // 4. Environment variables
        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, EdmError> {
        let contents = std::fs::read_to_string(path).map_err(|e| EdmError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_yml::from_str(&contents).map_err(|e| EdmError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "edm")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Apply `EDM_SOURCE_ROOT`, `EDM_REFERENCE_TABLE` and `ETEST_JSON_PATH`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        if let Some(root) = var("EDM_SOURCE_ROOT") {
            self.source_root = Some(root);
        }
        if let Some(table) = var("EDM_REFERENCE_TABLE") {
            self.reference_table = Some(table);
        }
        if let Some(output) = var("ETEST_JSON_PATH") {
            self.output = Some(output);
        }
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.source_root.is_some() {
            self.source_root = other.source_root;
        }
        if other.dietest_dir.is_some() {
            self.dietest_dir = other.dietest_dir;
        }
        if other.die_dir.is_some() {
            self.die_dir = other.die_dir;
        }
        if other.wafer_dir.is_some() {
            self.wafer_dir = other.wafer_dir;
        }
        if other.wafertest_dir.is_some() {
            self.wafertest_dir = other.wafertest_dir;
        }
        if other.reference_table.is_some() {
            self.reference_table = other.reference_table;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.text_output.is_some() {
            self.text_output = other.text_output;
        }
    }

    pub fn source_root(&self) -> PathBuf {
        self.source_root.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Family directories after overrides
    pub fn layout(&self) -> SourceLayout {
        let root = self.source_root();
        let dir = |over: &Option<PathBuf>, family: Family| match over {
            Some(dir) => root.join(dir),
            None => root.join(family.dir_name()),
        };

        SourceLayout {
            dietest: dir(&self.dietest_dir, Family::DieTest),
            die: dir(&self.die_dir, Family::Die),
            wafer: dir(&self.wafer_dir, Family::Wafer),
            wafertest: dir(&self.wafertest_dir, Family::WaferTest),
        }
    }

    pub fn output(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
    }
}
