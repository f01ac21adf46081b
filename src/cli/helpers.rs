//! Shared helper functions for CLI commands

use miette::Result;
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::core::{Config, ReferenceTable};
use crate::formats::Number;

/// Source and output locations shared by the extracting commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Directory holding DIETEST, DIE, WAFER and WAFERTEST
    #[arg(long, short = 's', value_name = "DIR")]
    pub source_root: Option<PathBuf>,

    /// DIETEST directory (relative to the source root unless absolute)
    #[arg(long, value_name = "DIR")]
    pub dietest_dir: Option<PathBuf>,

    /// DIE directory
    #[arg(long, value_name = "DIR")]
    pub die_dir: Option<PathBuf>,

    /// WAFER directory
    #[arg(long, value_name = "DIR")]
    pub wafer_dir: Option<PathBuf>,

    /// WAFERTEST directory
    #[arg(long, value_name = "DIR")]
    pub wafertest_dir: Option<PathBuf>,

    /// Module definition table (CSV with a MODULE_NAME column)
    #[arg(long, short = 'r', value_name = "FILE")]
    pub reference: Option<PathBuf>,

    /// Output collection (default: output.json)
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl SourceArgs {
    /// The command-line layer of the configuration
    pub fn as_config(&self) -> Config {
        Config {
            source_root: self.source_root.clone(),
            dietest_dir: self.dietest_dir.clone(),
            die_dir: self.die_dir.clone(),
            wafer_dir: self.wafer_dir.clone(),
            wafertest_dir: self.wafertest_dir.clone(),
            reference_table: self.reference.clone(),
            output: self.output.clone(),
            text_output: None,
        }
    }
}

/// Load layered configuration with `flags` applied last
pub fn load_config(global: &GlobalOpts, flags: Config) -> Result<Config> {
    let mut config = Config::load(global.config.as_deref())?;
    config.merge(flags);
    Ok(config)
}

/// Load the reference table, or an empty one when none is configured
pub fn load_reference(config: &Config) -> Result<ReferenceTable> {
    match &config.reference_table {
        Some(path) => {
            let table = ReferenceTable::load(path)?;
            if table.is_empty() {
                log::warn!("{} has no module definitions", path.display());
            }
            Ok(table)
        }
        None => {
            log::warn!("no reference table configured; modules keep discovery order");
            Ok(ReferenceTable::default())
        }
    }
}

/// Format an optional coordinate for display
pub fn format_coord(value: Option<Number>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_coord() {
        assert_eq!(format_coord(Some(Number::Int(100))), "100");
        assert_eq!(format_coord(Some(Number::Float(-50.5))), "-50.5");
        assert_eq!(format_coord(None), "-");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }

    #[test]
    fn test_source_args_as_config() {
        let args = SourceArgs {
            source_root: Some("/data".into()),
            reference: Some("ref.csv".into()),
            ..Default::default()
        };
        let config = args.as_config();
        assert_eq!(config.source_root, Some(PathBuf::from("/data")));
        assert_eq!(config.reference_table, Some(PathBuf::from("ref.csv")));
        assert!(config.output.is_none());
    }

    #[test]
    fn test_load_reference() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("modules.csv");
        std::fs::write(&path, "MODULE_NAME,TEST\n").unwrap();

        let config = Config {
            reference_table: Some(path),
            ..Default::default()
        };
        assert!(load_reference(&config).unwrap().is_empty());
        assert!(load_reference(&Config::default()).unwrap().is_empty());
    }
}
