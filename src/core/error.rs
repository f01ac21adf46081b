//! Error types for extraction runs
//!
//! Only failures that make a whole run meaningless are errors here. Missing
//! per-device files and unparseable fields degrade to defaults instead.

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum EdmError {
    #[error("cannot read reference table {path:?}")]
    #[diagnostic(
        code(edm::reference::read),
        help("export the module definition spreadsheet as CSV with a MODULE_NAME column")
    )]
    ReferenceTable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("reference table {path:?} has no MODULE_NAME column")]
    #[diagnostic(code(edm::reference::column))]
    MissingModuleColumn { path: PathBuf },

    #[error("invalid config {path:?}: {message}")]
    #[diagnostic(code(edm::config))]
    Config { path: PathBuf, message: String },

    #[error("source directory not found: {path:?}")]
    #[diagnostic(
        code(edm::sources::missing_dir),
        help("set source_root in edm.yaml or pass --source-root")
    )]
    SourceDirNotFound { path: PathBuf },

    #[error("device {device}: {source}")]
    #[diagnostic(code(edm::device))]
    Device {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read output collection {path:?}")]
    #[diagnostic(code(edm::collection::read))]
    CollectionRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    CollectionSyntax(#[from] CollectionSyntaxError),

    #[error("output collection {path:?} must be a JSON object keyed by device")]
    #[diagnostic(code(edm::collection::shape))]
    CollectionShape { path: PathBuf },

    #[error("cannot write output {path:?}")]
    #[diagnostic(code(edm::collection::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode device record: {0}")]
    #[diagnostic(code(edm::collection::encode))]
    Encode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(edm::io))]
    Io(#[from] std::io::Error),
}

/// Syntax error in a persisted collection, pointing at the offending byte
#[derive(Debug, Error, Diagnostic)]
#[error("output collection is not valid JSON: {message}")]
#[diagnostic(
    code(edm::collection::syntax),
    help("fix or remove the file; it is rebuilt from sources on the next run")
)]
pub struct CollectionSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    message: String,
}

impl CollectionSyntaxError {
    pub fn from_serde_error(err: &serde_json::Error, source: &str, filename: &str) -> Self {
        let offset = line_col_to_offset(source, err.line(), err.column());
        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1).min(source.len().max(1))),
            message: err.to_string(),
        }
    }
}

/// Convert a 1-based line/column to a byte offset, clamped to the source
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum::<usize>();
    (line_start + column.saturating_sub(1)).min(source.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_to_offset() {
        let src = "{\n  \"a\": 1,\n  oops\n}";
        assert_eq!(line_col_to_offset(src, 1, 1), 0);
        assert_eq!(line_col_to_offset(src, 3, 3), 14);
        assert_eq!(line_col_to_offset(src, 99, 1), src.len());
    }

    #[test]
    fn test_collection_syntax_error_from_serde() {
        let src = "{\"DEV\": }";
        let err = serde_json::from_str::<serde_json::Value>(src).unwrap_err();
        let diag = CollectionSyntaxError::from_serde_error(&err, src, "output.json");
        assert!(diag.to_string().contains("not valid JSON"));
    }
}
