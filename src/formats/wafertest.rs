//! WAFERTEST file parsing - probe card, align die and align module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::numeric::labeled_field;

static WAFER_TYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"WaferType:\s+(.*)").unwrap());
static PROBE_CARD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ProbeCard:\s+(.*)").unwrap());
static ALIGN_DIE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Align Die:\s+(\d+,\d+)").unwrap());
static ALIGN_MODULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Align Module:\s+(.*)").unwrap());

/// Grid position of a die
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiePosition {
    pub x: i64,
    pub y: i64,
}

impl DiePosition {
    /// Parse a `"col,row"` pair
    pub fn parse(pair: &str) -> Option<Self> {
        let (x, y) = pair.split_once(',')?;
        Some(Self {
            x: x.trim().parse().ok()?,
            y: y.trim().parse().ok()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaferTestInfo {
    pub wafer_type: String,
    pub probe_card: String,
    pub align_die: DiePosition,
    pub align_module: String,
}

pub fn parse_info(text: &str) -> WaferTestInfo {
    WaferTestInfo {
        wafer_type: labeled_field(&WAFER_TYPE, text),
        probe_card: labeled_field(&PROBE_CARD, text),
        align_die: DiePosition::parse(&labeled_field(&ALIGN_DIE, text)).unwrap_or_default(),
        align_module: labeled_field(&ALIGN_MODULE, text),
    }
}
