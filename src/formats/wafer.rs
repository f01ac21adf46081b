//! WAFER file parsing - header fields, step size, flat and the die grid

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use super::numeric::labeled_field;

static DESC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Desc:\s+(.*)").unwrap());
static CREATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Creation Date:\s+(.*)").unwrap());
static REVISED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Revision Date:\s+(.*)").unwrap());
static STEP_X: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Die X Step:\s+(\d+)").unwrap());
static STEP_Y: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Die Y Step:\s+(\d+)").unwrap());
static FLAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Flat Location\s*\(T,B,L,R\):\s*([TBLR])").unwrap());

/// Marker closing each table section of a WAFER file
const TABLE_END: &str = "(table end)";

/// Section holding the die-position table
const DIE_TABLE_SECTION: usize = 2;

/// Wafer flat (orientation notch) location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FlatLocation {
    #[serde(rename = "T")]
    Top,
    #[serde(rename = "B")]
    Bottom,
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

impl FlatLocation {
    /// Map a location code to a flat location; anything unrecognized is unspecified
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "T" => FlatLocation::Top,
            "B" => FlatLocation::Bottom,
            "L" => FlatLocation::Left,
            "R" => FlatLocation::Right,
            _ => FlatLocation::Unspecified,
        }
    }

    /// Rotation of the flat in degrees
    pub fn angle_deg(&self) -> i64 {
        match self {
            FlatLocation::Top => 0,
            FlatLocation::Right => 90,
            FlatLocation::Bottom => 180,
            FlatLocation::Left => 270,
            FlatLocation::Unspecified => 0,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            FlatLocation::Top => "T",
            FlatLocation::Bottom => "B",
            FlatLocation::Left => "L",
            FlatLocation::Right => "R",
            FlatLocation::Unspecified => "",
        }
    }
}

impl fmt::Display for FlatLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Header and step information from a WAFER file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaferInfo {
    pub desc: String,
    pub created: String,
    pub revised: String,
    pub step_x_um: Option<i64>,
    pub step_y_um: Option<i64>,
    pub flat_location: FlatLocation,
}

/// Parse the labeled header fields of a WAFER file
pub fn parse_info(text: &str) -> WaferInfo {
    WaferInfo {
        desc: labeled_field(&DESC, text),
        created: labeled_field(&CREATED, text),
        revised: labeled_field(&REVISED, text),
        step_x_um: labeled_field(&STEP_X, text).parse().ok(),
        step_y_um: labeled_field(&STEP_Y, text).parse().ok(),
        flat_location: FlatLocation::from_code(&labeled_field(&FLAT, text)),
    }
}

/// Die grid positions as `"col,row"` strings, in file order
///
/// The die-position table is the third `(table end)`-delimited section;
/// files with fewer sections are scanned whole. Every line starting with a
/// digit contributes its first token when that token holds a comma.
pub fn parse_grid(text: &str) -> Vec<String> {
    let section = text.split(TABLE_END).nth(DIE_TABLE_SECTION).unwrap_or(text);

    section
        .lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
        .filter_map(|line| line.split_whitespace().next())
        .filter(|token| token.contains(','))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Desc:   Test wafer 200mm
Creation Date: 01/02/2023
Revision Date: 03/04/2024
Die X Step: 100
Die Y Step: 200
Flat Location (T,B,L,R): L
(table end)
 reticle section
 1 2 3
(table end)
 Column,Row  Type
  1,2   DIE_A
  2,2   DIE_A
  3,1   DIE_B
  2,2   DIE_A
  7     no comma
(table end)
";

    #[test]
    fn test_parse_info_fields() {
        let info = parse_info(SAMPLE);
        assert_eq!(info.desc, "Test wafer 200mm");
        assert_eq!(info.created, "01/02/2023");
        assert_eq!(info.revised, "03/04/2024");
        assert_eq!(info.step_x_um, Some(100));
        assert_eq!(info.step_y_um, Some(200));
        assert_eq!(info.flat_location, FlatLocation::Left);
        assert_eq!(info.flat_location.angle_deg(), 270);
    }

    #[test]
    fn test_parse_info_missing_fields_default() {
        let info = parse_info("nothing useful");
        assert_eq!(info, WaferInfo::default());
        assert_eq!(info.flat_location.angle_deg(), 0);
    }

    #[test]
    fn test_parse_info_non_numeric_step_is_absent() {
        let info = parse_info("Die X Step: abc\nDie Y Step: 12");
        assert_eq!(info.step_x_um, None);
        assert_eq!(info.step_y_um, Some(12));
    }

    #[test]
    fn test_flat_angle_mapping_is_total() {
        assert_eq!(FlatLocation::from_code("T").angle_deg(), 0);
        assert_eq!(FlatLocation::from_code("B").angle_deg(), 180);
        assert_eq!(FlatLocation::from_code("L").angle_deg(), 270);
        assert_eq!(FlatLocation::from_code("R").angle_deg(), 90);
        for other in ["", "X", "t", "TB", " "] {
            assert_eq!(FlatLocation::from_code(other).angle_deg(), 0);
        }
    }

    #[test]
    fn test_flat_location_serializes_as_code() {
        assert_eq!(serde_json::to_string(&FlatLocation::Right).unwrap(), "\"R\"");
        assert_eq!(serde_json::to_string(&FlatLocation::Unspecified).unwrap(), "\"\"");
    }

    #[test]
    fn test_parse_grid_third_section() {
        let grid = parse_grid(SAMPLE);
        assert_eq!(grid, vec!["1,2", "2,2", "3,1", "2,2"]);
    }

    #[test]
    fn test_parse_grid_whole_text_when_few_sections() {
        let text = "header\n 4,5 A\n6,7 B\n(table end)\n";
        assert_eq!(parse_grid(text), vec!["4,5", "6,7"]);
    }
}
