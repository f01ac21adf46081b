//! DIETEST file parsing
//!
//! DIETEST files list the modules tested on a device inside one or more
//! table regions. The table header layout varies between files, so a region
//! opens on any line carrying both a hyphen and a capital `B` and closes on a
//! line containing `table end`.

use regex::Regex;
use std::sync::LazyLock;

use super::numeric::{last_two_numbers, Number};
use super::CoordinateMap;

static LABELED_X: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bX\s*[:=]\s*(-?\d+(?:\.\d+)?)").unwrap());
static LABELED_Y: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bY\s*[:=]\s*(-?\d+(?:\.\d+)?)").unwrap());

fn opens_table(line: &str) -> bool {
    line.contains('-') && line.contains('B')
}

/// Trimmed, non-empty data lines inside table regions
///
/// The line that opens a region is its header and is not yielded.
pub fn table_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut in_table = false;

    for raw in text.lines() {
        let line = raw.trim();
        if in_table {
            if line.contains("table end") {
                in_table = false;
            } else if !line.is_empty() {
                lines.push(line);
            }
        } else if opens_table(line) {
            in_table = true;
        }
    }

    lines
}

/// Module name of a table line: everything before the first colon
fn module_name(line: &str) -> Option<&str> {
    let name = line.split(':').next().unwrap_or("").trim();
    (!name.is_empty()).then_some(name)
}

/// Module names in discovery order (duplicates retained)
pub fn parse_modules(text: &str) -> Vec<String> {
    table_lines(text)
        .into_iter()
        .filter_map(module_name)
        .map(str::to_string)
        .collect()
}

/// Module coordinates from the DIETEST table, used when the DIE file has none
///
/// Explicit `X:`/`Y:` (or `X=`/`Y=`) labels win; otherwise the last two
/// numbers on the line are taken as X and Y.
pub fn parse_coordinates(text: &str) -> CoordinateMap {
    let mut coords = CoordinateMap::new();

    for line in table_lines(text) {
        let Some(name) = module_name(line) else {
            continue;
        };

        if let Some(xy) = labeled_xy(line).or_else(|| last_two_numbers(line)) {
            coords.insert(name.to_string(), xy);
        }
    }

    coords
}

fn labeled_xy(line: &str) -> Option<(Number, Number)> {
    let x = LABELED_X.captures(line)?.get(1)?.as_str();
    let y = LABELED_Y.captures(line)?.get(1)?.as_str();
    Some((Number::parse(x)?, Number::parse(y)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Device: TESTCHIP
Program header
MOD-B LIST
RING_OSC: ring oscillator
VT_N : threshold X: 120 Y: 340

CAP_1: capacitor 10 20
(table end)
NOTE: outside any table
";

    #[test]
    fn test_parse_modules_in_region_only() {
        let mods = parse_modules(SAMPLE);
        assert_eq!(mods, vec!["RING_OSC", "VT_N", "CAP_1"]);
    }

    #[test]
    fn test_parse_modules_multiple_regions() {
        let text = "A-B\nM1: x\n(table end)\nskip: me\nX-B\nM2: y\nM1: again\ntable end\n";
        assert_eq!(parse_modules(text), vec!["M1", "M2", "M1"]);
    }

    #[test]
    fn test_parse_modules_no_table() {
        assert!(parse_modules("nothing here\njust text").is_empty());
        assert!(parse_modules("").is_empty());
    }

    #[test]
    fn test_line_with_hyphen_and_b_inside_region_is_data() {
        let text = "HDR-B\nMOD-B2: data\ntable end\n";
        assert_eq!(parse_modules(text), vec!["MOD-B2"]);
    }

    #[test]
    fn test_parse_coordinates_prefers_labels() {
        let coords = parse_coordinates(SAMPLE);
        assert_eq!(coords.get("VT_N"), Some(&(Number::Int(120), Number::Int(340))));
    }

    #[test]
    fn test_parse_coordinates_falls_back_to_last_two_numbers() {
        let coords = parse_coordinates(SAMPLE);
        assert_eq!(coords.get("CAP_1"), Some(&(Number::Int(10), Number::Int(20))));
        // "CAP_1" itself contributes the token 1, but only the last two count
        assert!(!coords.contains_key("RING_OSC"));
    }

    #[test]
    fn test_parse_coordinates_labels_case_insensitive() {
        let text = "T-B\nM: x=1.5 y=-2\ntable end\n";
        let coords = parse_coordinates(text);
        assert_eq!(coords.get("M"), Some(&(Number::Float(1.5), Number::Int(-2))));
    }
}
