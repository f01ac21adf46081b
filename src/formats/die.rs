//! DIE file parsing - the primary source of module coordinates

use regex::{Regex, RegexBuilder};

use super::numeric::{last_two_numbers, Number};
use super::CoordinateMap;

/// Lines after the first `*` marker line that belong to the column header
const HEADER_LINES: usize = 2;

/// Parse module coordinates from a DIE file
///
/// Data starts two lines after the first line beginning with `*` (or at the
/// top if there is none). Each data line names its module in the first token,
/// optionally wrapped in backticks, and carries X and Y as the last two
/// numbers on the line. A later line for the same module replaces an earlier one.
pub fn parse_coordinates(text: &str) -> CoordinateMap {
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.contains("table end"))
        .collect();

    let start = lines
        .iter()
        .position(|line| line.starts_with('*'))
        .map_or(0, |i| i + HEADER_LINES);

    let mut coords = CoordinateMap::new();
    for line in lines.iter().skip(start) {
        if line.starts_with('*') || line.trim().is_empty() {
            continue;
        }
        let Some(name) = line.split_whitespace().next().map(|t| t.trim_matches('`')) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        if let Some(xy) = last_two_numbers(line) {
            coords.insert(name.to_string(), xy);
        }
    }

    coords
}

/// Find the align module's coordinates in a DIE file
///
/// Matches the first line whose leading token is the module name
/// (case-insensitive, optional backticks) and has at least two numbers.
pub fn align_module_xy(text: &str, module: &str) -> Option<(Number, Number)> {
    let module = module.trim();
    if module.is_empty() {
        return None;
    }

    let pattern = leading_name_pattern(module)?;
    text.lines()
        .filter(|line| pattern.is_match(line))
        .find_map(last_two_numbers)
}

fn leading_name_pattern(module: &str) -> Option<Regex> {
    RegexBuilder::new(&format!(r"^\s*`?{}`?\b", regex::escape(module)))
        .case_insensitive(true)
        .build()
        .ok()
}
