//! Wafer grid geometry: bounding box, center die and half-step offsets
//!
//! A grid whose column (or row) extents sum to an even number has a die at
//! its exact center. An odd sum puts the midpoint on a die boundary, so the
//! center snaps down to the lower die and the probe origin shifts by half a
//! step.

use serde::{Deserialize, Serialize};

use crate::formats::Number;

/// Bounding box of the populated die grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridExtents {
    pub x_min: i64,
    pub x_max: i64,
    pub y_min: i64,
    pub y_max: i64,
}

impl GridExtents {
    /// Extents over `"col,row"` entries; entries that do not parse are skipped
    pub fn from_grid<S: AsRef<str>>(grid: &[S]) -> Option<Self> {
        grid.iter()
            .filter_map(|entry| parse_col_row(entry.as_ref()))
            .fold(None, |acc, (x, y)| {
                Some(match acc {
                    None => GridExtents {
                        x_min: x,
                        x_max: x,
                        y_min: y,
                        y_max: y,
                    },
                    Some(e) => GridExtents {
                        x_min: e.x_min.min(x),
                        x_max: e.x_max.max(x),
                        y_min: e.y_min.min(y),
                        y_max: e.y_max.max(y),
                    },
                })
            })
    }
}

/// `"col,row"` to integers; anything after a second comma is ignored
fn parse_col_row(entry: &str) -> Option<(i64, i64)> {
    let mut parts = entry.split(',');
    let col = parts.next()?.trim().parse().ok()?;
    let row = parts.next()?.trim().parse().ok()?;
    Some((col, row))
}

/// Center die position and probe offsets in micrometres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenterDie {
    pub x: Number,
    pub y: Number,
    #[serde(rename = "offsetX_um")]
    pub offset_x_um: Number,
    #[serde(rename = "offsetY_um")]
    pub offset_y_um: Number,
}

impl Default for CenterDie {
    fn default() -> Self {
        Self {
            x: Number::Int(0),
            y: Number::Int(0),
            offset_x_um: Number::Int(0),
            offset_y_um: Number::Int(0),
        }
    }
}

/// Center and offset along one axis
fn center_axis(min: i64, max: i64, step_um: i64) -> (Number, Number) {
    // The midpoint of two i64 values always fits back in an i64
    let sum = i128::from(min) + i128::from(max);
    let center = Number::Int(sum.div_euclid(2) as i64);
    let offset = if sum.rem_euclid(2) == 0 {
        Number::Int(0)
    } else {
        Number::from_f64(-(step_um as f64) / 2.0)
    };
    (center, offset)
}

/// Compute the center die; an empty grid yields all zeros
///
/// Missing step sizes count as zero.
pub fn center_die(
    extents: Option<GridExtents>,
    step_x_um: Option<i64>,
    step_y_um: Option<i64>,
) -> CenterDie {
    let Some(e) = extents else {
        return CenterDie::default();
    };

    let (x, offset_x_um) = center_axis(e.x_min, e.x_max, step_x_um.unwrap_or(0));
    let (y, offset_y_um) = center_axis(e.y_min, e.y_max, step_y_um.unwrap_or(0));
    CenterDie {
        x,
        y,
        offset_x_um,
        offset_y_um,
    }
}

/// Center die straight from the grid list
pub fn find_center_die<S: AsRef<str>>(
    grid: &[S],
    step_x_um: Option<i64>,
    step_y_um: Option<i64>,
) -> CenterDie {
    center_die(GridExtents::from_grid(grid), step_x_um, step_y_um)
}
