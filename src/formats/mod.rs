//! Format parsers for the four wafer-probe file families
//!
//! Every parser is a pure function from file text to a typed structure.
//! Callers substitute an empty string when a file is missing, which yields
//! the default result for that family.

pub mod die;
pub mod dietest;
pub mod numeric;
pub mod wafer;
pub mod wafertest;

use std::collections::HashMap;

pub use numeric::Number;
pub use wafer::{FlatLocation, WaferInfo};
pub use wafertest::{DiePosition, WaferTestInfo};

/// Module name to (X, Y) coordinates in micrometres
pub type CoordinateMap = HashMap<String, (Number, Number)>;

/// The four file families of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    DieTest,
    Die,
    Wafer,
    WaferTest,
}

impl Family {
    pub const ALL: [Family; 4] = [
        Family::DieTest,
        Family::Die,
        Family::Wafer,
        Family::WaferTest,
    ];

    /// Conventional directory name for the family
    pub fn dir_name(&self) -> &'static str {
        match self {
            Family::DieTest => "DIETEST",
            Family::Die => "DIE",
            Family::Wafer => "WAFER",
            Family::WaferTest => "WAFERTEST",
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}
