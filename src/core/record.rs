//! Device records and the assembler that builds them from source texts
//!
//! Field names on the serialized forms are the contract read by the
//! downstream query API and plan generator; do not rename them.

use serde::{Deserialize, Serialize};

use crate::core::geometry::{find_center_die, CenterDie};
use crate::core::reference::ReferenceTable;
use crate::core::resolver::{resolve_order, Resolution};
use crate::core::sources::DeviceSources;
use crate::formats::{
    die, dietest, wafer, wafertest, CoordinateMap, DiePosition, Family, FlatLocation, Number,
};

/// A test module placed on the die
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub name: String,
    pub x: Option<Number>,
    pub y: Option<Number>,
}

/// Coordinates in micrometres; both null when unknown
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointUm {
    pub x: Option<Number>,
    pub y: Option<Number>,
}

impl From<Option<(Number, Number)>> for PointUm {
    fn from(xy: Option<(Number, Number)>) -> Self {
        match xy {
            Some((x, y)) => Self {
                x: Some(x),
                y: Some(y),
            },
            None => Self::default(),
        }
    }
}

/// Wafer-level geometry of a device
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaferGeometry {
    pub desc: String,
    pub created: String,
    pub revised: String,
    #[serde(rename = "stepX_um")]
    pub step_x_um: Option<i64>,
    #[serde(rename = "stepY_um")]
    pub step_y_um: Option<i64>,
    pub flat_location: FlatLocation,
    pub flat_angle_deg: i64,
    pub align_die: DiePosition,
    pub align_module: String,
    #[serde(rename = "alignModuleXY_um")]
    pub align_module_xy_um: PointUm,
    pub center_die: CenterDie,
}

/// Everything known about one device
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub prb: Option<String>,
    #[serde(rename = "mod")]
    pub modules: Vec<ModuleEntry>,
    pub waf: Vec<String>,
    pub wafer: WaferGeometry,
}

/// Result of assembling one device
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub record: DeviceRecord,
    pub resolution: Resolution,
}

/// Build a device record from its four source texts
///
/// Module order comes from the dependency resolver. Coordinates come from the
/// DIE file; the DIETEST table is used only when the DIE file yields none.
/// `prb` is never derived here and is always null.
pub fn assemble(sources: &DeviceSources, table: &ReferenceTable) -> Assembled {
    let dietest_text = sources.text(Family::DieTest);
    let die_text = sources.text(Family::Die);
    let wafer_text = sources.text(Family::Wafer);

    let discovered = dietest::parse_modules(dietest_text);
    let resolution = resolve_order(&discovered, table);

    let mut coords = die::parse_coordinates(die_text);
    if coords.is_empty() {
        coords = dietest::parse_coordinates(dietest_text);
        if !coords.is_empty() {
            log::debug!("{}: coordinates taken from the DIETEST table", sources.device);
        }
    }

    let modules = module_entries(&resolution.order, &coords);

    let info = wafer::parse_info(wafer_text);
    let waf = wafer::parse_grid(wafer_text);
    let test_info = wafertest::parse_info(sources.text(Family::WaferTest));
    let center_die = find_center_die(&waf, info.step_x_um, info.step_y_um);

    let wafer = WaferGeometry {
        flat_angle_deg: info.flat_location.angle_deg(),
        flat_location: info.flat_location,
        desc: info.desc,
        created: info.created,
        revised: info.revised,
        step_x_um: info.step_x_um,
        step_y_um: info.step_y_um,
        align_die: test_info.align_die,
        align_module_xy_um: die::align_module_xy(die_text, &test_info.align_module).into(),
        align_module: test_info.align_module,
        center_die,
    };

    Assembled {
        record: DeviceRecord {
            prb: None,
            modules,
            waf,
            wafer,
        },
        resolution,
    }
}

/// Map ordered names to entries, keeping the first occurrence of each name
fn module_entries(order: &[String], coords: &CoordinateMap) -> Vec<ModuleEntry> {
    let mut seen = std::collections::HashSet::new();
    order
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .map(|name| {
            let (x, y) = match coords.get(name) {
                Some(&(x, y)) => (Some(x), Some(y)),
                None => (None, None),
            };
            ModuleEntry {
                name: name.clone(),
                x,
                y,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIETEST: &str = "\
Device DEV1
PARAM-B LIST
RING_OSC: freq
VT_N: vt X: 10 Y: 20
CAP_1: cap 5 6
table end
";

    const DIE: &str = "\
*----------------
 NAME   X   Y
`RING_OSC`  osc  100  200
`VT_N`  fet  -50.5  75
";

    const WAFER: &str = "\
Desc:   Test wafer
Creation Date: 01/02/2023
Revision Date: 03/04/2024
Die X Step: 100
Die Y Step: 200
Flat Location (T,B,L,R): L
(table end)
 reticle
(table end)
 1,1 DIE
 3,3 DIE
 2,2 DIE
";

    const WAFERTEST: &str = "\
WaferType: P-100
ProbeCard: PC-7
Align Die: 2,2
Align Module: ring_osc
";

    fn sources() -> DeviceSources {
        DeviceSources {
            device: "DEV1".to_string(),
            dietest: DIETEST.to_string(),
            die: Some(DIE.to_string()),
            wafer: Some(WAFER.to_string()),
            wafertest: Some(WAFERTEST.to_string()),
        }
    }

    fn table() -> ReferenceTable {
        ReferenceTable::from_rows([
            ("RING_OSC", "RING_OSC freq:1 VT_N"),
            ("VT_N", "VT_N vt 0.4"),
            ("CAP_1", "CAP_1 c:2"),
        ])
    }

    #[test]
    fn test_assemble_full_device() {
        let Assembled { record, resolution } = assemble(&sources(), &table());
        assert!(resolution.is_resolved());

        let names: Vec<&str> = record.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["VT_N", "RING_OSC", "CAP_1"]);

        assert_eq!(record.modules[0].x, Some(Number::Float(-50.5)));
        assert_eq!(record.modules[1].y, Some(Number::Int(200)));
        // DIE coordinates replace the DIETEST table wholesale
        assert_eq!(record.modules[2].x, None);

        assert_eq!(record.prb, None);
        assert_eq!(record.waf, vec!["1,1", "3,3", "2,2"]);
        assert_eq!(record.wafer.desc, "Test wafer");
        assert_eq!(record.wafer.align_die, DiePosition { x: 2, y: 2 });
        assert_eq!(record.wafer.align_module, "ring_osc");
        assert_eq!(record.wafer.align_module_xy_um.x, Some(Number::Int(100)));
    }

    #[test]
    fn test_wafer_geometry_scenario() {
        let record = assemble(&sources(), &table()).record;
        assert_eq!(record.wafer.step_x_um, Some(100));
        assert_eq!(record.wafer.step_y_um, Some(200));
        assert_eq!(record.wafer.flat_location, FlatLocation::Left);
        assert_eq!(record.wafer.flat_angle_deg, 270);
        assert_eq!(
            record.wafer.center_die,
            CenterDie {
                x: Number::Int(2),
                y: Number::Int(2),
                offset_x_um: Number::Int(0),
                offset_y_um: Number::Int(0),
            }
        );
    }

    #[test]
    fn test_dietest_coordinates_used_without_die_file() {
        let mut src = sources();
        src.die = None;
        let record = assemble(&src, &ReferenceTable::default()).record;

        let vt = record.modules.iter().find(|m| m.name == "VT_N").unwrap();
        assert_eq!((vt.x, vt.y), (Some(Number::Int(10)), Some(Number::Int(20))));
        let cap = record.modules.iter().find(|m| m.name == "CAP_1").unwrap();
        assert_eq!((cap.x, cap.y), (Some(Number::Int(5)), Some(Number::Int(6))));
        assert_eq!(record.wafer.align_module_xy_um, PointUm::default());
    }

    #[test]
    fn test_only_dietest_present() {
        let src = DeviceSources {
            device: "DEV2".to_string(),
            dietest: DIETEST.to_string(),
            ..Default::default()
        };
        let record = assemble(&src, &ReferenceTable::default()).record;
        assert_eq!(record.modules.len(), 3);
        assert!(record.waf.is_empty());
        assert_eq!(record.wafer, WaferGeometry::default());
    }

    #[test]
    fn test_assemble_is_idempotent() {
        let first = serde_json::to_string(&assemble(&sources(), &table()).record).unwrap();
        let second = serde_json::to_string(&assemble(&sources(), &table()).record).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(assemble(&sources(), &table()).record).unwrap();
        assert!(json["prb"].is_null());
        assert_eq!(json["mod"][0]["name"], "VT_N");
        let wafer = &json["wafer"];
        for key in [
            "desc",
            "created",
            "revised",
            "stepX_um",
            "stepY_um",
            "flatLocation",
            "flatAngleDeg",
            "alignDie",
            "alignModule",
            "alignModuleXY_um",
            "centerDie",
        ] {
            assert!(wafer.get(key).is_some(), "missing {key}");
        }
        assert_eq!(wafer["flatLocation"], "L");
        assert_eq!(wafer["centerDie"]["offsetX_um"], 0);
    }

    #[test]
    fn test_module_entries_dedupe() {
        let order: Vec<String> = ["A", "B", "A"].iter().map(|s| s.to_string()).collect();
        let entries = module_entries(&order, &CoordinateMap::new());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].x, None);
    }
}
