//! Field-level conflict detection between SoT and satellite data.

use serde::Serialize;

use attest_schema::{SatelliteRecord, SotRecord};

pub const RESOLUTION_SOT_WINS: &str = "sot_wins";

/// A field where the satellite disagrees with the authoritative roster.
/// The roster value is never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConflict {
    pub field: String,
    pub sot_value: String,
    pub satellite_value: String,
    /// Always [`RESOLUTION_SOT_WINS`].
    pub resolution: String,
}

/// Compare the fields both sides carry, case-insensitively, when both are
/// nonempty. The satellite shape carries no department or manager today, so
/// the display name is the whole comparison set; an added satellite field
/// becomes one more symmetric comparison here.
pub fn detect_conflicts(sot: &SotRecord, sat: &SatelliteRecord) -> Vec<FieldConflict> {
    let mut conflicts = Vec::new();

    if !sot.display_name.is_empty()
        && !sat.display_name.is_empty()
        && sot.display_name.to_lowercase() != sat.display_name.to_lowercase()
    {
        conflicts.push(FieldConflict {
            field: "displayName".to_string(),
            sot_value: sot.display_name.clone(),
            satellite_value: sat.display_name.clone(),
            resolution: RESOLUTION_SOT_WINS.to_string(),
        });
    }

    conflicts
}
