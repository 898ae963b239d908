use serde::Serialize;

use crate::parking::{ZoneGroup, ZoneType};

/// Totals shown in the page header and logged at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapSummary {
    pub segments: usize,
    pub spots: u64,
    /// Segments drawn without a line because no geometry was available.
    pub without_geometry: usize,
    /// Rows skipped while building segments.
    pub skipped: usize,
    pub zones: Vec<ZoneSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSummary {
    pub zone: ZoneType,
    pub segments: usize,
    pub spots: u64,
    /// Kerb length covered by the zone, rounded to meters.
    pub length_m: u64,
}

impl MapSummary {
    pub fn new(groups: &[ZoneGroup], skipped: usize) -> Self {
        let zones: Vec<ZoneSummary> = groups
            .iter()
            .map(|group| ZoneSummary {
                zone: group.zone_type,
                segments: group.segments.len(),
                spots: group.total_spots(),
                length_m: group
                    .segments
                    .iter()
                    .map(|s| s.length().as_meters())
                    .sum::<f64>()
                    .round() as u64,
            })
            .collect();
        Self {
            segments: zones.iter().map(|z| z.segments).sum(),
            spots: zones.iter().map(|z| z.spots).sum(),
            without_geometry: groups
                .iter()
                .flat_map(|g| &g.segments)
                .filter(|s| !s.has_geometry())
                .count(),
            skipped,
            zones,
        }
    }
}
