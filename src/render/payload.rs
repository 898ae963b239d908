use serde::Serialize;

use crate::{
    parking::{MapSummary, ParkingSegment, ZoneGroup},
    ser::ServiceArea,
    shared::Coordinate,
};

/// Everything the page script needs, embedded as one JSON object.
#[derive(Debug, Serialize)]
pub struct MapPayload<'a> {
    pub zones: Vec<ZonePayload<'a>>,
    pub service_areas: Vec<&'a [Coordinate]>,
    pub summary: &'a MapSummary,
}

#[derive(Debug, Serialize)]
pub struct ZonePayload<'a> {
    pub key: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub segments: Vec<SegmentPayload<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SegmentPayload<'a> {
    pub id: &'a str,
    pub spots: u32,
    pub street: &'a str,
    pub bay_type: Option<&'a str>,
    pub weight: f64,
    pub coords: &'a [Coordinate],
    pub centroid: Option<Coordinate>,
}

impl<'a> MapPayload<'a> {
    pub fn new(
        groups: &'a [ZoneGroup],
        service_areas: &'a [ServiceArea],
        summary: &'a MapSummary,
    ) -> Self {
        Self {
            zones: groups.iter().map(ZonePayload::from).collect(),
            service_areas: service_areas.iter().map(|a| a.ring.as_slice()).collect(),
            summary,
        }
    }

    /// JSON safe to inline in a `<script>` element.
    pub fn to_script_json(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        // `<` only occurs inside JSON strings, where the escape is equivalent.
        Ok(json.replace('<', "\\u003c"))
    }
}

impl<'a> From<&'a ZoneGroup> for ZonePayload<'a> {
    fn from(group: &'a ZoneGroup) -> Self {
        Self {
            key: group.zone_type.key(),
            label: group.zone_type.label(),
            color: group.color(),
            segments: group.segments.iter().map(SegmentPayload::from).collect(),
        }
    }
}

impl<'a> From<&'a ParkingSegment> for SegmentPayload<'a> {
    fn from(segment: &'a ParkingSegment) -> Self {
        Self {
            id: &segment.id,
            spots: segment.spot_count,
            street: &segment.street_name,
            bay_type: segment.bay_type.as_deref(),
            weight: segment.line_weight(),
            coords: &segment.geometry,
            centroid: segment.centroid(),
        }
    }
}
