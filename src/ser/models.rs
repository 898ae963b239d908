use std::collections::HashMap;

use crate::shared::Coordinate;

/// One CSV row, kept as raw text. Validation happens when segments are built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerRow {
    /// 1-based line in the source file, header included.
    pub line: u64,
    pub id: String,
    pub zone: String,
    pub spots: String,
    pub street: String,
    /// Value matched against the shapefile key attribute.
    pub key: String,
    pub bay_type: Option<String>,
}

/// Geometry and attributes of one shapefile feature, already projected to WGS84.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentGeometry {
    pub points: Vec<Coordinate>,
    pub bay_type: Option<String>,
}

/// Segment key to geometry, as read from the segments layer.
pub type GeometryMap = HashMap<String, SegmentGeometry>;

/// Exterior ring of one regulated neighbourhood.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceArea {
    pub name: String,
    pub ring: Vec<Coordinate>,
}
