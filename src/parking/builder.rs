use std::{collections::HashSet, sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    parking::{ParkingSegment, RecordWarning, ZoneGroup, ZoneType},
    ser::{GeometryMap, SerRow},
};

/// What to do with a row whose key has no shape, when a shapefile was loaded.
/// Without a shapefile every row is kept without geometry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedPolicy {
    #[default]
    Drop,
    Keep,
}

/// Segments that passed validation and the rows that did not.
#[derive(Debug, Default, Clone)]
pub struct Built {
    pub segments: Vec<ParkingSegment>,
    pub warnings: Vec<RecordWarning>,
}

/// Validates every row and joins it with its geometry.
///
/// Rows with an empty id, an unknown zone, a negative or non-numeric spot
/// count, or an id seen earlier in the file are skipped with a warning.
/// `geometry` is `None` when no shapefile was loaded.
pub fn build_segments(
    rows: &[SerRow],
    geometry: Option<&GeometryMap>,
    policy: UnmatchedPolicy,
) -> Built {
    debug!("Building segments...");
    let now = Instant::now();
    let mut built = Built::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(rows.len());

    for row in rows {
        match build_segment(row, geometry, policy, &seen) {
            Ok(segment) => {
                seen.insert(row.id.as_str());
                built.segments.push(segment);
            }
            Err(warning) => built.warnings.push(warning),
        }
    }
    debug!(
        "Built {} segments ({} skipped) in {:?}",
        built.segments.len(),
        built.warnings.len(),
        now.elapsed()
    );
    built
}

fn build_segment(
    row: &SerRow,
    geometry: Option<&GeometryMap>,
    policy: UnmatchedPolicy,
    seen: &HashSet<&str>,
) -> Result<ParkingSegment, RecordWarning> {
    let line = row.line;
    if row.id.is_empty() {
        return Err(RecordWarning::MissingId { line });
    }
    let id = row.id.clone();
    let zone_type: ZoneType = row.zone.parse().map_err(|_| RecordWarning::UnknownZone {
        line,
        id: id.clone(),
        zone: row.zone.clone(),
    })?;
    let spot_count = parse_spots(&row.spots).map_err(|err| match err {
        SpotError::Negative(value) => RecordWarning::NegativeSpots {
            line,
            id: id.clone(),
            value,
        },
        SpotError::Invalid => RecordWarning::InvalidSpots {
            line,
            id: id.clone(),
            value: row.spots.clone(),
        },
    })?;
    if seen.contains(id.as_str()) {
        return Err(RecordWarning::DuplicateId { line, id });
    }

    let shape = geometry.and_then(|map| map.get(&row.key));
    if geometry.is_some() && shape.is_none() && policy == UnmatchedPolicy::Drop {
        return Err(RecordWarning::Unmatched {
            line,
            id,
            key: row.key.clone(),
        });
    }

    let points = shape
        .map(|shape| shape.points.clone())
        .filter(|points| points.len() >= 2)
        .unwrap_or_default();
    let bay_type = row
        .bay_type
        .clone()
        .or_else(|| shape.and_then(|shape| shape.bay_type.clone()));

    Ok(ParkingSegment {
        id: id.into(),
        zone_type,
        spot_count,
        street_name: Arc::from(row.street.as_str()),
        bay_type: bay_type.map(Arc::from),
        geometry: points,
    })
}

enum SpotError {
    Negative(i64),
    Invalid,
}

/// Empty cells count as zero spots. Whole numbers written as decimals (`12.0`) are accepted.
fn parse_spots(value: &str) -> Result<u32, SpotError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }
    let parsed = match value.parse::<i64>() {
        Ok(parsed) => parsed,
        Err(_) => match value.parse::<f64>() {
            Ok(float) if float.is_finite() && float.fract() == 0.0 => float as i64,
            _ => return Err(SpotError::Invalid),
        },
    };
    if parsed < 0 {
        return Err(SpotError::Negative(parsed));
    }
    u32::try_from(parsed).map_err(|_| SpotError::Invalid)
}

/// Partitions segments into one group per zone type, always in
/// [`ZoneType::ALL`] order. Groups may be empty.
pub fn group_by_zone(segments: Vec<ParkingSegment>) -> Vec<ZoneGroup> {
    let mut groups: Vec<ZoneGroup> = ZoneType::ALL.iter().copied().map(ZoneGroup::new).collect();
    for segment in segments {
        if let Some(group) = groups.iter_mut().find(|g| g.zone_type == segment.zone_type) {
            group.segments.push(segment);
        }
    }
    groups
}

#[cfg(test)]
fn row(line: u64, id: &str, zone: &str, spots: &str) -> SerRow {
    SerRow {
        line,
        id: id.into(),
        zone: zone.into(),
        spots: spots.into(),
        street: "Calle de Alcalá".into(),
        key: id.into(),
        bay_type: None,
    }
}

#[test]
fn parse_spots_accepts_integers_and_empty() {
    assert!(matches!(parse_spots("12"), Ok(12)));
    assert!(matches!(parse_spots("12.0"), Ok(12)));
    assert!(matches!(parse_spots(""), Ok(0)));
    assert!(matches!(parse_spots("-4"), Err(SpotError::Negative(-4))));
    assert!(matches!(parse_spots("doce"), Err(SpotError::Invalid)));
    assert!(matches!(parse_spots("1.5"), Err(SpotError::Invalid)));
}

#[test]
fn build_without_geometry_keeps_rows() {
    let rows = vec![row(2, "1", "Azul", "12")];
    let built = build_segments(&rows, None, UnmatchedPolicy::Drop);
    assert!(built.warnings.is_empty());
    assert_eq!(built.segments.len(), 1);
    assert_eq!(built.segments[0].zone_type, ZoneType::Azul);
    assert_eq!(built.segments[0].spot_count, 12);
    assert!(built.segments[0].geometry.is_empty());
}

#[test]
fn build_skips_invalid_rows() {
    let rows = vec![
        row(2, "1", "Azul", "-3"),
        row(3, "2", "Morado", "4"),
        row(4, "", "Verde", "4"),
        row(5, "3", "Verde", "x"),
        row(6, "4", "Rojo", "5"),
        row(7, "4", "Rojo", "5"),
    ];
    let built = build_segments(&rows, None, UnmatchedPolicy::Drop);
    assert_eq!(built.segments.len(), 1);
    assert_eq!(
        built.warnings.iter().map(RecordWarning::line).collect::<Vec<_>>(),
        vec![2, 3, 4, 5, 7]
    );
    assert!(matches!(built.warnings[0], RecordWarning::NegativeSpots { value: -3, .. }));
    assert!(matches!(built.warnings[4], RecordWarning::DuplicateId { .. }));
}

#[test]
fn build_drops_unmatched_when_geometry_loaded() {
    use crate::ser::SegmentGeometry;
    let mut geometry = GeometryMap::new();
    geometry.insert(
        "1".into(),
        SegmentGeometry {
            points: vec![(40.0, -3.0).into(), (40.001, -3.001).into()],
            bay_type: Some("Línea".into()),
        },
    );
    let rows = vec![row(2, "1", "Azul", "12"), row(3, "2", "Azul", "5")];

    let dropped = build_segments(&rows, Some(&geometry), UnmatchedPolicy::Drop);
    assert_eq!(dropped.segments.len(), 1);
    assert_eq!(dropped.segments[0].geometry.len(), 2);
    assert_eq!(dropped.segments[0].bay_type.as_deref(), Some("Línea"));
    assert!(matches!(dropped.warnings[0], RecordWarning::Unmatched { line: 3, .. }));

    let kept = build_segments(&rows, Some(&geometry), UnmatchedPolicy::Keep);
    assert_eq!(kept.segments.len(), 2);
    assert!(kept.segments[1].geometry.is_empty());
}

#[test]
fn group_by_zone_has_fixed_order() {
    let rows = vec![
        row(2, "1", "Rojo", "1"),
        row(3, "2", "Verde", "2"),
        row(4, "3", "Alta Rotación", "3"),
        row(5, "4", "Verde", "4"),
    ];
    let groups = group_by_zone(build_segments(&rows, None, UnmatchedPolicy::Drop).segments);
    let order: Vec<_> = groups.iter().map(|g| g.zone_type).collect();
    assert_eq!(order, ZoneType::ALL.to_vec());
    let verde: Vec<_> = groups[0].segments.iter().map(|s| s.id.as_ref()).collect();
    assert_eq!(verde, vec!["2", "4"]);
    assert!(groups[1].segments.is_empty());
    assert_eq!(groups[3].total_spots(), 1);
    assert_eq!(groups[4].total_spots(), 3);
}
