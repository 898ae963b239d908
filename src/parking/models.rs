use std::{fmt::Display, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::shared::{self, Coordinate, Distance, text};

/// SER regulation category of a street segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ZoneType {
    /// Residents' parking.
    Verde,
    /// Visitors' parking, limited stay.
    Azul,
    /// Mixed residents and visitors.
    Naranja,
    /// Short stay in hospital surroundings.
    Rojo,
    /// High turnover, limited to one hour.
    AltaRotacion,
}

impl ZoneType {
    /// Display order of layers, legend entries and payload groups.
    pub const ALL: [ZoneType; 5] = [
        ZoneType::Verde,
        ZoneType::Azul,
        ZoneType::Naranja,
        ZoneType::Rojo,
        ZoneType::AltaRotacion,
    ];

    pub const fn color(&self) -> &'static str {
        match self {
            ZoneType::Verde => "#28a745",
            ZoneType::Azul => "#007bff",
            ZoneType::Naranja => "#fd7e14",
            ZoneType::Rojo => "#dc3545",
            ZoneType::AltaRotacion => "#6f42c1",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            ZoneType::Verde => "Verde",
            ZoneType::Azul => "Azul",
            ZoneType::Naranja => "Naranja",
            ZoneType::Rojo => "Rojo",
            ZoneType::AltaRotacion => "Alta Rotación",
        }
    }

    /// Stable identifier used as the payload key.
    pub const fn key(&self) -> &'static str {
        match self {
            ZoneType::Verde => "verde",
            ZoneType::Azul => "azul",
            ZoneType::Naranja => "naranja",
            ZoneType::Rojo => "rojo",
            ZoneType::AltaRotacion => "alta_rotacion",
        }
    }
}

impl Display for ZoneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownZone(pub String);

impl FromStr for ZoneType {
    type Err = UnknownZone;

    /// Case, accent and separator insensitive: `"Alta Rotación"`, `"ALTA_ROTACION"`
    /// and `"AltaRotacion"` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match text::normalize(s).as_str() {
            "verde" => Ok(ZoneType::Verde),
            "azul" => Ok(ZoneType::Azul),
            "naranja" => Ok(ZoneType::Naranja),
            "rojo" => Ok(ZoneType::Rojo),
            "altarotacion" => Ok(ZoneType::AltaRotacion),
            _ => Err(UnknownZone(s.to_string())),
        }
    }
}

/// A stretch of street with a single zone type.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingSegment {
    /// Unique external identifier.
    pub id: Arc<str>,
    pub zone_type: ZoneType,
    pub spot_count: u32,
    pub street_name: Arc<str>,
    /// Battery or line parking, when the source says so.
    pub bay_type: Option<Arc<str>>,
    /// Path of the segment in WGS84. Either empty or at least two points.
    pub geometry: Vec<Coordinate>,
}

impl ParkingSegment {
    pub fn has_geometry(&self) -> bool {
        self.geometry.len() >= 2
    }

    pub fn centroid(&self) -> Option<Coordinate> {
        shared::centroid(&self.geometry)
    }

    pub fn length(&self) -> Distance {
        shared::path_length(&self.geometry)
    }

    /// Line thickness in pixels, proportional to the number of spots.
    pub fn line_weight(&self) -> f64 {
        line_weight(self.spot_count)
    }
}

pub fn line_weight(spot_count: u32) -> f64 {
    (spot_count as f64 * 0.3).clamp(3.0, 10.0)
}

/// All segments of one zone type, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneGroup {
    pub zone_type: ZoneType,
    pub segments: Vec<ParkingSegment>,
}

impl ZoneGroup {
    pub fn new(zone_type: ZoneType) -> Self {
        Self {
            zone_type,
            segments: Vec::new(),
        }
    }

    pub fn color(&self) -> &'static str {
        self.zone_type.color()
    }

    pub fn total_spots(&self) -> u64 {
        self.segments.iter().map(|s| s.spot_count as u64).sum()
    }
}

#[test]
fn zone_type_parses_variants() {
    assert_eq!("Azul".parse::<ZoneType>(), Ok(ZoneType::Azul));
    assert_eq!("VERDE".parse::<ZoneType>(), Ok(ZoneType::Verde));
    assert_eq!("Alta Rotación".parse::<ZoneType>(), Ok(ZoneType::AltaRotacion));
    assert_eq!("AltaRotacion".parse::<ZoneType>(), Ok(ZoneType::AltaRotacion));
    assert!("Morado".parse::<ZoneType>().is_err());
    assert!("".parse::<ZoneType>().is_err());
}

#[test]
fn every_zone_has_distinct_color() {
    let mut colors: Vec<_> = ZoneType::ALL.iter().map(ZoneType::color).collect();
    colors.sort();
    colors.dedup();
    assert_eq!(colors.len(), ZoneType::ALL.len());
}

#[test]
fn line_weight_is_clamped() {
    assert_eq!(line_weight(0), 3.0);
    assert_eq!(line_weight(20), 6.0);
    assert_eq!(line_weight(100), 10.0);
}
