use std::{fmt::Display, iter::Sum, ops::Add};

use serde::{Deserialize, Serialize};

/// Madrid, Puerta del Sol. Used as the initial map view.
pub const MADRID_CENTER: Coordinate = Coordinate {
    latitude: 40.4168,
    longitude: -3.7038,
};

const EARTH_RADIUS: Distance = Distance::from_kilometers(6371.0);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Distance(f64);

impl Add for Distance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Distance {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Distance::default(), Add::add)
    }
}

impl Distance {
    pub const fn from_meters(distance: f64) -> Self {
        Self(distance)
    }

    pub const fn from_kilometers(distance: f64) -> Self {
        Self(distance * 1000.0)
    }

    pub const fn as_meters(&self) -> f64 {
        self.0
    }
}

/// A WGS84 position. Serialized as a `[lat, lon]` pair, the shape Leaflet expects.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Averages the coordinates. An empty iterator yields `NaN` components,
/// use [`centroid`] when the input may be empty.
impl Sum for Coordinate {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let (count, lat, lon) = iter.fold((0usize, 0.0, 0.0), |(n, lat, lon), c| {
            (n + 1, lat + c.latitude, lon + c.longitude)
        });
        Self {
            latitude: lat / count as f64,
            longitude: lon / count as f64,
        }
    }
}

impl From<Coordinate> for (f64, f64) {
    fn from(value: Coordinate) -> Self {
        (value.latitude, value.longitude)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl Coordinate {
    /// Great-circle (haversine) distance.
    pub fn euclidean_distance(&self, coord: &Self) -> Distance {
        let (lat_a, lat_b) = (self.latitude.to_radians(), coord.latitude.to_radians());
        let half_lat = (lat_b - lat_a) / 2.0;
        let half_lon = (coord.longitude - self.longitude).to_radians() / 2.0;
        let h = half_lat.sin().powi(2) + lat_a.cos() * lat_b.cos() * half_lon.sin().powi(2);
        Distance::from_meters(2.0 * EARTH_RADIUS.as_meters() * h.sqrt().asin())
    }

    /// Rounds both components to `decimals` places. Five decimals is roughly one meter.
    pub fn rounded(&self, decimals: u32) -> Self {
        let factor = 10f64.powi(decimals as i32);
        Self {
            latitude: (self.latitude * factor).round() / factor,
            longitude: (self.longitude * factor).round() / factor,
        }
    }

    pub fn is_geographic(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

pub fn centroid(points: &[Coordinate]) -> Option<Coordinate> {
    if points.is_empty() {
        return None;
    }
    Some(points.iter().copied().sum())
}

/// Length of a polyline following its points in order.
pub fn path_length(points: &[Coordinate]) -> Distance {
    points
        .windows(2)
        .map(|pair| pair[0].euclidean_distance(&pair[1]))
        .sum()
}

#[test]
fn distance_test() {
    let sol = Coordinate::from((40.4168, -3.7038));
    let cibeles = Coordinate::from((40.4193, -3.6932));
    let d = sol.euclidean_distance(&cibeles);
    assert!((d.as_meters() - 940.0).abs() < 30.0);
}

#[test]
fn path_length_adds_legs() {
    let points: Vec<Coordinate> = vec![(40.0, -3.0).into(), (40.001, -3.0).into(), (40.002, -3.0).into()];
    let leg = points[0].euclidean_distance(&points[1]);
    assert!((path_length(&points).as_meters() - 2.0 * leg.as_meters()).abs() < 1e-6);
    assert_eq!(path_length(&points[..1]), Distance::default());
}

#[test]
fn centroid_of_empty_is_none() {
    assert!(centroid(&[]).is_none());
}

#[test]
fn centroid_averages_points() {
    let c = centroid(&[(40.0, -3.0).into(), (41.0, -4.0).into()]).unwrap();
    assert_eq!(c, Coordinate::from((40.5, -3.5)));
}

#[test]
fn rounded_keeps_five_decimals() {
    let c = Coordinate::from((40.416_789_9, -3.703_812_3)).rounded(5);
    assert_eq!(c, Coordinate::from((40.41679, -3.70381)));
}

#[test]
fn coordinate_serializes_as_pair() {
    let json = serde_json::to_string(&Coordinate::from((40.5, -3.5))).unwrap();
    assert_eq!(json, "[40.5,-3.5]");
}

#[test]
fn coordinate_display_is_lat_lon() {
    let c = Coordinate::from((40.4168, -3.7038));
    assert_eq!(c.to_string(), "40.4168, -3.7038");
    assert_eq!(format!("{c}"), format!("{}, {}", c.latitude, c.longitude));
}
