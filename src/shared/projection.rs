use serde::{Deserialize, Serialize};

use crate::shared::Coordinate;

/// Coordinate reference system of the source geometry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    /// Geographic points are kept, anything else is read as UTM zone 30N.
    #[default]
    Auto,
    /// Points are already longitude (x) / latitude (y).
    Wgs84,
    /// ETRS89 / UTM zone 30N (EPSG:25830), the CRS of the Madrid open data portal.
    Utm30n,
}

impl Projection {
    /// Converts a shapefile `(x, y)` pair into a WGS84 coordinate.
    pub fn to_wgs84(&self, x: f64, y: f64) -> Coordinate {
        match self {
            Projection::Wgs84 => Coordinate::from((y, x)),
            Projection::Utm30n => utm_to_wgs84(x, y, 30),
            Projection::Auto => {
                let geographic = Coordinate::from((y, x));
                if geographic.is_geographic() {
                    geographic
                } else {
                    utm_to_wgs84(x, y, 30)
                }
            }
        }
    }
}

/// Inverse transverse mercator on the GRS80 ellipsoid, northern hemisphere.
pub fn utm_to_wgs84(easting: f64, northing: f64, zone: u8) -> Coordinate {
    const A: f64 = 6_378_137.0;
    const E: f64 = 0.081_819_190_842_621_49;
    const K0: f64 = 0.9996;
    const FALSE_EASTING: f64 = 500_000.0;

    let long_origin = (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0;
    let e_sq = E * E;

    let x = easting - FALSE_EASTING;
    let m = northing / K0;
    let mu = m / (A * (1.0 - e_sq / 4.0 - 3.0 * E.powi(4) / 64.0 - 5.0 * E.powi(6) / 256.0));

    let e1 = (1.0 - (1.0 - e_sq).sqrt()) / (1.0 + (1.0 - e_sq).sqrt());
    let j1 = 3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0;
    let j2 = 21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0;
    let j3 = 151.0 * e1.powi(3) / 96.0;
    let j4 = 1097.0 * e1.powi(4) / 512.0;
    let fp = mu
        + j1 * (2.0 * mu).sin()
        + j2 * (4.0 * mu).sin()
        + j3 * (6.0 * mu).sin()
        + j4 * (8.0 * mu).sin();

    let e2 = e_sq / (1.0 - e_sq);
    let c1 = e2 * fp.cos().powi(2);
    let t1 = fp.tan().powi(2);
    let r1 = A * (1.0 - e_sq) / (1.0 - (E * fp.sin()).powi(2)).powf(1.5);
    let n1 = A / (1.0 - (E * fp.sin()).powi(2)).sqrt();
    let d = x / (n1 * K0);

    let lat = fp
        - (n1 * fp.tan() / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * e2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * e2 - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);
    let lon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * e2 + 24.0 * t1 * t1) * d.powi(5)
            / 120.0)
        / fp.cos();

    Coordinate {
        latitude: lat.to_degrees(),
        longitude: long_origin + lon.to_degrees(),
    }
}

#[test]
fn utm_puerta_del_sol() {
    // EPSG:25830 coordinates of Puerta del Sol.
    let c = utm_to_wgs84(440_291.0, 4_474_254.0, 30);
    assert!((c.latitude - 40.4168).abs() < 0.001, "{c}");
    assert!((c.longitude - (-3.7038)).abs() < 0.001, "{c}");
}

#[test]
fn auto_keeps_geographic_points() {
    let c = Projection::Auto.to_wgs84(-3.7038, 40.4168);
    assert_eq!(c, Coordinate::from((40.4168, -3.7038)));
}

#[test]
fn auto_detects_projected_points() {
    let c = Projection::Auto.to_wgs84(440_291.0, 4_474_254.0);
    assert!(c.is_geographic());
    assert!((c.latitude - 40.4168).abs() < 0.001);
}
