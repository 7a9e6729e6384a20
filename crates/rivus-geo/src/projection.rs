//! Transverse Mercator on the WGS84 ellipsoid (Snyder, USGS PP 1395, pp. 60-64).
//!
//! Used for UTM grids (`epsg` 326zz/327zz) and for map plots centred on the
//! network.

use rivus_core::{Point, RivusError, RivusResult};

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    /// Latitude of origin (degrees)
    pub lat0: f64,
    /// Central meridian (degrees)
    pub lon0: f64,
    pub k0: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

impl TransverseMercator {
    /// Unit-scale projection centred on `(lat0, lon0)`, metres from the centre.
    pub fn centred(lat0: f64, lon0: f64) -> Self {
        Self {
            lat0,
            lon0,
            k0: 1.0,
            false_easting: 0.0,
            false_northing: 0.0,
        }
    }

    /// UTM zone projection for EPSG codes 32601-32660 (north) and 32701-32760 (south).
    pub fn utm_from_epsg(epsg: u32) -> RivusResult<Self> {
        let (zone, south) = match epsg {
            32601..=32660 => (epsg - 32600, false),
            32701..=32760 => (epsg - 32700, true),
            other => {
                return Err(RivusError::Validation(format!(
                    "unsupported epsg {other}, only UTM zones 326xx/327xx are supported"
                )))
            }
        };
        Ok(Self {
            lat0: 0.0,
            lon0: -183.0 + 6.0 * zone as f64,
            k0: UTM_K0,
            false_easting: UTM_FALSE_EASTING,
            false_northing: if south { UTM_FALSE_NORTHING_SOUTH } else { 0.0 },
        })
    }

    /// WGS84 `(lon, lat)` degrees to projected `(x, y)` metres.
    pub fn forward(&self, lonlat: Point) -> Point {
        let (e2, ep2) = eccentricities();
        let phi = lonlat.y.to_radians();
        let lambda = lonlat.x.to_radians();
        let lambda0 = self.lon0.to_radians();

        let (sin_phi, cos_phi) = phi.sin_cos();
        let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = phi.tan().powi(2);
        let c = ep2 * cos_phi * cos_phi;
        let a = (lambda - lambda0) * cos_phi;
        let m = meridional_arc(phi, e2);
        let m0 = meridional_arc(self.lat0.to_radians(), e2);

        let x = self.k0
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);
        let y = self.k0
            * (m - m0
                + n * phi.tan()
                    * (a * a / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6)
                            / 720.0));
        Point::new(x + self.false_easting, y + self.false_northing)
    }

    /// Projected `(x, y)` metres back to WGS84 `(lon, lat)` degrees.
    pub fn inverse(&self, xy: Point) -> Point {
        let (e2, ep2) = eccentricities();
        let x = xy.x - self.false_easting;
        let y = xy.y - self.false_northing;
        let m0 = meridional_arc(self.lat0.to_radians(), e2);
        let m = m0 + y / self.k0;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin1, cos1) = phi1.sin_cos();
        let c1 = ep2 * cos1 * cos1;
        let t1 = phi1.tan().powi(2);
        let n1 = WGS84_A / (1.0 - e2 * sin1 * sin1).sqrt();
        let r1 = WGS84_A * (1.0 - e2) / (1.0 - e2 * sin1 * sin1).powf(1.5);
        let d = x / (n1 * self.k0);

        let phi = phi1
            - (n1 * phi1.tan() / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let lambda = self.lon0.to_radians()
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / cos1;
        Point::new(lambda.to_degrees(), phi.to_degrees())
    }
}

fn eccentricities() -> (f64, f64) {
    let e2 = WGS84_F * (2.0 - WGS84_F);
    (e2, e2 / (1.0 - e2))
}

fn meridional_arc(phi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Point reached from `start` (lon, lat) after `distance_m` metres on `bearing_deg`
/// (0 = north, 90 = east) along a great circle.
pub fn destination(start: Point, distance_m: f64, bearing_deg: f64) -> Point {
    let delta = distance_m / rivus_core::geometry::EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let lat1 = start.y.to_radians();
    let lon1 = start.x.to_radians();
    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());
    Point::new(lon2.to_degrees(), lat2.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utm_round_trip_near_munich() {
        let utm = TransverseMercator::utm_from_epsg(32632).unwrap();
        let origin = Point::new(11.66842, 48.26739);
        let xy = utm.forward(origin);
        assert!((xy.x - 698_000.0).abs() < 5_000.0, "easting {}", xy.x);
        assert!((xy.y - 5_349_000.0).abs() < 5_000.0, "northing {}", xy.y);
        let back = utm.inverse(xy);
        assert!(back.almost_equals(&origin, 6), "{back:?}");
    }

    #[test]
    fn unsupported_epsg_is_rejected() {
        assert!(TransverseMercator::utm_from_epsg(4326).is_err());
        assert!(TransverseMercator::utm_from_epsg(32733).is_ok());
    }

    #[test]
    fn centred_projection_maps_centre_to_origin() {
        let tm = TransverseMercator::centred(48.0, 11.0);
        let xy = tm.forward(Point::new(11.0, 48.0));
        assert!(xy.x.abs() < 1e-6 && xy.y.abs() < 1e-6);
    }

    #[test]
    fn destination_moves_east_and_north() {
        let start = Point::new(11.0, 48.0);
        let east = destination(start, 100.0, 90.0);
        let north = destination(start, 100.0, 0.0);
        assert!(east.x > start.x && (east.y - start.y).abs() < 1e-6);
        assert!(north.y > start.y && (north.x - start.x).abs() < 1e-12);
        assert!((start.haversine_distance(&east) - 100.0).abs() < 1e-6);
    }
}
