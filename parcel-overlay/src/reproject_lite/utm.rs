//! Projection UTM (Universal Transverse Mercator)
//!
//! Formules de Snyder (USGS Professional Paper 1395), précision centimétrique
//! dans la zone. Zones du Brésil: 18 à 25, hémisphères nord et sud.

use super::ellipsoid::Ellipsoid;
use super::Geographic;
use anyhow::{bail, Result};

/// Facteur d'échelle sur le méridien central
const K0: f64 = 0.9996;
/// False easting
const FALSE_EASTING: f64 = 500000.0;
/// False northing (hémisphère sud)
const FALSE_NORTHING_SOUTH: f64 = 10000000.0;

/// Zone UTM sur un ellipsoïde donné
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmZone {
    pub zone: u8,
    pub south: bool,
    pub ellipsoid: Ellipsoid,
}

impl UtmZone {
    pub fn new(zone: u8, south: bool, ellipsoid: Ellipsoid) -> Result<Self> {
        if !(1..=60).contains(&zone) {
            bail!("Zone UTM invalide: {}", zone);
        }
        Ok(Self {
            zone,
            south,
            ellipsoid,
        })
    }

    /// Longitude du méridien central (radians)
    pub fn central_meridian(&self) -> f64 {
        ((self.zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
    }

    fn false_northing(&self) -> f64 {
        if self.south {
            FALSE_NORTHING_SOUTH
        } else {
            0.0
        }
    }

    /// Longueur de l'arc de méridien depuis l'équateur
    fn meridian_arc(&self, phi: f64) -> f64 {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        a * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    /// Géographique → UTM
    pub fn forward(&self, geo: Geographic) -> Result<(f64, f64)> {
        if !geo.lat.is_finite() || !geo.lon.is_finite() || geo.lat.abs() > 84f64.to_radians() {
            bail!("Latitude hors du domaine UTM: {}", geo.lat.to_degrees());
        }

        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let ep2 = self.ellipsoid.ep2();

        let phi = geo.lat;
        let sin_phi = phi.sin();
        let cos_phi = phi.cos();
        let tan_phi = phi.tan();

        let n = a / (1.0 - e2 * sin_phi.powi(2)).sqrt();
        let t = tan_phi.powi(2);
        let c = ep2 * cos_phi.powi(2);
        let big_a = cos_phi * (geo.lon - self.central_meridian());
        let m = self.meridian_arc(phi);

        let x = K0
            * n
            * (big_a
                + (1.0 - t + c) * big_a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * big_a.powi(5) / 120.0)
            + FALSE_EASTING;

        let y = K0
            * (m + n
                * tan_phi
                * (big_a.powi(2) / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * big_a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * big_a.powi(6)
                        / 720.0))
            + self.false_northing();

        Ok((x, y))
    }

    /// UTM → géographique
    pub fn inverse(&self, x: f64, y: f64) -> Result<Geographic> {
        if !x.is_finite() || !y.is_finite() {
            bail!("Coordonnées UTM invalides: ({}, {})", x, y);
        }

        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let ep2 = self.ellipsoid.ep2();

        // Coordonnées réduites
        let x = x - FALSE_EASTING;
        let y = y - self.false_northing();

        // Latitude du pied
        let m = y / K0;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();
        let tan_phi1 = phi1.tan();

        let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
        let t1 = tan_phi1.powi(2);
        let c1 = ep2 * cos_phi1.powi(2);
        let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
        let d = x / (n1 * K0);

        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d.powi(2) / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4)
                        / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2)
                        - 252.0 * ep2
                        - 3.0 * c1.powi(2))
                        * d.powi(6)
                        / 720.0);

        let lon = self.central_meridian()
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                    * d.powi(5)
                    / 120.0)
                / cos_phi1;

        Ok(Geographic::new(lon, lat))
    }
}

/// Zone UTM contenant une longitude (degrés)
pub fn zone_for_longitude(lon_deg: f64) -> u8 {
    let zone = ((lon_deg + 180.0) / 6.0).floor() as i64 + 1;
    zone.clamp(1, 60) as u8
}
