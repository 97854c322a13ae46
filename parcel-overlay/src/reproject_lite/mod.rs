//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Supporte les systèmes utilisés par les services brésiliens :
//! - SIRGAS 2000 géographique (EPSG:4674) et WGS84 (EPSG:4326), confondus
//! - SIRGAS 2000 / UTM nord (EPSG:31971 à 31976, zones 17N à 22N)
//! - SIRGAS 2000 / UTM sud (EPSG:31977 à 31985, zones 17S à 25S)
//! - WGS84 / UTM (EPSG:326xx et 327xx)

mod ellipsoid;
mod smart;
mod utm;

pub use ellipsoid::Ellipsoid;
pub use smart::SmartReprojector;
pub use utm::{zone_for_longitude, UtmZone};

use anyhow::{bail, Result};
use geo::{Coord, Geometry, MapCoords};

/// EPSG géographique SIRGAS 2000
pub const SIRGAS_2000: u32 = 4674;
/// EPSG géographique WGS84
pub const WGS84: u32 = 4326;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Système de coordonnées reconnu par la reprojection légère
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crs {
    /// Longitude/latitude en degrés
    Geographic,
    /// Projection UTM
    Utm(UtmZone),
}

impl Crs {
    /// Identifie un code EPSG, `None` s'il n'est pas supporté
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        let (zone, south, ellipsoid) = match epsg {
            SIRGAS_2000 | WGS84 => return Some(Self::Geographic),
            31971..=31976 => (epsg - 31954, false, Ellipsoid::GRS80),
            31977..=31985 => (epsg - 31960, true, Ellipsoid::GRS80),
            32601..=32660 => (epsg - 32600, false, Ellipsoid::WGS84),
            32701..=32760 => (epsg - 32700, true, Ellipsoid::WGS84),
            _ => return None,
        };
        UtmZone::new(zone as u8, south, ellipsoid).ok().map(Self::Utm)
    }

    /// Vérifie si le code EPSG désigne une projection métrique supportée
    pub fn is_projected(epsg: u32) -> bool {
        matches!(Self::from_epsg(epsg), Some(Self::Utm(_)))
    }
}

/// EPSG SIRGAS 2000 / UTM de la zone contenant le point (degrés)
pub fn sirgas_utm_epsg(lon_deg: f64, lat_deg: f64) -> Result<u32> {
    let zone = zone_for_longitude(lon_deg) as u32;
    let south = lat_deg < 0.0;

    match (south, zone) {
        (true, 17..=25) => Ok(31960 + zone),
        (false, 17..=22) => Ok(31954 + zone),
        _ => bail!(
            "Aucune zone SIRGAS 2000 / UTM pour ({}, {}): zone {} hors du Brésil",
            lon_deg,
            lat_deg,
            zone
        ),
    }
}

/// Reprojection légère entre systèmes géographiques et UTM
#[derive(Debug, Clone, Copy)]
pub struct ReprojectorLite {
    source: Crs,
    target: Crs,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let Some(source) = Crs::from_epsg(source_epsg) else {
            bail!(
                "EPSG:{} non supporté. Supportés: 4674, 4326, 31971-31985, 326xx, 327xx",
                source_epsg
            );
        };
        let Some(target) = Crs::from_epsg(target_epsg) else {
            bail!(
                "EPSG:{} non supporté. Supportés: 4674, 4326, 31971-31985, 326xx, 327xx",
                target_epsg
            );
        };

        Ok(Self { source, target })
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: u32, target: u32) -> bool {
        Crs::from_epsg(source).is_some() && Crs::from_epsg(target).is_some()
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        // Étape 1: Source → Géographique
        let geo = match self.source {
            Crs::Geographic => Geographic::from_degrees(x, y),
            Crs::Utm(zone) => zone.inverse(x, y)?,
        };

        // Étape 2: Géographique → Cible
        match self.target {
            Crs::Geographic => Ok(geo.to_degrees()),
            Crs::Utm(zone) => zone.forward(geo),
        }
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        geom.try_map_coords(|c: Coord| {
            let (x, y) = self.transform_point(c.x, c.y)?;
            Ok(Coord { x, y })
        })
    }
}
