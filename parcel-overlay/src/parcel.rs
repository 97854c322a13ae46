//! Géométrie du lot analysé
//!
//! Le lot est conservé en projection métrique (SIRGAS 2000 / UTM par défaut)
//! pour le calcul des surfaces; son emprise géographique (EPSG:4674) et un
//! point intérieur sont précalculés pour les requêtes.

use std::path::Path;

use anyhow::{bail, Context, Result};
use geo::{Area, BoundingRect, Centroid, Geometry, InteriorPoint, MultiPolygon, Point, Rect};
use geofeature::repair::repair_multipolygon;
use geofeature::Shape;
use serde_json::Value;

use crate::reproject_lite::{sirgas_utm_epsg, Crs, SmartReprojector, SIRGAS_2000};

/// Lot analysé, partagé en lecture seule avec tous les workers
#[derive(Debug, Clone)]
pub struct Parcel {
    geometry: MultiPolygon,
    epsg: u32,
    area_ha: f64,
    bounds_geographic: Rect,
    interior_point: Point,
}

impl Parcel {
    /// Crée un lot depuis une géométrie déjà projetée
    pub fn new(geometry: MultiPolygon, epsg: u32) -> Result<Self> {
        if matches!(Crs::from_epsg(epsg), Some(Crs::Geographic)) {
            bail!(
                "EPSG:{} est géographique, le lot doit être en projection métrique",
                epsg
            );
        }

        let geometry = repair_multipolygon(&geometry);
        if geometry.0.is_empty() {
            bail!("Géométrie du lot vide");
        }

        let area_ha = geometry.unsigned_area() / 10_000.0;
        if area_ha <= 0.0 {
            bail!("Surface du lot nulle");
        }

        let interior_point = geometry
            .interior_point()
            .context("Impossible de calculer un point intérieur")?;

        let to_geographic = SmartReprojector::new(epsg, SIRGAS_2000)?;
        let geographic = to_geographic
            .transform_geometry(&Geometry::MultiPolygon(geometry.clone()))
            .context("Échec de la reprojection du lot en EPSG:4674")?;
        let bounds_geographic = geographic
            .bounding_rect()
            .context("Emprise du lot indéterminée")?;

        Ok(Self {
            geometry,
            epsg,
            area_ha,
            bounds_geographic,
            interior_point,
        })
    }

    /// Crée un lot depuis une géométrie en longitude/latitude.
    ///
    /// Sans EPSG cible, la zone SIRGAS 2000 / UTM est déduite du centroïde.
    pub fn from_geographic(geometry: MultiPolygon, epsg: Option<u32>) -> Result<Self> {
        let epsg = match epsg {
            Some(epsg) => epsg,
            None => {
                let centroid = geometry.centroid().context("Géométrie du lot vide")?;
                sirgas_utm_epsg(centroid.x(), centroid.y())?
            }
        };

        let reprojector = SmartReprojector::new(SIRGAS_2000, epsg)?;
        let projected = reprojector
            .transform_shape(&Shape::Polygonal(geometry))
            .context(format!("Échec de la reprojection du lot en EPSG:{}", epsg))?;

        match projected {
            Shape::Polygonal(mp) => Self::new(mp, epsg),
            _ => bail!("Le lot doit être un polygone"),
        }
    }

    /// Charge un lot depuis un fichier GeoJSON (Geometry, Feature ou FeatureCollection).
    ///
    /// Les coordonnées sont géographiques sauf si le membre `crs` désigne une
    /// projection supportée.
    pub fn from_geojson_file(path: &Path, epsg: Option<u32>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read parcel file: {}", path.display()))?;
        let value: Value = serde_json::from_str(&content).context("Failed to parse parcel JSON")?;

        let declared = declared_epsg(&value);
        let geojson = geojson::GeoJson::from_json_value(value).context("Invalid GeoJSON")?;
        let geometry = Geometry::<f64>::try_from(geojson).context("Unsupported GeoJSON geometry")?;

        let Some(Shape::Polygonal(polygons)) = Shape::from_geometry(geometry) else {
            bail!("Aucun polygone dans {}", path.display());
        };

        match declared {
            Some(source) if Crs::is_projected(source) => {
                let target = epsg.unwrap_or(source);
                if target == source {
                    return Self::new(polygons, source);
                }
                let reprojector = SmartReprojector::new(source, target)?;
                match reprojector.transform_shape(&Shape::Polygonal(polygons))? {
                    Shape::Polygonal(mp) => Self::new(mp, target),
                    _ => bail!("Le lot doit être un polygone"),
                }
            }
            _ => Self::from_geographic(polygons, epsg),
        }
    }

    /// Géométrie projetée
    pub fn geometry(&self) -> &MultiPolygon {
        &self.geometry
    }

    /// EPSG de la projection du lot
    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Surface en hectares
    pub fn area_ha(&self) -> f64 {
        self.area_ha
    }

    /// Emprise géographique (EPSG:4674)
    pub fn bounds_geographic(&self) -> Rect {
        self.bounds_geographic
    }

    /// Point intérieur (projection du lot), utilisé pour les sources ponctuelles
    pub fn interior_point(&self) -> Point {
        self.interior_point
    }
}

/// Lit un code EPSG dans le membre `crs` d'un document GeoJSON
/// (`EPSG:31981`, `urn:ogc:def:crs:EPSG::31981`)
fn declared_epsg(value: &Value) -> Option<u32> {
    let name = value.get("crs")?.get("properties")?.get("name")?.as_str()?;
    let digits = name.rsplit(':').next()?;
    digits.parse().ok()
}
