//! Reprojection intelligente : reproject_lite en priorité, fallback sur proj
//!
//! Utilise automatiquement la meilleure option disponible.

use super::{Crs, ReprojectorLite};
use anyhow::Result;
use geo::{Coord, Geometry, MapCoords};
use geofeature::Shape;

/// Reprojection intelligente
///
/// Essaie d'abord reproject_lite (pure Rust), puis fallback sur proj si disponible.
pub enum SmartReprojector {
    /// Reprojection légère (pure Rust)
    Lite(ReprojectorLite),
    /// Reprojection via PROJ (si feature activée)
    #[cfg(feature = "reproject")]
    Proj(crate::export::reproject::Reprojector),
    /// Pas de reprojection (source == cible, ou deux systèmes géographiques confondus)
    Identity,
}

impl SmartReprojector {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        // Pas de reprojection nécessaire
        if source_epsg == target_epsg {
            return Ok(Self::Identity);
        }

        // SIRGAS 2000 et WGS84 géographiques sont traités comme identiques
        if matches!(
            (Crs::from_epsg(source_epsg), Crs::from_epsg(target_epsg)),
            (Some(Crs::Geographic), Some(Crs::Geographic))
        ) {
            return Ok(Self::Identity);
        }

        // Essayer reproject_lite d'abord
        if ReprojectorLite::is_supported(source_epsg, target_epsg) {
            let lite = ReprojectorLite::new(source_epsg, target_epsg)?;
            return Ok(Self::Lite(lite));
        }

        // Fallback sur proj si disponible
        #[cfg(feature = "reproject")]
        {
            let proj = crate::export::reproject::Reprojector::new(source_epsg, target_epsg)?;
            return Ok(Self::Proj(proj));
        }

        // Aucune option disponible
        #[cfg(not(feature = "reproject"))]
        anyhow::bail!(
            "Reprojection EPSG:{} → EPSG:{} non supportée.\n\
             Projections supportées (reproject_lite) :\n\
             - Géographiques: 4674 (SIRGAS 2000), 4326 (WGS84)\n\
             - UTM: 31971-31985 (SIRGAS 2000), 326xx/327xx (WGS84)\n\
             Pour d'autres projections, compilez avec: cargo build --features reproject",
            source_epsg,
            target_epsg
        )
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        match self {
            Self::Identity => Ok(geom.clone()),
            Self::Lite(lite) => lite.transform_geometry(geom),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_geometry(geom),
        }
    }

    /// Transforme une forme en conservant sa dimension
    pub fn transform_shape(&self, shape: &Shape) -> Result<Shape> {
        let convert = |c: Coord| -> Result<Coord> {
            let (x, y) = self.transform_point(c.x, c.y)?;
            Ok(Coord { x, y })
        };

        Ok(match shape {
            Shape::Polygonal(mp) => Shape::Polygonal(mp.try_map_coords(convert)?),
            Shape::Lineal(mls) => Shape::Lineal(mls.try_map_coords(convert)?),
            Shape::Puntal(mp) => Shape::Puntal(mp.try_map_coords(convert)?),
        })
    }

    /// Transforme un point
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        match self {
            Self::Identity => Ok((x, y)),
            Self::Lite(lite) => lite.transform_point(x, y),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_point(x, y),
        }
    }

    /// Retourne une description du reprojector utilisé
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "identity (pas de reprojection)",
            Self::Lite(_) => "reproject_lite (pure Rust)",
            #[cfg(feature = "reproject")]
            Self::Proj(_) => "proj (PROJ library)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, LineString, MultiPolygon, Polygon};

    #[test]
    fn test_identity() {
        let r = SmartReprojector::new(31981, 31981).unwrap();
        assert!(matches!(r, SmartReprojector::Identity));
    }

    #[test]
    fn test_geographic_aliases() {
        let r = SmartReprojector::new(4674, 4326).unwrap();
        assert!(matches!(r, SmartReprojector::Identity));
    }

    #[test]
    fn test_lite() {
        let r = SmartReprojector::new(4674, 31981).unwrap();
        assert!(matches!(r, SmartReprojector::Lite(_)));
        assert_eq!(r.description(), "reproject_lite (pure Rust)");
    }

    #[cfg(not(feature = "reproject"))]
    #[test]
    fn test_unsupported_without_proj() {
        assert!(SmartReprojector::new(2154, 4326).is_err());
    }

    #[test]
    fn test_transform_shape_round_trip() {
        let square = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![
                (500000.0, 7700000.0),
                (500100.0, 7700000.0),
                (500100.0, 7700100.0),
                (500000.0, 7700100.0),
                (500000.0, 7700000.0),
            ]),
            vec![],
        )]);

        let to_geo = SmartReprojector::new(31981, 4674).unwrap();
        let back = SmartReprojector::new(4674, 31981).unwrap();

        let geographic = to_geo.transform_shape(&Shape::Polygonal(square)).unwrap();
        match back.transform_shape(&geographic).unwrap() {
            Shape::Polygonal(mp) => assert!((mp.unsigned_area() - 10_000.0).abs() < 1.0),
            other => panic!("Expected polygon, got {:?}", other),
        }
    }
}
