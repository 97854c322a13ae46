//! Reprojection PROJ pour les systèmes absents de `reproject_lite`
//! (SIRGAS 2000 / Policônica, Albers IBGE, UTM d'autres datums)
//!
//! Disponible uniquement avec le feature `reproject`.

use anyhow::{Context, Result};
use geo::{Coord, Geometry, MapCoords};
use proj::Proj;

/// Transformation PROJ entre deux codes EPSG
pub struct Reprojector {
    proj: Proj,
    identity: bool,
}

impl Reprojector {
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let source = format!("EPSG:{}", source_epsg);
        let target = format!("EPSG:{}", target_epsg);

        // new_known_crs force l'ordre (lon, lat) pour EPSG:4674 et 4326
        let proj = Proj::new_known_crs(&source, &target, None)
            .with_context(|| format!("PROJ cannot transform {} to {}", source, target))?;

        Ok(Self {
            proj,
            identity: source_epsg == target_epsg,
        })
    }

    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if self.identity {
            return Ok((x, y));
        }
        self.proj
            .convert((x, y))
            .with_context(|| format!("PROJ failed on ({}, {})", x, y))
    }

    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        if self.identity {
            return Ok(geom.clone());
        }
        geom.try_map_coords(|c: Coord| {
            let (x, y) = self.transform_point(c.x, c.y)?;
            Ok(Coord { x, y })
        })
    }
}
