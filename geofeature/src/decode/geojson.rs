//! Géométries GeoJSON (WFS, documents statiques, FeatureServer `f=geojson`)

use geo::Geometry;
use serde_json::Value;

use crate::repair;
use crate::types::Shape;
use crate::GeoFeatureError;

/// Décode un objet géométrie GeoJSON
pub fn decode_geometry(value: &Value) -> Result<Shape, GeoFeatureError> {
    let geometry = ::geojson::Geometry::from_json_value(value.clone())?;
    let geometry: Geometry<f64> = Geometry::try_from(geometry.value)?;

    match Shape::from_geometry(geometry) {
        Some(Shape::Polygonal(mp)) => {
            let repaired = repair::repair_multipolygon(&mp);
            if repaired.0.is_empty() {
                return Err(GeoFeatureError::EmptyGeometry);
            }
            Ok(Shape::Polygonal(repaired))
        }
        Some(shape) => Ok(shape),
        None => Err(GeoFeatureError::EmptyGeometry),
    }
}
