//! Géométries au format JSON ArcGIS (`rings`, `paths`, `x`/`y`, `points`)

use geo::{Coord, LineString, MultiLineString, MultiPoint, Point};
use serde_json::Value;

use crate::repair::{self, ring};
use crate::types::Shape;
use crate::GeoFeatureError;

/// Polygone décrit par une liste de rings (extérieurs et trous mélangés)
pub fn decode_rings(rings: &Value) -> Result<Shape, GeoFeatureError> {
    let rings = rings
        .as_array()
        .ok_or_else(|| GeoFeatureError::invalid_geometry("rings is not an array"))?;

    let mut closed = Vec::with_capacity(rings.len());
    for raw in rings {
        let coords = positions(raw)?;
        match ring::close_ring(coords) {
            Some(r) => closed.push(r),
            None => tracing::trace!("Dropping degenerate ring"),
        }
    }

    if closed.is_empty() {
        return Err(GeoFeatureError::EmptyGeometry);
    }

    let polygons = ring::organize_rings(closed);
    let merged = repair::repair_polygons(polygons);
    if merged.0.is_empty() {
        return Err(GeoFeatureError::EmptyGeometry);
    }

    Ok(Shape::Polygonal(merged))
}

/// Ligne décrite par une liste de paths
pub fn decode_paths(paths: &Value) -> Result<Shape, GeoFeatureError> {
    let paths = paths
        .as_array()
        .ok_or_else(|| GeoFeatureError::invalid_geometry("paths is not an array"))?;

    let mut lines = Vec::with_capacity(paths.len());
    for raw in paths {
        let coords = positions(raw)?;
        if coords.len() >= 2 {
            lines.push(LineString::new(coords));
        }
    }

    if lines.is_empty() {
        return Err(GeoFeatureError::EmptyGeometry);
    }

    Ok(Shape::Lineal(MultiLineString::new(lines)))
}

/// Point `{"x": .., "y": ..}`
pub fn decode_point(geometry: &Value) -> Result<Shape, GeoFeatureError> {
    let x = geometry.get("x").and_then(Value::as_f64);
    let y = geometry.get("y").and_then(Value::as_f64);
    match (x, y) {
        (Some(x), Some(y)) if x.is_finite() && y.is_finite() => {
            Ok(Shape::Puntal(MultiPoint::new(vec![Point::new(x, y)])))
        }
        // ArcGIS renvoie x = "NaN" ou null pour un point vide
        _ => Err(GeoFeatureError::EmptyGeometry),
    }
}

/// Multipoint `{"points": [[x, y], ...]}`
pub fn decode_points(points: &Value) -> Result<Shape, GeoFeatureError> {
    let coords = positions(points)?;
    if coords.is_empty() {
        return Err(GeoFeatureError::EmptyGeometry);
    }
    Ok(Shape::Puntal(coords.into_iter().map(Point::from).collect()))
}

/// Lit une liste de positions `[x, y, (z), (m)]`, en ne gardant que x et y
fn positions(raw: &Value) -> Result<Vec<Coord>, GeoFeatureError> {
    let array = raw
        .as_array()
        .ok_or_else(|| GeoFeatureError::invalid_geometry("position list is not an array"))?;

    array.iter().map(position).collect()
}

fn position(raw: &Value) -> Result<Coord, GeoFeatureError> {
    let values = raw
        .as_array()
        .ok_or_else(|| GeoFeatureError::invalid_geometry("position is not an array"))?;

    match (
        values.first().and_then(Value::as_f64),
        values.get(1).and_then(Value::as_f64),
    ) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err(GeoFeatureError::invalid_geometry(format!(
            "position needs two numeric values, got {}",
            raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;
    use serde_json::json;

    #[test]
    fn test_rings_with_hole() {
        let rings = json!([
            [[0, 0], [0, 100], [100, 100], [100, 0], [0, 0]],
            [[10, 10], [20, 10], [20, 20], [10, 20], [10, 10]]
        ]);

        match decode_rings(&rings).unwrap() {
            Shape::Polygonal(mp) => assert!((mp.unsigned_area() - 9900.0).abs() < 1e-6),
            other => panic!("Expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_rings_drop_z() {
        let rings = json!([[[0, 0, 5], [0, 10, 5], [10, 10, 5], [10, 0, 5], [0, 0, 5]]]);
        match decode_rings(&rings).unwrap() {
            Shape::Polygonal(mp) => assert!((mp.unsigned_area() - 100.0).abs() < 1e-6),
            other => panic!("Expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_rings_invalid_position() {
        let rings = json!([[[0, 0], ["a", 1], [1, 1], [0, 0]]]);
        assert!(matches!(
            decode_rings(&rings),
            Err(GeoFeatureError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn test_paths() {
        let paths = json!([[[0, 0], [10, 0]], [[0, 5], [10, 5], [20, 5]], [[1, 1]]]);
        match decode_paths(&paths).unwrap() {
            Shape::Lineal(mls) => assert_eq!(mls.0.len(), 2),
            other => panic!("Expected lines, got {:?}", other),
        }
    }

    #[test]
    fn test_point_nan() {
        assert!(decode_point(&json!({"x": 1.0, "y": 2.0})).is_ok());
        assert!(matches!(
            decode_point(&json!({"x": "NaN", "y": null})),
            Err(GeoFeatureError::EmptyGeometry)
        ));
    }

    #[test]
    fn test_multipoint() {
        match decode_points(&json!([[1, 2], [3, 4]])).unwrap() {
            Shape::Puntal(mp) => assert_eq!(mp.0.len(), 2),
            other => panic!("Expected points, got {:?}", other),
        }
    }
}
