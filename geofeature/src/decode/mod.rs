//! Décodage des géométries natives des services vers [`Shape`]
//!
//! Les services ArcGIS renvoient des objets `rings` / `paths` / `x,y` /
//! `points`; les WFS et documents statiques renvoient du GeoJSON. Chaque
//! feature est décodée indépendamment: une géométrie illisible fait ignorer
//! la feature, jamais la collection.

pub mod esri;
pub mod geojson;

use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;

use crate::error::panic_message;
use crate::types::{DecodeResult, DecodedFeature, RawCollection, RawFeature, Shape};
use crate::GeoFeatureError;

/// Encodage détecté d'une géométrie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Polygone ArcGIS (`rings`)
    Rings,
    /// Polyligne ArcGIS (`paths`)
    Paths,
    /// Point ArcGIS (`x`, `y`)
    EsriPoint,
    /// Multipoint ArcGIS (`points`)
    EsriMultiPoint,
    /// Objet géométrie GeoJSON (`type`, `coordinates` ou `geometries`)
    GeoJson,
}

/// Détecte l'encodage d'une géométrie brute
pub fn classify(geometry: &Value) -> Option<Encoding> {
    let obj = geometry.as_object()?;

    if obj.contains_key("rings") {
        Some(Encoding::Rings)
    } else if obj.contains_key("paths") {
        Some(Encoding::Paths)
    } else if obj.contains_key("points") {
        Some(Encoding::EsriMultiPoint)
    } else if obj.contains_key("x") && obj.contains_key("y") {
        Some(Encoding::EsriPoint)
    } else if obj.get("type").map_or(false, Value::is_string)
        && (obj.contains_key("coordinates") || obj.contains_key("geometries"))
    {
        Some(Encoding::GeoJson)
    } else {
        None
    }
}

/// Normalise une géométrie brute en [`Shape`] 2D réparée
pub fn normalize(geometry: &Value) -> Result<Shape, GeoFeatureError> {
    let shape = match classify(geometry) {
        Some(Encoding::Rings) => esri::decode_rings(&geometry["rings"])?,
        Some(Encoding::Paths) => esri::decode_paths(&geometry["paths"])?,
        Some(Encoding::EsriPoint) => esri::decode_point(geometry)?,
        Some(Encoding::EsriMultiPoint) => esri::decode_points(&geometry["points"])?,
        Some(Encoding::GeoJson) => geojson::decode_geometry(geometry)?,
        None => {
            return Err(GeoFeatureError::UnsupportedEncoding(describe(geometry)));
        }
    };

    if shape.is_empty() {
        return Err(GeoFeatureError::EmptyGeometry);
    }
    Ok(shape)
}

/// Décode une feature; `Ok(None)` si elle n'a pas de géométrie
pub fn decode_feature(feature: &RawFeature) -> Result<Option<DecodedFeature>, GeoFeatureError> {
    let Some(geometry) = &feature.geometry else {
        return Ok(None);
    };

    let shape = normalize(geometry)?;
    Ok(Some(DecodedFeature {
        attributes: feature.attributes.clone(),
        shape,
    }))
}

/// Décode toutes les features d'une collection.
///
/// Les features sans géométrie sont ignorées silencieusement; les géométries
/// invalides sont ignorées et leur erreur conservée dans `errors`.
pub fn decode_collection(collection: &RawCollection) -> DecodeResult {
    let mut result = DecodeResult::default();

    for (index, feature) in collection.features.iter().enumerate() {
        match guarded(|| decode_feature(feature)) {
            Ok(Some(decoded)) => result.features.push(decoded),
            Ok(None) => tracing::trace!(index, "Feature without geometry"),
            Err(e) => {
                tracing::debug!(index, error = %e, "Skipping feature");
                result.errors.push(e);
            }
        }
    }

    result
}

/// Isole une feature: une panique du moteur booléen devient une erreur
fn guarded<T>(
    decode: impl FnOnce() -> Result<T, GeoFeatureError>,
) -> Result<T, GeoFeatureError> {
    panic::catch_unwind(AssertUnwindSafe(decode))
        .unwrap_or_else(|payload| Err(GeoFeatureError::Panicked(panic_message(&*payload))))
}

fn describe(geometry: &Value) -> String {
    match geometry {
        Value::Object(obj) => {
            let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeometryKind;
    use serde_json::json;

    #[test]
    fn test_classify() {
        assert_eq!(classify(&json!({"rings": []})), Some(Encoding::Rings));
        assert_eq!(classify(&json!({"paths": []})), Some(Encoding::Paths));
        assert_eq!(classify(&json!({"x": 1, "y": 2})), Some(Encoding::EsriPoint));
        assert_eq!(classify(&json!({"points": []})), Some(Encoding::EsriMultiPoint));
        assert_eq!(
            classify(&json!({"type": "Point", "coordinates": [1, 2]})),
            Some(Encoding::GeoJson)
        );
        assert_eq!(classify(&json!({"foo": 1})), None);
        assert_eq!(classify(&json!([1, 2])), None);
    }

    #[test]
    fn test_normalize_unsupported() {
        assert!(matches!(
            normalize(&json!({"curveRings": []})),
            Err(GeoFeatureError::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn test_normalize_idempotent_area() {
        use geo::Area;

        let geometry = json!({"rings": [[[0, 0], [0, 50], [50, 50], [50, 0], [0, 0]]]});
        let Shape::Polygonal(first) = normalize(&geometry).unwrap() else {
            panic!("Expected polygon");
        };
        let again = crate::repair::repair_multipolygon(&first);
        assert!((first.unsigned_area() - again.unsigned_area()).abs() < 1e-9);
    }

    #[test]
    fn test_decode_collection_skips_bad_features() {
        let collection = RawCollection::from_value(json!({
            "features": [
                {"attributes": {"id": 1}, "geometry": {"rings": [[[0, 0], [0, 10], [10, 10], [10, 0], [0, 0]]]}},
                {"attributes": {"id": 2}, "geometry": {"rings": "broken"}},
                {"attributes": {"id": 3}, "geometry": null},
                {"attributes": {"id": 4}, "geometry": {"paths": [[[0, 0], [5, 5]]]}}
            ]
        }))
        .unwrap();

        let result = decode_collection(&collection);
        assert_eq!(result.features.len(), 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.features[0].shape.kind(), GeometryKind::Polygon);
        assert_eq!(result.features[1].shape.kind(), GeometryKind::Line);
        assert_eq!(result.features[1].attributes["id"], 4);
    }

    #[test]
    fn test_panic_becomes_feature_error() {
        let result: Result<(), GeoFeatureError> = guarded(|| panic!("sweep line overflow"));
        match result {
            Err(GeoFeatureError::Panicked(message)) => assert_eq!(message, "sweep line overflow"),
            other => panic!("Expected panic error, got {:?}", other),
        }

        assert!(matches!(guarded(|| Ok(1)), Ok(1)));
    }
}
