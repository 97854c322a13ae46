//! Requêtes ArcGIS REST (`MapServer/<n>/query`, `FeatureServer/<n>/query`)

use geo::orient::{Direction, Orient};
use geo::{Coord, LineString, MultiPolygon};
use geofeature::GeometryKind;
use serde_json::{json, Value};

use super::{HttpMethod, QueryRequest};
use crate::config::SourceDescriptor;
use crate::parcel::Parcel;

/// Ajoute `/query` à l'URL de la couche si nécessaire
pub fn query_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with("/query") {
        trimmed.to_string()
    } else {
        format!("{}/query", trimmed)
    }
}

/// Construit la requête d'intersection spatiale.
///
/// Les sources ponctuelles sont filtrées par le point intérieur du lot, les
/// autres par son polygone. La réponse est demandée dans la projection du lot.
pub fn build(source: &SourceDescriptor, parcel: &Parcel) -> QueryRequest {
    let (geometry, geometry_type) = match source.kind {
        GeometryKind::Point => (esri_point(parcel), "esriGeometryPoint"),
        GeometryKind::Line | GeometryKind::Polygon => (esri_polygon(parcel), "esriGeometryPolygon"),
    };

    let params = [
        ("f", "json".to_string()),
        ("geometry", geometry.to_string()),
        ("geometryType", geometry_type.to_string()),
        ("spatialRel", "esriSpatialRelIntersects".to_string()),
        ("outFields", "*".to_string()),
        ("returnGeometry", "true".to_string()),
        ("outSR", parcel.epsg().to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    QueryRequest::Http {
        method: HttpMethod::Post,
        url: query_url(&source.url),
        params,
    }
}

/// Polygone du lot au format JSON ArcGIS (extérieurs en sens horaire)
pub fn esri_polygon(parcel: &Parcel) -> Value {
    let oriented: MultiPolygon = parcel.geometry().orient(Direction::Reversed);

    let mut rings = Vec::new();
    for polygon in &oriented {
        rings.push(ring_json(polygon.exterior()));
        for interior in polygon.interiors() {
            rings.push(ring_json(interior));
        }
    }

    json!({
        "rings": rings,
        "spatialReference": {"wkid": parcel.epsg()}
    })
}

/// Point intérieur du lot au format JSON ArcGIS
pub fn esri_point(parcel: &Parcel) -> Value {
    let point = parcel.interior_point();
    json!({
        "x": point.x(),
        "y": point.y(),
        "spatialReference": {"wkid": parcel.epsg()}
    })
}

fn ring_json(ring: &LineString) -> Value {
    Value::Array(
        ring.coords()
            .map(|&Coord { x, y }| json!([x, y]))
            .collect(),
    )
}
