//! Types de données pour le crate geofeature

use geo::{Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::GeoFeatureError;

/// Attributs d'une feature (clé -> valeur scalaire hétérogène)
pub type Attributes = serde_json::Map<String, Value>;

/// Type de géométrie déclaré par une source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    #[serde(alias = "ponto")]
    Point,
    #[serde(alias = "linha")]
    Line,
    #[serde(alias = "poligono", alias = "polígono")]
    Polygon,
}

impl GeometryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Line => "line",
            Self::Polygon => "polygon",
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Une feature telle que renvoyée par le service, géométrie non décodée
#[derive(Debug, Clone, Default)]
pub struct RawFeature {
    /// Attributs (`attributes` ArcGIS ou `properties` GeoJSON)
    pub attributes: Attributes,

    /// Géométrie dans l'encodage natif du service
    pub geometry: Option<Value>,
}

/// Collection de features brutes issue d'une réponse
#[derive(Debug, Clone, Default)]
pub struct RawCollection {
    pub features: Vec<RawFeature>,
}

impl RawCollection {
    /// Construit la collection depuis le JSON d'une réponse REST, WFS ou GeoJSON
    pub fn from_value(mut value: Value) -> Result<Self, GeoFeatureError> {
        if let Some(err) = value.get("error") {
            return Err(GeoFeatureError::Service {
                code: err.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        let features = match value.as_object_mut().and_then(|o| o.remove("features")) {
            Some(Value::Array(features)) => features,
            _ => return Err(GeoFeatureError::MissingFeatures),
        };

        let features = features
            .into_iter()
            .filter_map(|feature| match feature {
                Value::Object(obj) => Some(RawFeature::from_object(obj)),
                _ => None,
            })
            .collect();

        Ok(Self { features })
    }

    /// Parse une réponse brute (bytes JSON)
    pub fn from_slice(bytes: &[u8]) -> Result<Self, GeoFeatureError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl RawFeature {
    fn from_object(mut obj: serde_json::Map<String, Value>) -> Self {
        // `attributes` vide ou absent: on se rabat sur `properties`
        let attributes = match obj.remove("attributes") {
            Some(Value::Object(attrs)) if !attrs.is_empty() => attrs,
            _ => match obj.remove("properties") {
                Some(Value::Object(props)) => props,
                _ => Attributes::new(),
            },
        };

        let geometry = obj.remove("geometry").filter(|g| !g.is_null());

        Self {
            attributes,
            geometry,
        }
    }
}

/// Géométrie canonique (2D) utilisée par tout le code en aval du décodage
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Polygonal(MultiPolygon<f64>),
    Lineal(MultiLineString<f64>),
    Puntal(MultiPoint<f64>),
}

impl Shape {
    /// Type de géométrie correspondant
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Polygonal(_) => GeometryKind::Polygon,
            Self::Lineal(_) => GeometryKind::Line,
            Self::Puntal(_) => GeometryKind::Point,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Polygonal(mp) => mp.0.is_empty(),
            Self::Lineal(mls) => mls.0.iter().all(|ls| ls.0.len() < 2),
            Self::Puntal(mp) => mp.0.is_empty(),
        }
    }

    /// Convertit en `geo::Geometry`
    pub fn to_geometry(&self) -> Geometry<f64> {
        match self {
            Self::Polygonal(mp) => Geometry::MultiPolygon(mp.clone()),
            Self::Lineal(mls) => Geometry::MultiLineString(mls.clone()),
            Self::Puntal(mp) => Geometry::MultiPoint(mp.clone()),
        }
    }

    /// Construit une forme depuis une géométrie quelconque, sans réparation.
    ///
    /// Les collections gardent uniquement leurs membres de plus haute dimension.
    pub fn from_geometry(geometry: Geometry<f64>) -> Option<Self> {
        let mut polygons: Vec<Polygon<f64>> = Vec::new();
        let mut lines: Vec<LineString<f64>> = Vec::new();
        let mut points: Vec<Point<f64>> = Vec::new();
        flatten(geometry, &mut polygons, &mut lines, &mut points);

        if !polygons.is_empty() {
            Some(Self::Polygonal(MultiPolygon::new(polygons)))
        } else if !lines.is_empty() {
            Some(Self::Lineal(MultiLineString::new(lines)))
        } else if !points.is_empty() {
            Some(Self::Puntal(MultiPoint::new(points)))
        } else {
            None
        }
    }
}

fn flatten(
    geometry: Geometry<f64>,
    polygons: &mut Vec<Polygon<f64>>,
    lines: &mut Vec<LineString<f64>>,
    points: &mut Vec<Point<f64>>,
) {
    match geometry {
        Geometry::Point(p) => points.push(p),
        Geometry::MultiPoint(mp) => points.extend(mp.0),
        Geometry::Line(l) => lines.push(LineString::from(vec![l.start, l.end])),
        Geometry::LineString(ls) if ls.0.len() >= 2 => lines.push(ls),
        Geometry::LineString(_) => {}
        Geometry::MultiLineString(mls) => {
            lines.extend(mls.0.into_iter().filter(|ls| ls.0.len() >= 2))
        }
        Geometry::Polygon(p) => polygons.push(p),
        Geometry::MultiPolygon(mp) => polygons.extend(mp.0),
        Geometry::Rect(r) => polygons.push(r.to_polygon()),
        Geometry::Triangle(t) => polygons.push(t.to_polygon()),
        Geometry::GeometryCollection(gc) => {
            for g in gc.0 {
                flatten(g, polygons, lines, points);
            }
        }
    }
}

/// Une feature après décodage de sa géométrie
#[derive(Debug, Clone)]
pub struct DecodedFeature {
    pub attributes: Attributes,
    pub shape: Shape,
}

/// Résultat du décodage d'une collection
#[derive(Debug, Default)]
pub struct DecodeResult {
    /// Features décodées
    pub features: Vec<DecodedFeature>,

    /// Erreurs non fatales (une par feature ignorée)
    pub errors: Vec<GeoFeatureError>,
}
