//! Réparation et fusion des géométries
//!
//! La réparation passe chaque polygone par le moteur booléen (union avec le
//! vide), l'équivalent d'un `buffer(0)`: les auto-intersections sont
//! résolues et les polygones dégénérés disparaissent. Elle doit précéder toute
//! union au niveau d'un groupe.

pub mod ring;

use geo::orient::{Direction, Orient};
use geo::{BooleanOps, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};

use crate::types::Shape;

/// Répare une liste de polygones et les fusionne en un seul `MultiPolygon`
pub fn repair_polygons<I>(polygons: I) -> MultiPolygon
where
    I: IntoIterator<Item = Polygon>,
{
    polygons
        .into_iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, polygon| {
            let single = MultiPolygon::new(vec![polygon.orient(Direction::Default)]);
            acc.union(&single)
        })
}

/// Répare un `MultiPolygon` existant (no-op géométrique sur une entrée valide)
pub fn repair_multipolygon(mp: &MultiPolygon) -> MultiPolygon {
    repair_polygons(mp.0.iter().cloned())
}

/// Fusionne des formes hétérogènes en une seule.
///
/// Les surfaces sont unies; à défaut les lignes, puis les points, sont
/// simplement regroupés.
pub fn union_shapes<I>(shapes: I) -> Option<Shape>
where
    I: IntoIterator<Item = Shape>,
{
    let mut polygons: Vec<Polygon> = Vec::new();
    let mut lines: Vec<LineString> = Vec::new();
    let mut points: Vec<Point> = Vec::new();

    for shape in shapes {
        match shape {
            Shape::Polygonal(mp) => polygons.extend(mp.0),
            Shape::Lineal(mls) => lines.extend(mls.0),
            Shape::Puntal(mp) => points.extend(mp.0),
        }
    }

    if !polygons.is_empty() {
        let merged = repair_polygons(polygons);
        if merged.0.is_empty() {
            return None;
        }
        Some(Shape::Polygonal(merged))
    } else if !lines.is_empty() {
        Some(Shape::Lineal(MultiLineString::new(lines)))
    } else if !points.is_empty() {
        Some(Shape::Puntal(MultiPoint::new(points)))
    } else {
        None
    }
}
