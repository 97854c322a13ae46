//! Intersection d'un groupe avec le lot
//!
//! Les deux géométries doivent être dans la projection métrique du lot. La
//! règle appliquée dépend du type déclaré par la source, pas de la forme
//! renvoyée par le service. Le moteur booléen peut paniquer sur des
//! géométries dégénérées: chaque opération est isolée et une panique n'écarte
//! que le groupe concerné.

use std::panic::{self, AssertUnwindSafe};

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{
    Area, BooleanOps, Geometry, Intersects, LinesIter, MultiLineString, MultiPoint, MultiPolygon,
    Point,
};
use geofeature::{GeometryKind, Shape};
use thiserror::Error;

use super::panic_message;
use crate::parcel::Parcel;

/// Surface minimale retenue pour une intersection polygonale (ha)
pub const MIN_AREA_HA: f64 = 0.5;

/// Erreurs au niveau d'un groupe
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Reprojection failed: {0}")]
    Reprojection(String),

    #[error("Geometry engine panicked: {0}")]
    Panicked(String),
}

/// Intersection non vide d'un groupe avec le lot
#[derive(Debug, Clone)]
pub enum Overlap {
    /// Surface commune (au-dessus du seuil)
    Area {
        geometry: MultiPolygon,
        area_ha: f64,
        percent: f64,
    },
    /// Source linéaire qui touche le lot
    Crossing(Geometry),
    /// Source ponctuelle qui touche le lot
    Presence(Geometry),
}

impl Overlap {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Area { .. } => GeometryKind::Polygon,
            Self::Crossing(_) => GeometryKind::Line,
            Self::Presence(_) => GeometryKind::Point,
        }
    }

    pub fn geometry(&self) -> Geometry {
        match self {
            Self::Area { geometry, .. } => Geometry::MultiPolygon(geometry.clone()),
            Self::Crossing(geometry) | Self::Presence(geometry) => geometry.clone(),
        }
    }

    /// Texte de la colonne surface
    pub fn area_text(&self) -> String {
        match self {
            Self::Area { area_ha, .. } => format_br(*area_ha, 4),
            Self::Crossing(_) => "Sim".to_string(),
            Self::Presence(_) => "Ponto no Imóvel".to_string(),
        }
    }

    /// Texte de la colonne statut (pourcentage du lot pour les surfaces)
    pub fn status_text(&self) -> String {
        match self {
            Self::Area { percent, .. } => format!("{}%", format_br(*percent, 2)),
            Self::Crossing(_) => "Cruzamento".to_string(),
            Self::Presence(_) => "Foco/Ponto".to_string(),
        }
    }
}

/// Intersecte une forme avec le lot selon le type déclaré de la source.
///
/// - `Polygon`: surface commune, retenue à partir de [`MIN_AREA_HA`]
/// - `Line`: croisement dès que l'intersection est non vide
/// - `Point`: présence dès que l'intersection est non vide
pub fn intersect(
    shape: &Shape,
    kind: GeometryKind,
    parcel: &Parcel,
) -> Result<Option<Overlap>, OverlayError> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| match kind {
        GeometryKind::Polygon => area_overlap(shape, parcel),
        GeometryKind::Line => common_geometry(shape, parcel).map(Overlap::Crossing),
        GeometryKind::Point => common_geometry(shape, parcel).map(Overlap::Presence),
    }));

    result.map_err(|payload| OverlayError::Panicked(panic_message(&*payload)))
}

/// Une forme non surfacique n'a pas de surface commune
fn area_overlap(shape: &Shape, parcel: &Parcel) -> Option<Overlap> {
    let Shape::Polygonal(mp) = shape else {
        return None;
    };

    let common = parcel.geometry().intersection(mp);
    let area_ha = common.unsigned_area() / 10_000.0;
    if common.0.is_empty() || area_ha < MIN_AREA_HA {
        return None;
    }
    Some(Overlap::Area {
        geometry: common,
        area_ha,
        percent: area_ha / parcel.area_ha() * 100.0,
    })
}

/// Partie commune d'une forme et du lot, `None` si elles sont disjointes.
///
/// Un simple contact (sommet ou bord partagé) donne les points de contact.
fn common_geometry(shape: &Shape, parcel: &Parcel) -> Option<Geometry> {
    let lot = parcel.geometry();

    match shape {
        Shape::Polygonal(mp) => {
            let common = lot.intersection(mp);
            if !common.0.is_empty() && common.unsigned_area() > 0.0 {
                return Some(Geometry::MultiPolygon(common));
            }
            lot.intersects(mp).then(|| contact(shape, parcel))
        }
        Shape::Lineal(mls) => {
            let inside = lot.clip(mls, false);
            let parts: Vec<_> = inside
                .0
                .into_iter()
                .filter(|ls| ls.0.windows(2).any(|w| w[0] != w[1]))
                .collect();
            if !parts.is_empty() {
                return Some(Geometry::MultiLineString(MultiLineString::new(parts)));
            }
            lot.intersects(mls).then(|| contact(shape, parcel))
        }
        Shape::Puntal(mp) => {
            let inside: Vec<Point> = mp.0.iter().filter(|p| lot.intersects(*p)).copied().collect();
            (!inside.is_empty()).then(|| Geometry::MultiPoint(MultiPoint::new(inside)))
        }
    }
}

/// Points de contact entre les segments d'une forme et les contours du lot
fn contact(shape: &Shape, parcel: &Parcel) -> Geometry {
    let segments: Vec<_> = match shape {
        Shape::Polygonal(mp) => mp.lines_iter().collect(),
        Shape::Lineal(mls) => mls.lines_iter().collect(),
        Shape::Puntal(_) => Vec::new(),
    };

    let mut points = Vec::new();
    for boundary in parcel.geometry().lines_iter() {
        for segment in &segments {
            match line_intersection(*segment, boundary) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    points.push(Point::from(intersection));
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    points.push(Point::from(intersection.start));
                }
                None => {}
            }
        }
    }

    if points.is_empty() {
        return shape.to_geometry();
    }
    points.dedup();
    Geometry::MultiPoint(MultiPoint::new(points))
}

/// Formate un nombre à la brésilienne: `.` pour les milliers, `,` décimale
pub fn format_br(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        grouped.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    if let Some(frac) = frac_part {
        grouped.push(',');
        grouped.push_str(frac);
    }
    grouped
}
