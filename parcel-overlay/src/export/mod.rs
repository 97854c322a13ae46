//! Sorties fichier (couches GeoJSON) et reprojection PROJ optionnelle

pub mod geojson;
#[cfg(feature = "reproject")]
pub mod reproject;

pub use geojson::export_layers;
