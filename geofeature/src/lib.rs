//! # geofeature
//!
//! Modèle de features et décodage des géométries renvoyées par les services
//! géographiques brésiliens (ArcGIS REST, WFS GeoServer, GeoJSON statique).
//!
//! ## Features
//!
//! - Collections brutes indépendantes du protocole (`attributes` ou `properties`)
//! - Décodage des encodages ArcGIS (`rings`, `paths`, `x/y`, `points`) et GeoJSON
//! - Réparation automatique des polygones invalides (auto-intersections, rings ouverts)
//! - Résolution d'attributs par noms candidats, insensible à la casse
//! - Types `geo` pour l'interopérabilité avec l'écosystème Rust géospatial
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geofeature::{attributes, decode, RawCollection};
//!
//! let collection = RawCollection::from_slice(&body)?;
//! let result = decode::decode_collection(&collection);
//!
//! for feature in &result.features {
//!     let name = attributes::resolve_or_na(&feature.attributes, &["nome_uc", "nm_uc"]);
//!     println!("{}: {}", name, feature.shape.kind());
//! }
//! ```

pub mod attributes;
pub mod decode;
pub mod error;
pub mod repair;
pub mod types;

pub use error::{panic_message, GeoFeatureError};
pub use types::{
    Attributes, DecodeResult, DecodedFeature, GeometryKind, RawCollection, RawFeature, Shape,
};

/// Parse et décode une réponse JSON complète en une seule étape.
///
/// # Errors
///
/// Retourne `GeoFeatureError` si la réponse n'est pas du JSON, porte une
/// erreur de service ou n'a pas de tableau `features`. Les géométries
/// invalides ne sont pas fatales: elles sont listées dans `DecodeResult::errors`.
pub fn decode_response(bytes: &[u8]) -> Result<DecodeResult, GeoFeatureError> {
    let collection = RawCollection::from_slice(bytes)?;
    Ok(decode::decode_collection(&collection))
}
