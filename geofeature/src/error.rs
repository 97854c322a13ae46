//! Types d'erreurs pour le crate geofeature

use std::any::Any;

use thiserror::Error;

/// Erreurs pouvant survenir lors du décodage d'une réponse de service
#[derive(Debug, Error)]
pub enum GeoFeatureError {
    /// Le service a renvoyé un objet d'erreur ArcGIS au lieu de features
    #[error("Service error {code}: {message}")]
    Service { code: i64, message: String },

    /// Réponse sans tableau `features`
    #[error("Response has no features array")]
    MissingFeatures,

    /// Erreur de désérialisation JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Erreur de conversion GeoJSON
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Encodage de géométrie non reconnu
    #[error("Unsupported geometry encoding: {0}")]
    UnsupportedEncoding(String),

    /// Géométrie invalide (coordonnées manquantes, ring trop court...)
    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    /// Géométrie vide après décodage
    #[error("Empty geometry")]
    EmptyGeometry,

    /// Le moteur géométrique a paniqué pendant la réparation
    #[error("Geometry engine panicked: {0}")]
    Panicked(String),
}

impl GeoFeatureError {
    /// Crée une erreur de géométrie invalide
    pub fn invalid_geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            reason: reason.into(),
        }
    }
}

/// Message lisible d'une panique capturée par `catch_unwind`
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
