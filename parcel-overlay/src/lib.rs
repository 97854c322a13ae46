//! # parcel-overlay
//!
//! Superposition d'un lot rural avec les services géographiques
//! environnementaux et réglementaires brésiliens.
//!
//! ## Features
//!
//! - Interrogation concurrente de services ArcGIS REST, WFS et GeoJSON statiques
//! - Regroupement des features par identité et intersection avec le lot
//! - Surfaces et pourcentages du lot, croisements de lignes, points dans le lot
//! - Reprojection UTM en pur Rust (SIRGAS 2000 / WGS 84), PROJ en option
//! - Rapport JSON et couches GeoJSON pour l'affichage
//!
//! ## Usage CLI
//!
//! ```bash
//! # Analyse avec le registre embarqué du Mato Grosso do Sul
//! parcel-overlay analyze --parcel imovel.geojson --output relatorio.json
//!
//! # Groupes choisis, couches exportées
//! parcel-overlay analyze --parcel imovel.geojson --group Hidrografia --layers camadas.geojson
//!
//! # Lister les sources
//! parcel-overlay sources --config ms
//! ```

pub mod config;
pub mod export;
pub mod overlay;
pub mod parcel;
pub mod query;
pub mod report;
pub mod reproject_lite;

pub use config::{SourceDescriptor, SourceRegistry};
pub use overlay::{Finding, OverlayLayer, OverlayOptions, OverlayRun};
pub use parcel::Parcel;
pub use query::{CachedFetcher, FeatureFetcher, SourceQueryClient};
pub use report::OverlayReport;
