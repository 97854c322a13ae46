//! Moteur de superposition
//!
//! Pour chaque source: décodage de la réponse, regroupement par identité,
//! reprojection dans la projection du lot, intersection puis mise en forme.
//! Les erreurs sont absorbées au plus près: une feature illisible est
//! ignorée, un groupe en échec est écarté, une source en échec ne produit
//! aucun résultat.

pub mod aggregate;
pub mod format;
pub mod intersect;
pub mod orchestrator;

pub use aggregate::{aggregate, FeatureGroup, UNIDENTIFIED};
pub use format::{Finding, OverlayLayer};
pub use intersect::{intersect, format_br, Overlap, OverlayError, MIN_AREA_HA};
pub use orchestrator::{
    process_source, OverlayOptions, OverlayResult, OverlayRun, RunState, SourceError, SourceOutcome,
};

pub(crate) use geofeature::panic_message;
