//! Exécution concurrente des sources
//!
//! Une tâche par source, au plus `jobs` en vol (fixé au lancement). Les
//! requêtes sont asynchrones; le traitement géométrique d'une réponse passe
//! par `spawn_blocking`. Les résultats sont accumulés dans l'ordre d'arrivée.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use geofeature::decode::decode_collection;
use geofeature::RawCollection;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::aggregate::{aggregate, FeatureGroup};
use super::format::{build_finding, build_layer, Finding, OverlayLayer};
use super::intersect::{intersect, OverlayError};
use crate::config::SourceDescriptor;
use crate::parcel::Parcel;
use crate::query::{FeatureFetcher, QueryError};
use crate::reproject_lite::{SmartReprojector, SIRGAS_2000, WGS84};

/// Nombre de sources interrogées simultanément par défaut
pub const DEFAULT_JOBS: usize = 12;

/// État d'une exécution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Dispatched,
    Collecting,
    Done,
}

/// Options d'exécution
#[derive(Debug, Clone)]
pub struct OverlayOptions {
    /// Taille du pool de tâches
    pub jobs: usize,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self { jobs: DEFAULT_JOBS }
    }
}

impl OverlayOptions {
    /// Charge les options depuis l'environnement (`OVERLAY_JOBS`)
    pub fn from_env() -> Self {
        Self {
            jobs: std::env::var("OVERLAY_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(DEFAULT_JOBS),
        }
    }
}

/// Résultat d'une source traitée
#[derive(Debug, Default)]
pub struct SourceOutcome {
    pub source: String,
    pub findings: Vec<Finding>,
    pub layers: Vec<OverlayLayer>,
    /// Features décodées
    pub features: usize,
    /// Features ignorées au décodage
    pub skipped_features: usize,
    /// Groupes écartés (reprojection ou intersection en échec)
    pub dropped_groups: usize,
}

/// Échec d'une source: aucun résultat pour elle
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{name}: {error}")]
    Query {
        name: String,
        #[source]
        error: QueryError,
    },

    #[error("{name}: processing task failed: {message}")]
    Task { name: String, message: String },
}

/// Résultat agrégé de toutes les sources
#[derive(Debug, Default)]
pub struct OverlayResult {
    pub findings: Vec<Finding>,
    pub layers: Vec<OverlayLayer>,
    pub sources_total: usize,
    pub sources_failed: usize,
}

/// Une exécution de l'analyse sur un lot
pub struct OverlayRun<'a> {
    fetcher: &'a dyn FeatureFetcher,
    parcel: Arc<Parcel>,
    options: OverlayOptions,
    state: RunState,
}

impl<'a> OverlayRun<'a> {
    pub fn new(fetcher: &'a dyn FeatureFetcher, parcel: Arc<Parcel>, options: OverlayOptions) -> Self {
        Self {
            fetcher,
            parcel,
            options,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Interroge toutes les sources et fusionne leurs résultats.
    ///
    /// Ne retourne jamais d'erreur: une source en échec est journalisée et
    /// comptée, sans autre effet sur le résultat.
    pub async fn execute(&mut self, sources: &[SourceDescriptor]) -> OverlayResult {
        let jobs = self.options.jobs.max(1);
        let fetcher = self.fetcher;
        let parcel = Arc::clone(&self.parcel);

        info!(sources = sources.len(), jobs, "Dispatching sources");
        self.state = RunState::Dispatched;

        let mut completions = stream::iter(sources)
            .map(|source| run_source(fetcher, source, Arc::clone(&parcel)))
            .buffer_unordered(jobs);

        self.state = RunState::Collecting;

        let mut result = OverlayResult {
            sources_total: sources.len(),
            ..Default::default()
        };

        while let Some(completion) = completions.next().await {
            match completion {
                Ok(outcome) => {
                    info!(
                        source = %outcome.source,
                        features = outcome.features,
                        findings = outcome.findings.len(),
                        "Source done"
                    );
                    result.findings.extend(outcome.findings);
                    result.layers.extend(outcome.layers);
                }
                Err(e) => {
                    warn!("Source failed: {}", e);
                    result.sources_failed += 1;
                }
            }
        }

        self.state = RunState::Done;
        result
    }
}

async fn run_source(
    fetcher: &dyn FeatureFetcher,
    source: &SourceDescriptor,
    parcel: Arc<Parcel>,
) -> Result<SourceOutcome, SourceError> {
    let collection = fetcher
        .fetch(source, &parcel)
        .await
        .map_err(|error| SourceError::Query {
            name: source.name.clone(),
            error,
        })?;

    let descriptor = source.clone();
    tokio::task::spawn_blocking(move || process_source(&descriptor, collection, &parcel))
        .await
        .map_err(|e| SourceError::Task {
            name: source.name.clone(),
            message: e.to_string(),
        })
}

/// Traite la réponse d'une source: décodage, regroupement, intersection.
///
/// Les réponses des protocoles géographiques (EPSG:4674) sont reprojetées
/// dans la projection du lot avant l'intersection.
pub fn process_source(source: &SourceDescriptor, collection: RawCollection, parcel: &Parcel) -> SourceOutcome {
    let decoded = decode_collection(&collection);
    let mut outcome = SourceOutcome {
        source: source.name.clone(),
        features: decoded.features.len(),
        skipped_features: decoded.errors.len(),
        ..Default::default()
    };

    if outcome.skipped_features > 0 {
        debug!(
            source = %source.name,
            skipped = outcome.skipped_features,
            "Features skipped at decoding"
        );
    }

    let groups = aggregate(source, decoded.features);
    if groups.is_empty() {
        return outcome;
    }

    let source_epsg = if source.protocol.is_geographic() {
        SIRGAS_2000
    } else {
        parcel.epsg()
    };
    let reprojectors = SmartReprojector::new(source_epsg, parcel.epsg())
        .and_then(|to_parcel| Ok((to_parcel, SmartReprojector::new(parcel.epsg(), WGS84)?)));
    let (to_parcel, to_geographic) = match reprojectors {
        Ok(pair) => pair,
        Err(e) => {
            warn!(source = %source.name, error = %e, "No reprojection available, groups dropped");
            outcome.dropped_groups = groups.len();
            return outcome;
        }
    };

    for group in &groups {
        match overlay_group(source, group, parcel, &to_parcel, &to_geographic) {
            Ok(Some((finding, layer))) => {
                outcome.findings.push(finding);
                outcome.layers.push(layer);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(source = %source.name, group = %group.key, error = %e, "Group dropped");
                outcome.dropped_groups += 1;
            }
        }
    }

    outcome
}

fn overlay_group(
    source: &SourceDescriptor,
    group: &FeatureGroup,
    parcel: &Parcel,
    to_parcel: &SmartReprojector,
    to_geographic: &SmartReprojector,
) -> Result<Option<(Finding, OverlayLayer)>, OverlayError> {
    let shape = to_parcel
        .transform_shape(&group.shape)
        .map_err(|e| OverlayError::Reprojection(e.to_string()))?;

    let Some(overlap) = intersect(&shape, source.kind, parcel)? else {
        return Ok(None);
    };

    let finding = build_finding(source, group, &overlap);
    let layer = build_layer(source, group, &overlap, to_geographic)?;
    Ok(Some((finding, layer)))
}
