//! Interrogation des services de données
//!
//! Chaque source est interrogée avec un filtre spatial sur le lot:
//! - `rest`: ArcGIS `/query` (POST, géométrie du lot dans sa projection)
//! - `wfs`: GetFeature en GeoJSON filtré par l'emprise EPSG:4674
//! - `offline`: document GeoJSON statique, sans filtre côté serveur
//!
//! La construction de la requête est pure ([`build_request`]); l'exécution
//! passe par le trait [`FeatureFetcher`], implémenté par le client HTTP et
//! par le cache de réponses.

pub mod cache;
pub mod offline;
pub mod rest;
pub mod wfs;

use std::path::PathBuf;
use std::time::Duration;

use futures::future::BoxFuture;
use geofeature::{GeoFeatureError, RawCollection};
use thiserror::Error;
use tracing::debug;

use crate::config::{Protocol, SourceDescriptor};
use crate::parcel::Parcel;

pub use cache::{CachedFetcher, ResponseCache};

/// Timeout par défaut d'une requête
pub const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// Durée de vie par défaut du cache de réponses
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

/// Erreurs d'interrogation d'une source
#[derive(Debug, Error)]
pub enum QueryError {
    /// Source WFS sans nom de couche
    #[error("WFS source '{0}' has no layer name")]
    MissingLayer(String),

    /// Réponse HTTP hors 2xx
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Erreur de transport (connexion, timeout, TLS)
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Lecture d'un fichier local
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Réponse illisible ou erreur renvoyée par le service
    #[error("Invalid response: {0}")]
    Decode(#[from] GeoFeatureError),
}

/// Méthode HTTP d'une requête
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Requête prête à être exécutée
#[derive(Debug, Clone, PartialEq)]
pub enum QueryRequest {
    /// Requête HTTP (paramètres en query string pour GET, en formulaire pour POST)
    Http {
        method: HttpMethod,
        url: String,
        params: Vec<(String, String)>,
    },
    /// Fichier local
    File(PathBuf),
}

impl QueryRequest {
    /// Clé de cache (blake3 de la méthode, de l'URL et des paramètres)
    pub fn cache_key(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        match self {
            Self::Http {
                method,
                url,
                params,
            } => {
                hasher.update(method.as_str().as_bytes());
                hasher.update(b"\n");
                hasher.update(url.as_bytes());
                for (key, value) in params {
                    hasher.update(b"\n");
                    hasher.update(key.as_bytes());
                    hasher.update(b"=");
                    hasher.update(value.as_bytes());
                }
            }
            Self::File(path) => {
                hasher.update(b"FILE\n");
                hasher.update(path.to_string_lossy().as_bytes());
            }
        }
        hex::encode(hasher.finalize().as_bytes())
    }
}

/// Construit la requête d'une source pour un lot
pub fn build_request(source: &SourceDescriptor, parcel: &Parcel) -> Result<QueryRequest, QueryError> {
    match source.protocol {
        Protocol::Rest => Ok(rest::build(source, parcel)),
        Protocol::Wfs => wfs::build(source, parcel),
        Protocol::GeoJson => Ok(offline::build(source)),
    }
}

/// Récupère la collection brute d'une source pour un lot
pub trait FeatureFetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        source: &'a SourceDescriptor,
        parcel: &'a Parcel,
    ) -> BoxFuture<'a, Result<RawCollection, QueryError>>;
}

/// Configuration du client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timeout par requête
    pub timeout: Duration,
    /// User-Agent envoyé aux services
    pub user_agent: String,
    /// Durée de vie du cache de réponses (0 = désactivé)
    pub cache_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: default_user_agent(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl ClientConfig {
    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        Self {
            timeout: std::env::var("OVERLAY_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            user_agent: std::env::var("OVERLAY_USER_AGENT").unwrap_or_else(|_| default_user_agent()),
            cache_ttl: std::env::var("OVERLAY_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(DEFAULT_CACHE_TTL_SECS)),
        }
    }
}

fn default_user_agent() -> String {
    format!("parcel-overlay/{}", env!("CARGO_PKG_VERSION"))
}

/// Client HTTP des sources (sans retry)
#[derive(Debug, Clone)]
pub struct SourceQueryClient {
    http: reqwest::Client,
}

impl SourceQueryClient {
    /// Crée un client avec timeout et User-Agent
    pub fn new(config: &ClientConfig) -> Result<Self, QueryError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http })
    }

    /// Exécute une requête et parse la collection
    pub async fn execute(&self, request: &QueryRequest) -> Result<RawCollection, QueryError> {
        let bytes = match request {
            QueryRequest::Http {
                method,
                url,
                params,
            } => {
                let builder = match method {
                    HttpMethod::Get => self.http.get(url).query(params),
                    HttpMethod::Post => self.http.post(url).form(params),
                };

                let response = builder.send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(QueryError::Status {
                        status: status.as_u16(),
                        url: url.clone(),
                    });
                }
                response.bytes().await?.to_vec()
            }
            QueryRequest::File(path) => tokio::fs::read(path).await?,
        };

        let collection = RawCollection::from_slice(&bytes)?;
        debug!(features = collection.len(), "Response parsed");
        Ok(collection)
    }
}

impl FeatureFetcher for SourceQueryClient {
    fn fetch<'a>(
        &'a self,
        source: &'a SourceDescriptor,
        parcel: &'a Parcel,
    ) -> BoxFuture<'a, Result<RawCollection, QueryError>> {
        Box::pin(async move {
            let request = build_request(source, parcel)?;
            debug!(source = %source.name, protocol = %source.protocol, "Querying source");
            self.execute(&request).await
        })
    }
}
