//! Documents GeoJSON statiques (URL http(s) ou fichier local)
//!
//! Aucun filtre côté serveur: toute la collection est renvoyée et
//! l'intersection avec le lot se fait localement.

use std::path::PathBuf;

use super::{HttpMethod, QueryRequest};
use crate::config::SourceDescriptor;

pub fn build(source: &SourceDescriptor) -> QueryRequest {
    let url = source.url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        QueryRequest::Http {
            method: HttpMethod::Get,
            url: url.to_string(),
            params: Vec::new(),
        }
    } else {
        let path = url.strip_prefix("file://").unwrap_or(url);
        QueryRequest::File(PathBuf::from(path))
    }
}
