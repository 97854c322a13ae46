//! Requêtes OGC WFS 1.0.0 (GeoServer)

use super::{HttpMethod, QueryError, QueryRequest};
use crate::config::SourceDescriptor;
use crate::parcel::Parcel;

/// Système des emprises et des réponses WFS
pub const WFS_SRS: &str = "EPSG:4674";

/// Construit la requête GetFeature filtrée par l'emprise géographique du lot
pub fn build(source: &SourceDescriptor, parcel: &Parcel) -> Result<QueryRequest, QueryError> {
    let layer = source
        .layer
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| QueryError::MissingLayer(source.name.clone()))?;

    let params = vec![
        ("service".to_string(), "WFS".to_string()),
        ("version".to_string(), "1.0.0".to_string()),
        ("request".to_string(), "GetFeature".to_string()),
        ("typeName".to_string(), layer.to_string()),
        ("outputFormat".to_string(), "application/json".to_string()),
        ("srsName".to_string(), WFS_SRS.to_string()),
        ("bbox".to_string(), bbox(parcel)),
    ];

    Ok(QueryRequest::Http {
        method: HttpMethod::Get,
        url: source.url.clone(),
        params,
    })
}

/// `minx,miny,maxx,maxy,EPSG:4674`
fn bbox(parcel: &Parcel) -> String {
    let bounds = parcel.bounds_geographic();
    format!(
        "{},{},{},{},{}",
        bounds.min().x,
        bounds.min().y,
        bounds.max().x,
        bounds.max().y,
        WFS_SRS
    )
}
