//! Lignes de résultat et couches d'affichage

use std::collections::BTreeMap;

use geo::Geometry;
use geofeature::attributes::resolve_or_na;
use geofeature::{Attributes, GeometryKind};
use rand::Rng;
use serde::{Serialize, Serializer};

use super::aggregate::{FeatureGroup, UNIDENTIFIED};
use super::intersect::{Overlap, OverlayError};
use crate::config::{SourceCategory, SourceDescriptor};
use crate::reproject_lite::SmartReprojector;

/// Base de l'URL des laudos MapBiomas Alerta
pub const ALERT_REPORT_URL: &str = "https://plataforma.alerta.mapbiomas.org/alerta/";

/// Une ligne du rapport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    #[serde(rename = "Base")]
    pub source: String,
    #[serde(rename = "Identificação")]
    pub identity: String,
    #[serde(rename = "Detalhes")]
    pub details: String,
    #[serde(rename = "Área (ha)")]
    pub area: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Extra")]
    pub extra: BTreeMap<String, String>,
}

/// Intersection prête à afficher (EPSG:4326)
#[derive(Debug, Clone, Serialize)]
pub struct OverlayLayer {
    pub name: String,
    #[serde(serialize_with = "serialize_geometry")]
    pub geometry: Geometry,
    pub kind: GeometryKind,
    pub color: String,
}

fn serialize_geometry<S: Serializer>(geometry: &Geometry, serializer: S) -> Result<S::Ok, S::Error> {
    geojson::Geometry::new(geojson::Value::from(geometry)).serialize(serializer)
}

/// Champ dérivé: (libellé, colonnes candidates)
type DerivedField = (&'static str, &'static [&'static str]);

const LICENSING_FIELDS: &[DerivedField] = &[
    ("NumLicenca", &["num_autorizacao", "numero_autorizacao", "autorizacao"]),
    ("Processo", &["numero do processo", "num_processo", "processo"]),
    (
        "Atividade",
        &["Tipo Empreendimento", "tipo_empreendimento", "atividade", "desc_ativ"],
    ),
    ("Tipo Licença", &["Tipo de Licença", "tipo_licenca", "desc_tiple"]),
    ("Situacao", &["status_licenca", "situacao", "status"]),
    ("Emissao", &["data_expedicao", "data_emissao", "dt_emissao"]),
    ("Vencimento", &["Data de Validade", "validade", "data_validade"]),
];

const HYDROGRAPHY_FIELDS: &[DerivedField] = &[("Regime", &["REGIME", "regime"])];

const EMBARGO_FIELDS: &[DerivedField] = &[
    ("Autuado", &["nome_embargado", "nom_pessoa"]),
    ("Infração", &["des_infracao", "des_infra"]),
];

const ALERT_FIELDS: &[DerivedField] = &[
    ("Ano", &["year", "ano"]),
    ("Bioma", &["biome", "bioma"]),
    ("Data Detecção", &["detected_at", "data_deteccao"]),
];

const LAND_USE_FIELDS: &[DerivedField] = &[("Classe", &["CLASS", "Class_Name"])];

fn category_fields(category: SourceCategory) -> &'static [DerivedField] {
    match category {
        SourceCategory::Licensing => LICENSING_FIELDS,
        SourceCategory::Hydrography => HYDROGRAPHY_FIELDS,
        SourceCategory::FederalEmbargo => EMBARGO_FIELDS,
        SourceCategory::DeforestationAlert => ALERT_FIELDS,
        SourceCategory::LandUse => LAND_USE_FIELDS,
        SourceCategory::General => &[],
    }
}

/// Chaîne de détails et champs nommés d'un groupe
pub fn details(
    source: &SourceDescriptor,
    identity: &str,
    attributes: &Attributes,
) -> (String, BTreeMap<String, String>) {
    let mut extra = BTreeMap::new();
    let mut parts = Vec::with_capacity(source.details.len());

    for field in &source.details {
        let value = resolve_or_na(attributes, &field.candidates);
        parts.push(format!("{}: {}", field.label, value));
        extra.insert(field.label.clone(), value);
    }

    let category = source.category();
    for &(label, candidates) in category_fields(category) {
        extra.insert(label.to_string(), resolve_or_na(attributes, candidates));
    }
    if category == SourceCategory::DeforestationAlert && identity != UNIDENTIFIED {
        extra.insert("url_laudo".to_string(), format!("{}{}", ALERT_REPORT_URL, identity));
    }

    let text = if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(" | ")
    };

    (text, extra)
}

/// Construit la ligne de résultat d'un groupe
pub fn build_finding(source: &SourceDescriptor, group: &FeatureGroup, overlap: &Overlap) -> Finding {
    let (details, extra) = details(source, &group.identity, &group.attributes);
    Finding {
        source: source.name.clone(),
        identity: group.identity.clone(),
        details,
        area: overlap.area_text(),
        status: overlap.status_text(),
        extra,
    }
}

/// Construit la couche d'affichage d'un groupe, reprojetée en géographique
pub fn build_layer(
    source: &SourceDescriptor,
    group: &FeatureGroup,
    overlap: &Overlap,
    to_geographic: &SmartReprojector,
) -> Result<OverlayLayer, OverlayError> {
    let geometry = to_geographic
        .transform_geometry(&overlap.geometry())
        .map_err(|e| OverlayError::Reprojection(e.to_string()))?;

    Ok(OverlayLayer {
        name: format!("{}: {}", source.name, group.identity),
        geometry,
        kind: source.kind,
        color: random_color(),
    })
}

/// Couleur `#rrggbb` aléatoire
pub fn random_color() -> String {
    format!("#{:06x}", rand::thread_rng().gen_range(0..=0xFF_FFFFu32))
}
