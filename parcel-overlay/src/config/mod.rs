//! Registre des sources de données
//!
//! Le registre est un document JSON qui liste, par groupe thématique, les
//! services à interroger. Un preset embarqué couvre le Mato Grosso do Sul;
//! n'importe quel fichier au même format peut le remplacer.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use geofeature::GeometryKind;
use serde::{Deserialize, Serialize};

/// Registre complet
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceRegistry {
    /// Groupes dans l'ordre de déclaration
    pub groups: Vec<SourceGroup>,
}

/// Groupe thématique de sources
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceGroup {
    pub name: String,
    pub sources: Vec<SourceDescriptor>,
}

/// Protocole d'accès à une source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    /// ArcGIS MapServer / FeatureServer (`/query`)
    #[default]
    Rest,
    /// OGC WFS 1.0.0 (GetFeature en GeoJSON)
    Wfs,
    /// Document GeoJSON statique (URL ou fichier local)
    GeoJson,
}

impl Protocol {
    /// Les réponses de ce protocole sont en coordonnées géographiques (EPSG:4674)
    pub fn is_geographic(&self) -> bool {
        matches!(self, Self::Wfs | Self::GeoJson)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rest => "REST",
            Self::Wfs => "WFS",
            Self::GeoJson => "GEOJSON",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catégorie d'une source, qui détermine les champs dérivés d'un résultat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    /// Licences environnementales émises
    Licensing,
    /// Cours d'eau
    Hydrography,
    /// Embargos fédéraux (IBAMA)
    FederalEmbargo,
    /// Alertes de déforestation (MapBiomas)
    DeforestationAlert,
    /// Usage du sol / zones anthropisées
    LandUse,
    /// Pas de champ dérivé
    General,
}

impl SourceCategory {
    /// Déduit la catégorie du nom de la source
    pub fn infer(name: &str) -> Self {
        if name.contains("Licenças") {
            Self::Licensing
        } else if name.contains("Hidrografia") {
            Self::Hydrography
        } else if name.contains("IBAMA") {
            Self::FederalEmbargo
        } else if name.contains("MapBiomas") {
            Self::DeforestationAlert
        } else if name.contains("Antropizadas") {
            Self::LandUse
        } else {
            Self::General
        }
    }
}

/// Champ de détail: libellé et noms de colonnes candidats
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "DetailSpec")]
pub struct DetailField {
    pub label: String,
    pub candidates: Vec<String>,
}

/// Forme JSON d'un champ de détail: `"colonne"` ou `{"label": .., "candidates": [..]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum DetailSpec {
    Column(String),
    Labeled {
        label: String,
        #[serde(default)]
        candidates: Vec<String>,
    },
}

impl From<DetailSpec> for DetailField {
    fn from(spec: DetailSpec) -> Self {
        match spec {
            DetailSpec::Column(column) => Self {
                label: column.clone(),
                candidates: vec![column],
            },
            DetailSpec::Labeled { label, candidates } if candidates.is_empty() => Self {
                candidates: vec![label.clone()],
                label,
            },
            DetailSpec::Labeled { label, candidates } => Self { label, candidates },
        }
    }
}

/// Description d'une source
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceDescriptor {
    /// Nom affiché (unique dans le registre)
    pub name: String,

    /// Protocole (REST par défaut)
    #[serde(default)]
    pub protocol: Protocol,

    /// URL de base du service (ou chemin local pour GEOJSON)
    pub url: String,

    /// Nom de couche (obligatoire pour WFS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,

    /// Type de géométrie des features
    pub kind: GeometryKind,

    /// Colonnes candidates pour l'identité d'un groupe
    pub identity_columns: Vec<String>,

    /// Champs de détail
    #[serde(default)]
    pub details: Vec<DetailField>,

    /// Catégorie explicite (sinon déduite du nom)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<SourceCategory>,
}

impl SourceDescriptor {
    /// Catégorie effective
    pub fn category(&self) -> SourceCategory {
        self.category
            .unwrap_or_else(|| SourceCategory::infer(&self.name))
    }
}

impl SourceRegistry {
    /// Charge un registre depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let registry: Self =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        registry.validate()?;
        Ok(registry)
    }

    /// Charge un registre depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "ms" => Self::load_embedded(include_str!("presets/ms.json")),
            _ => bail!("Unknown preset: {}. Use: ms", preset),
        }
    }

    /// Preset embarqué ou chemin vers un fichier JSON
    pub fn from_spec(spec: &str) -> Result<Self> {
        let path = Path::new(spec);
        if path.extension().map_or(false, |ext| ext == "json") || path.exists() {
            Self::load(path)
        } else {
            Self::from_preset(spec)
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        let registry: Self =
            serde_json::from_str(json).context("Failed to parse embedded config")?;
        registry.validate()?;
        Ok(registry)
    }

    /// Vérifie les noms et URLs des sources
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for group in &self.groups {
            for source in &group.sources {
                if source.name.trim().is_empty() {
                    bail!("Source with empty name in group '{}'", group.name);
                }
                if source.url.trim().is_empty() {
                    bail!("Source '{}' has an empty url", source.name);
                }
                if !names.insert(source.name.as_str()) {
                    bail!("Duplicate source name: {}", source.name);
                }
            }
        }
        Ok(())
    }

    /// Toutes les sources, dans l'ordre du registre
    pub fn sources(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.groups.iter().flat_map(|g| g.sources.iter())
    }

    /// Nombre total de sources
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.sources.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sources des groupes demandés (tous si la liste est vide)
    pub fn select(&self, groups: &[String]) -> Result<Vec<SourceDescriptor>> {
        if groups.is_empty() {
            return Ok(self.sources().cloned().collect());
        }

        let mut selected = Vec::new();
        for wanted in groups {
            let group = self
                .groups
                .iter()
                .find(|g| g.name.eq_ignore_ascii_case(wanted))
                .with_context(|| {
                    let known: Vec<&str> = self.groups.iter().map(|g| g.name.as_str()).collect();
                    format!("Unknown group: {}. Known: {}", wanted, known.join(", "))
                })?;
            selected.extend(group.sources.iter().cloned());
        }
        Ok(selected)
    }
}
