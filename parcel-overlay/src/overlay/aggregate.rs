//! Regroupement des features d'une source par identité

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use geofeature::attributes::resolve;
use geofeature::repair::union_shapes;
use geofeature::{Attributes, DecodedFeature, GeometryKind, Shape};
use rand::Rng;
use tracing::warn;

use super::panic_message;
use crate::config::SourceDescriptor;

/// Identité d'un groupe dont aucun attribut n'a pu être résolu
pub const UNIDENTIFIED: &str = "Não identificado";

/// Groupe de features partageant la même clé
#[derive(Debug, Clone)]
pub struct FeatureGroup {
    /// Clé de regroupement (unique dans la source)
    pub key: String,
    /// Libellé affiché
    pub identity: String,
    /// Union des géométries des membres
    pub shape: Shape,
    /// Attributs du premier membre
    pub attributes: Attributes,
}

struct PendingGroup {
    key: String,
    identity: String,
    shapes: Vec<Shape>,
    attributes: Attributes,
}

/// Regroupe les features décodées d'une source.
///
/// Lignes et polygones sont regroupés par libellé et unis. Chaque point
/// reçoit sa propre clé: deux points ne sont jamais fusionnés. L'ordre des
/// groupes suit l'ordre de première apparition.
pub fn aggregate(source: &SourceDescriptor, features: Vec<DecodedFeature>) -> Vec<FeatureGroup> {
    let mut pending: Vec<PendingGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for feature in features {
        let label = resolve(&feature.attributes, &source.identity_columns);

        let (key, identity) = match source.kind {
            GeometryKind::Point => {
                let key = point_key(&source.name, label.as_deref(), &index);
                (key, label.unwrap_or_else(|| UNIDENTIFIED.to_string()))
            }
            GeometryKind::Line | GeometryKind::Polygon => {
                let identity = label.unwrap_or_else(|| UNIDENTIFIED.to_string());
                (identity.clone(), identity)
            }
        };

        match index.get(&key) {
            Some(&i) => pending[i].shapes.push(feature.shape),
            None => {
                index.insert(key.clone(), pending.len());
                pending.push(PendingGroup {
                    key,
                    identity,
                    shapes: vec![feature.shape],
                    attributes: feature.attributes,
                });
            }
        }
    }

    pending
        .into_iter()
        .filter_map(|group| {
            let shape = merge(&source.name, &group.key, group.shapes)?;
            Some(FeatureGroup {
                key: group.key,
                identity: group.identity,
                shape,
                attributes: group.attributes,
            })
        })
        .collect()
}

/// `<source>_<libellé>`, suffixe aléatoire si le libellé est vide, puis
/// désambiguïsation si la clé est déjà prise
fn point_key(source: &str, label: Option<&str>, taken: &HashMap<String, usize>) -> String {
    let mut rng = rand::thread_rng();

    let base = match label {
        Some(label) => format!("{}_{}", source, label),
        None => format!("{}_{}", source, rng.gen_range(0..1_000_000u32)),
    };

    if !taken.contains_key(&base) {
        return base;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{}#{}", base, n);
        if !taken.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn merge(source: &str, key: &str, mut shapes: Vec<Shape>) -> Option<Shape> {
    if shapes.len() == 1 {
        return shapes.pop();
    }

    match panic::catch_unwind(AssertUnwindSafe(move || union_shapes(shapes))) {
        Ok(shape) => shape,
        Err(payload) => {
            warn!(source, group = key, error = %panic_message(&*payload), "Union failed, group dropped");
            None
        }
    }
}
