//! Résolution d'attributs par liste de noms candidats
//!
//! Les services publient les mêmes informations sous des noms de colonnes
//! différents (`NOME_UC`, `nome_uc`, `NM_UC`...). La résolution parcourt une
//! liste ordonnée de candidats, sans tenir compte de la casse, puis se rabat
//! sur toute colonne dont le nom ressemble à un nom (`nome`, `nm_`).

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::Attributes;

/// Marqueur renvoyé quand aucun attribut n'a pu être résolu
pub const NOT_AVAILABLE: &str = "N/D";

/// Au-delà de ce seuil, un nombre est interprété comme un timestamp epoch en millisecondes
const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

/// Sous-chaînes des colonnes utilisées en dernier recours
const NAME_HINTS: [&str; 2] = ["nome", "nm_"];

/// Résout la première valeur non vide parmi les candidats.
///
/// Retourne `None` si aucun candidat ni aucune colonne « nom » ne porte de valeur.
pub fn resolve<S: AsRef<str>>(attrs: &Attributes, candidates: &[S]) -> Option<String> {
    if attrs.is_empty() {
        return None;
    }

    let lowered: Vec<(String, &Value)> = attrs
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v))
        .collect();

    for candidate in candidates {
        let wanted = candidate.as_ref().to_lowercase();
        let found = lowered
            .iter()
            .find(|(key, value)| *key == wanted && !is_empty_value(value));
        if let Some((_, value)) = found {
            return Some(format_value(value));
        }
    }

    lowered
        .iter()
        .find(|(key, value)| NAME_HINTS.iter().any(|h| key.contains(h)) && !is_empty_value(value))
        .map(|(_, value)| stringify(value))
}

/// Comme [`resolve`], avec le marqueur [`NOT_AVAILABLE`] en cas d'échec
pub fn resolve_or_na<S: AsRef<str>>(attrs: &Attributes, candidates: &[S]) -> String {
    resolve(attrs, candidates).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Valeurs ignorées à la résolution: null, chaîne vide, zéro, `false`,
/// tableau ou objet vide
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Bool(b) => !b,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Formate une valeur résolue (timestamps epoch convertis en date)
fn format_value(value: &Value) -> String {
    if let Some(n) = value.as_f64() {
        if n > EPOCH_MILLIS_THRESHOLD {
            if let Some(date) = DateTime::<Utc>::from_timestamp_millis(n as i64) {
                return date.format("%d/%m/%Y").to_string();
            }
        }
    }
    stringify(value)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
