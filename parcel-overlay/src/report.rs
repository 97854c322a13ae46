//! Rapport d'analyse
//!
//! Les sources en échec ne sont pas distinguées dans les résultats: elles sont
//! seulement comptées pour le résumé console.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::overlay::{Finding, OverlayLayer, OverlayResult};
use crate::parcel::Parcel;

/// Rapport complet d'une analyse
#[derive(Debug, Clone, Serialize)]
pub struct OverlayReport {
    /// Projection du lot
    pub parcel_epsg: u32,
    /// Surface du lot (ha)
    pub parcel_area_ha: f64,
    /// Date de génération
    pub generated_at: DateTime<Utc>,
    /// Durée de l'analyse
    pub duration_secs: f64,
    /// Sources interrogées
    pub sources_total: usize,
    /// Sources en échec
    pub sources_failed: usize,
    pub findings: Vec<Finding>,
    #[serde(skip)]
    pub layers: Vec<OverlayLayer>,
}

impl OverlayReport {
    /// Construit le rapport à partir du résultat d'une exécution
    pub fn new(parcel: &Parcel, result: OverlayResult, duration: Duration) -> Self {
        Self {
            parcel_epsg: parcel.epsg(),
            parcel_area_ha: parcel.area_ha(),
            generated_at: Utc::now(),
            duration_secs: duration.as_secs_f64(),
            sources_total: result.sources_total,
            sources_failed: result.sources_failed,
            findings: result.findings,
            layers: result.layers,
        }
    }

    /// Résultats triés par source puis identité (l'ordre d'arrivée varie)
    pub fn sorted_findings(&self) -> Vec<&Finding> {
        let mut findings: Vec<&Finding> = self.findings.iter().collect();
        findings.sort_by(|a, b| (&a.source, &a.identity).cmp(&(&b.source, &b.identity)));
        findings
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("OVERLAY REPORT - EPSG:{}", self.parcel_epsg);
        println!("{}", "=".repeat(60));

        println!(
            "\nParcel area: {} ha",
            crate::overlay::format_br(self.parcel_area_ha, 4)
        );
        println!("Duration: {:.2}s", self.duration_secs);
        println!(
            "Sources: {} queried, {} failed",
            self.sources_total, self.sources_failed
        );

        if self.findings.is_empty() {
            println!("\nNo overlap found");
        } else {
            println!("\n--- FINDINGS ({}) ---", self.findings.len());
            for f in self.sorted_findings() {
                println!(
                    "  [{}] {} | {} ha | {}",
                    f.source, f.identity, f.area, f.status
                );
                if f.details != "-" {
                    println!("      {}", f.details);
                }
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{} findings from {} sources ({} failed) in {:.2}s",
            self.findings.len(),
            self.sources_total,
            self.sources_failed,
            self.duration_secs
        )
    }
}
