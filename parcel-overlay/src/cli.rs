//! Définition et implémentation des commandes CLI
//!
//! - `analyze`: superposition d'un lot avec les sources du registre
//! - `sources`: liste des sources d'un registre

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use tracing::info;

use parcel_overlay::config::{SourceDescriptor, SourceRegistry};
use parcel_overlay::export::export_layers;
use parcel_overlay::overlay::{OverlayOptions, OverlayRun};
use parcel_overlay::parcel::Parcel;
use parcel_overlay::query::{CachedFetcher, ClientConfig, SourceQueryClient};
use parcel_overlay::report::OverlayReport;

#[derive(Subcommand)]
pub enum Commands {
    /// Overlay a parcel against the configured geo-services
    Analyze(AnalyzeArgs),

    /// List the sources of a registry
    Sources {
        /// Registry preset name (ms) or path to a JSON registry
        #[arg(long, default_value = "ms")]
        config: String,
    },
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Parcel boundary (GeoJSON, longitude/latitude unless a projected crs is declared)
    #[arg(short, long)]
    pub parcel: PathBuf,

    /// Metric CRS of the analysis (default: SIRGAS 2000 / UTM zone of the parcel)
    #[arg(long)]
    pub epsg: Option<u32>,

    /// Registry preset name (ms) or path to a JSON registry
    #[arg(long, default_value = "ms")]
    pub config: String,

    /// Only query these source groups (repeatable)
    #[arg(short, long)]
    pub group: Vec<String>,

    /// Maximum number of sources queried concurrently (default: OVERLAY_JOBS or 12)
    #[arg(long, alias = "threads")]
    pub jobs: Option<usize>,

    /// Write the JSON report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the overlay layers (EPSG:4326) to this GeoJSON file
    #[arg(long)]
    pub layers: Option<PathBuf>,

    /// Disable the response cache
    #[arg(long)]
    pub no_cache: bool,
}

/// Exécute la commande analyze
pub async fn cmd_analyze(args: &AnalyzeArgs) -> Result<()> {
    let registry = SourceRegistry::from_spec(&args.config)?;
    let sources = registry.select(&args.group)?;
    if sources.is_empty() {
        bail!("No source selected in registry '{}'", args.config);
    }

    let parcel = Arc::new(Parcel::from_geojson_file(&args.parcel, args.epsg)?);

    let mut options = OverlayOptions::from_env();
    if let Some(jobs) = args.jobs {
        options.jobs = jobs.max(1);
    }

    let mut client_config = ClientConfig::from_env();
    if args.no_cache {
        client_config.cache_ttl = Duration::ZERO;
    }

    println!("=== Overlay ===");
    println!("Parcel: {}", args.parcel.display());
    println!("CRS: EPSG:{}", parcel.epsg());
    println!("Area: {:.4} ha", parcel.area_ha());
    println!("Config: {}", args.config);
    println!("Sources: {}", sources.len());
    println!("Jobs: {}", options.jobs);
    println!("Timeout: {}s", client_config.timeout.as_secs());
    println!("Cache: {}", cache_label(client_config.cache_ttl));

    let client = SourceQueryClient::new(&client_config)?;
    let fetcher = CachedFetcher::new(client, client_config.cache_ttl);

    let started_at = Instant::now();
    let mut run = OverlayRun::new(&fetcher, Arc::clone(&parcel), options);
    let result = run.execute(&sources).await;
    let report = OverlayReport::new(&parcel, result, started_at.elapsed());

    report.display();

    if let Some(output) = &args.output {
        report.save_to_file(output)?;
        println!("Report written to {}", output.display());
    }

    if let Some(layers) = &args.layers {
        export_layers(&report.layers, layers)?;
        println!("Layers written to {}", layers.display());
    }

    info!("{}", report.summary());
    Ok(())
}

/// Exécute la commande sources
pub fn cmd_sources(config: &str) -> Result<()> {
    let registry = SourceRegistry::from_spec(config)?;

    println!("=== Registry {} ({} sources) ===", config, registry.len());
    for group in &registry.groups {
        println!("\n{}", group.name);
        for source in &group.sources {
            println!("  {}", describe_source(source));
        }
    }

    Ok(())
}

/// Ligne descriptive d'une source
fn describe_source(source: &SourceDescriptor) -> String {
    let mut line = format!("{} [{} {}] {}", source.name, source.protocol, source.kind, source.url);
    if let Some(layer) = &source.layer {
        line.push_str(&format!(" (layer {})", layer));
    }
    line
}

fn cache_label(ttl: Duration) -> String {
    if ttl.is_zero() {
        "disabled".to_string()
    } else {
        format!("{}s", ttl.as_secs())
    }
}
