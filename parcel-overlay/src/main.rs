//! Point d'entrée CLI pour parcel-overlay

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Superposer un lot rural aux bases environnementales et réglementaires
#[derive(Parser)]
#[command(name = "parcel-overlay")]
#[command(author, version)]
#[command(about = "Superposer un lot rural aux services géographiques environnementaux (ArcGIS REST, WFS)")]
#[command(long_about = "Interroge en parallèle les services configurés, intersecte leurs géométries avec le lot et produit un rapport (surfaces, pourcentages, croisements) et des couches GeoJSON.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Analyze(args) => {
            info!(parcel = %args.parcel.display(), config = %args.config, "Analyse du lot");
            cli::cmd_analyze(&args).await?;
        }
        Commands::Sources { config } => {
            cli::cmd_sources(&config)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
