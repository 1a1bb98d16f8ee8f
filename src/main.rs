use anyhow::{Context, Result};
use chart_ingest::aggregation::{AggregationEngine, EnergyBand};
use chart_ingest::catalog_store::{CatalogStore, SqliteCatalogStore};
use chart_ingest::config::{AppConfig, CliConfig, FileConfig};
use chart_ingest::ingestion::{CycleReport, IngestionCoordinator};
use chart_ingest::upstream::{LastFmClient, SpotifyClient};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "chart-ingest", version)]
struct CliArgs {
    /// Directory holding the catalog database and the default report file.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to a TOML config file. Its values override the CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Spotify playlist to ingest.
    #[clap(long)]
    pub playlist_id: Option<String>,

    #[clap(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    pub spotify_client_id: Option<String>,

    #[clap(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: Option<String>,

    #[clap(long, env = "LASTFM_API_KEY", hide_env_values = true)]
    pub lastfm_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingests the next batch of chart tracks.
    Ingest {
        /// Maximum number of tracks per cycle.
        #[clap(long)]
        batch_size: Option<usize>,

        /// Keep running cycles until the whole chart is stored.
        #[clap(long)]
        until_complete: bool,

        /// Stop after this many cycles. Implies --until-complete.
        #[clap(long)]
        max_cycles: Option<usize>,
    },

    /// Prints the summary statistics and writes them to the report file.
    Report {
        /// Where to write the report.
        #[clap(long, value_parser = parse_path)]
        output: Option<PathBuf>,
    },

    /// Exports the chart rendering rows as JSON.
    Export {
        /// Output file, stdout when omitted.
        #[clap(long, value_parser = parse_path)]
        output: Option<PathBuf>,

        /// Number of artists in the leaderboard rows.
        #[clap(long)]
        top: Option<usize>,
    },

    /// Prints the artist leaderboard and the energy distribution.
    Stats {
        /// Number of artists to show.
        #[clap(long)]
        top: Option<usize>,
    },
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        let mut cli = CliConfig {
            db_dir: self.db_dir.clone(),
            playlist_id: self.playlist_id.clone(),
            spotify_client_id: self.spotify_client_id.clone(),
            spotify_client_secret: self.spotify_client_secret.clone(),
            lastfm_api_key: self.lastfm_api_key.clone(),
            ..Default::default()
        };
        match &self.command {
            Command::Ingest { batch_size, .. } => cli.batch_size = *batch_size,
            Command::Report { output } => cli.report_path = output.clone(),
            Command::Export { top, .. } | Command::Stats { top } => cli.top_artists_limit = *top,
        }
        cli
    }
}

fn log_cycle(report: &CycleReport) {
    info!(
        "Window [{}, {}) of {}: {} inserted, {} duplicates, {} skipped, {} enrichment failures, {} without listening data",
        report.start,
        report.end,
        report.fetched,
        report.inserted,
        report.duplicates,
        report.skipped_without_artist,
        report.enrichment_failures,
        report.enrichment_missing
    );
}

fn run_ingest(
    config: &AppConfig,
    store: Arc<dyn CatalogStore>,
    until_complete: bool,
    max_cycles: Option<usize>,
) -> Result<()> {
    let spotify = config.spotify_credentials()?;
    let catalog = Arc::new(SpotifyClient::new(
        &spotify.client_id,
        &spotify.client_secret,
        &config.playlist_id,
    )?);
    let popularity = Arc::new(LastFmClient::new(config.lastfm_api_key()?)?);
    let coordinator = IngestionCoordinator::new(store.clone(), catalog, popularity);

    if !until_complete && max_cycles.is_none() {
        let report = coordinator.run_cycle(config.batch_size)?;
        log_cycle(&report);
        return Ok(());
    }

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = stop.clone();
    ctrlc::set_handler(move || {
        info!("Interrupt received, finishing current cycle...");
        stop_handler.store(true, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl-C handler")?;

    let reports = coordinator.run_until_complete(config.batch_size, max_cycles, &stop)?;
    for report in &reports {
        log_cycle(report);
    }
    let inserted: usize = reports.iter().map(|r| r.inserted).sum();
    info!(
        "Ingestion finished after {} cycles: {} songs inserted, {} stored in total",
        reports.len(),
        inserted,
        store.current_song_count()?
    );
    Ok(())
}

fn run_stats(engine: &AggregationEngine, top: usize) -> Result<()> {
    println!("Top {} artists by number of chart songs:", top);
    for (rank, row) in engine.top_artists(top)?.iter().enumerate() {
        println!("{:>3}. {} ({})", rank + 1, row.artist_name, row.song_count);
    }

    let bands = engine.energy_bands()?;
    println!();
    println!("Energy distribution over {} songs:", bands.total());
    for band in EnergyBand::ALL {
        println!("  {}: {}", band.label(), bands.get(band));
    }
    Ok(())
}

fn run(cli_args: CliArgs) -> Result<()> {
    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let db_path = config.catalog_db_path();
    info!("Opening SQLite catalog database at {:?}...", db_path);
    let store: Arc<dyn CatalogStore> = Arc::new(SqliteCatalogStore::new(&db_path)?);

    match cli_args.command {
        Command::Ingest {
            until_complete,
            max_cycles,
            ..
        } => run_ingest(&config, store, until_complete, max_cycles),
        Command::Report { .. } => {
            let report = AggregationEngine::new(store).write_report(&config.report_path)?;
            print!("{}", report);
            Ok(())
        }
        Command::Export { output, .. } => {
            let data = AggregationEngine::new(store).presentation_data(config.top_artists_limit)?;
            let json = serde_json::to_string_pretty(&data)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write export to {:?}", path))?;
                    info!("Exported presentation rows to {:?}", path);
                }
                None => println!("{}", json),
            }
            Ok(())
        }
        Command::Stats { .. } => {
            run_stats(&AggregationEngine::new(store), config.top_artists_limit)
        }
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    if let Err(err) = run(cli_args) {
        error!("{:#}", err);
        return Err(err);
    }
    Ok(())
}
