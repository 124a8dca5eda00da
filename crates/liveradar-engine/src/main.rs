//! Live radar binary.
//!
//! This is the main entry point that wires together the configuration,
//! the map catalog, the HTTP server and the ingestion thread. It runs
//! until Ctrl-C or until the server fails.
//!
//! # Startup Sequence
//!
//! 1. Parse CLI arguments and load `liveradar-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Prompt for missing recording details and save the config
//! 4. Resolve the map projection and background
//! 5. Create the publisher and start the HTTP server
//! 6. Open the browser
//! 7. Start the dedicated ingestion thread
//! 8. Wait for Ctrl-C or server exit

mod browser;
mod error;
mod prompt;
mod steam;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use liveradar_core::config::{DEFAULT_CONFIG_FILE, RadarConfig};
use liveradar_core::ingest::ingest_recording;
use liveradar_core::maps::resolve_map;
use liveradar_core::publisher::SnapshotPublisher;
use liveradar_observer::server::ServerConfig;
use liveradar_observer::state::AppState;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::prompt::Prompter;

/// Command line arguments. Every flag overrides the config file.
#[derive(Parser, Debug)]
#[command(
    name = "liveradar",
    about = "Serve a live 2D radar of a match recording that is still being written"
)]
struct Args {
    /// Configuration file, created after the first interactive run
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Full path of the recording to follow
    #[arg(long)]
    recording: Option<PathBuf>,

    /// Map the match is played on (e.g. `de_mirage`)
    #[arg(long)]
    map: Option<String>,

    /// Background image to use instead of the map's radar image
    #[arg(long)]
    image: Option<PathBuf>,

    /// HTTP port
    #[arg(long)]
    port: Option<u16>,

    /// Never ask questions; fail if no recording is configured
    #[arg(long)]
    no_prompt: bool,

    /// Do not open a browser at startup
    #[arg(long)]
    no_browser: bool,
}

impl Args {
    fn apply(&self, config: &mut RadarConfig) {
        if let Some(path) = &self.recording {
            config.source.set_recording_path(path);
        }
        if let Some(map) = &self.map {
            config.source.map_name.clone_from(map);
        }
        if let Some(image) = &self.image {
            config.source.custom_image = Some(image.clone());
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.no_browser {
            config.server.open_browser = false;
        }
    }
}

/// Application entry point for the radar.
///
/// # Errors
///
/// Returns an error if configuration, prompting, or server startup
/// fails. Ingestion failures after startup are logged instead.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Parse arguments and load configuration.
    let args = Args::parse();
    let mut config = RadarConfig::load_or_default(&args.config).map_err(EngineError::from)?;
    args.apply(&mut config);

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(config = %args.config.display(), "liveradar starting");

    // 3. Ask for whatever is still missing.
    if config.source.recording_path().is_none() && !args.no_prompt {
        let detected = steam::detect_game_dir();
        let stdin = std::io::stdin();
        let mut prompter = Prompter::new(stdin.lock(), std::io::stdout());
        prompt::ask_source(&mut prompter, &mut config.source, detected.as_deref())
            .map_err(EngineError::from)?;
        match config.save(&args.config) {
            Ok(()) => info!(path = %args.config.display(), "Configuration saved"),
            Err(e) => warn!(error = %e, "Could not save configuration"),
        }
    }
    let recording = config
        .source
        .recording_path()
        .ok_or(EngineError::NoRecording)?;
    info!(
        recording = %recording.display(),
        map = config.source.map_name,
        "Recording selected"
    );

    // 4. Resolve the map.
    let catalog = config.map_catalog();
    let resolved = resolve_map(&catalog, &config.source.map_name).map_err(EngineError::from)?;
    info!(
        transform_known = resolved.transform_known,
        background_known = resolved.background_known,
        "Map resolved"
    );

    // 5. Start the HTTP server.
    let publisher = Arc::new(SnapshotPublisher::new());
    let app_state = Arc::new(AppState::new(
        Arc::clone(&publisher),
        &resolved.background,
        config.source.map_name.clone(),
    ));
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let server = liveradar_observer::spawn_observer(&server_config, app_state)
        .await
        .map_err(EngineError::from)?;
    let url = format!("http://localhost:{}", server.addr.port());
    info!(url, "Radar available");

    // 6. Open the browser.
    if config.server.open_browser {
        browser::open_browser(&url);
    }

    // 7. Start ingestion on its own thread. It never returns normally and
    //    is not joined; process exit ends it.
    let projection = resolved.projection;
    let intervals = config.ingest.intervals();
    std::thread::Builder::new()
        .name(String::from("ingest"))
        .spawn(move || {
            match ingest_recording(&recording, &projection, &publisher, &intervals) {
                Ok(never) => match never {},
                Err(e) => error!(
                    error = %e,
                    kind = ?e.kind(),
                    published = publisher.published_count(),
                    "Ingestion terminated, serving the last snapshot"
                ),
            }
        })
        .map_err(|e| EngineError::IngestThread {
            message: e.to_string(),
        })?;

    // 8. Run until interrupted.
    tokio::select! {
        result = server.task => {
            if let Err(e) = result {
                error!(error = %e, "Radar server task failed");
            }
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!(error = %e, "Failed to listen for Ctrl-C");
            }
        }
    }

    info!("liveradar shutdown complete");
    Ok(())
}
