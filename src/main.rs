//! Library Search server
//!
//! This is the main entry point for the application.

use anyhow::Result;
use library_search::{
    config::Settings,
    engines::BackendLoader,
    metrics::Metrics,
    network::HttpClient,
    search::{Aggregator, LibrarySearch},
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            "-V" | "--version" => {
                println!("library-search {}", library_search::VERSION);
                return Ok(());
            }
            _ => {}
        }
    }

    // Load configuration before logging so the filter can come from it
    let settings = load_settings()?;

    let filter = if settings.general.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&settings.general.log_filter))
    };
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting Library Search v{}", library_search::VERSION);
    info!("Loaded configuration for instance: {}", settings.general.instance_name);

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!("HTTP client initialized");

    // Load backends
    let registry = BackendLoader::load(&settings)?;
    info!("Loaded backends: {:?}", registry.names());

    let settings = Arc::new(settings);
    let metrics = Arc::new(Metrics::new());
    let aggregator = Aggregator::new(client, Arc::new(registry), metrics.clone());
    let search = Arc::new(LibrarySearch::new(settings.clone(), aggregator, metrics));

    let app = create_router(AppState::new(settings.clone(), search));

    // Bind address
    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Load settings from file or use defaults
fn load_settings() -> Result<Settings> {
    if let Ok(path) = std::env::var("LIBRARYSEARCH_SETTINGS_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            let mut settings = Settings::from_file(&path)?;
            settings.merge_env();
            return Ok(settings);
        }
        eprintln!("Settings file {} not found, searching defaults", path.display());
    }

    let paths = [
        Some(PathBuf::from("settings.yml")),
        Some(PathBuf::from("config/settings.yml")),
        Some(PathBuf::from("/etc/library-search/settings.yml")),
        dirs::config_dir().map(|p| p.join("library-search/settings.yml")),
    ];

    for path in paths.iter().flatten() {
        if path.exists() {
            let mut settings = Settings::from_file(path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    let mut settings = Settings::default();
    settings.merge_env();
    Ok(settings)
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
Library Search v{}
Concurrent library catalogue search aggregator

USAGE:
    library-search [OPTIONS]

OPTIONS:
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    LIBRARYSEARCH_SETTINGS_PATH    Path to settings.yml
    LIBRARYSEARCH_DEBUG            Enable debug logging (true/false)
    LIBRARYSEARCH_LOG              Log filter, e.g. "info,library_search=debug"
    LIBRARYSEARCH_PORT             Server port
    LIBRARYSEARCH_BIND_ADDRESS     Bind address
    LIBRARYSEARCH_DEFAULT_TENANT   Tenant used for unmapped hosts
"#,
        library_search::VERSION
    );
}
