//! Clinic binary — thin CLI shell over the [`clinic_server`] library crate.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use tracing::{error, info};

use clinic_server::types::AppContext;
use clinic_server::{build_lookup, build_router, doctor, load_config, CONFIG_FILE};

// ---------------------------------------------------------------------------
// CLI definition (clap derive)
// ---------------------------------------------------------------------------

/// Clinic front desk — doctor search page with phone capture.
#[derive(Parser)]
#[command(name = "clinic", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: ./clinic.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config and PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Bind to 0.0.0.0 instead of the configured address
    #[arg(long)]
    bind_all: bool,

    /// Directory served under /static
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check configuration and static assets
    Doctor,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Graceful shutdown signal
// ---------------------------------------------------------------------------

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    error!(error = %e, "Failed to register SIGTERM handler");
                    let _ = ctrl_c.await;
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received SIGINT, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("Received Ctrl+C, shutting down...");
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    // Initialize structured logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("clinic=info,clinic_server=info,clinic_core=info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

    if let Some(command) = &cli.command {
        match command {
            Commands::Doctor => std::process::exit(doctor::run_doctor(&config_path)),
            Commands::Completions { shell } => {
                clap_complete::generate(*shell, &mut Cli::command(), "clinic", &mut std::io::stdout());
                return;
            }
        }
    }

    let mut config = load_config(&config_path).unwrap_or_else(|e| {
        error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    // Precedence: CLI flag > PORT > config file
    if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
        config.port = port;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.bind_all {
        config.bind = "0.0.0.0".to_string();
    }
    if let Some(dir) = cli.static_dir {
        config.static_dir = dir;
    }

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap_or_else(|e| {
        error!(addr = addr.as_str(), error = %e, "Could not bind");
        std::process::exit(1);
    });

    let lookup = build_lookup(&config);
    info!(
        geoip = lookup.name(),
        static_dir = %config.static_dir.display(),
        initial_country = config.initial_country.as_str(),
        "Configured"
    );

    let app = build_router(AppContext::new(config, lookup));

    info!(addr = addr.as_str(), "http://{addr}/doctors");
    // Peer addresses feed the geo-IP lookup when no proxy header is present
    let service = app.into_make_service_with_connect_info::<SocketAddr>();
    if let Err(e) = axum::serve(listener, service).with_graceful_shutdown(shutdown_signal()).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
