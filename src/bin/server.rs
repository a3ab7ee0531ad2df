//! l1data Server Binary
//!
//! Reads the settings file, loads the access lists and serves the store.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use l1data::access::AccessControl;
use l1data::network::Server;
use l1data::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// l1data Server
#[derive(Parser, Debug)]
#[command(name = "l1data-server")]
#[command(about = "In-memory key-value store with record links")]
#[command(version)]
struct Args {
    /// Settings file (native database format)
    #[arg(short, long, default_value = "config/settings.l1db")]
    settings: PathBuf,

    /// Listen host, overrides the settings file
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides the settings file
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory for save/load file names, overrides the settings file
    #[arg(short, long)]
    database_root: Option<PathBuf>,

    /// Initial number of record slots
    #[arg(short, long)]
    capacity: Option<usize>,

    /// Upper bound for table growth
    #[arg(long)]
    max_capacity: Option<usize>,

    /// Require login before any other command
    #[arg(long)]
    require_auth: bool,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Users file
    #[arg(long, default_value = "config/users.config")]
    users: PathBuf,

    /// Whitelist file
    #[arg(long, default_value = "config/whitelist.config")]
    whitelist: PathBuf,

    /// Blacklist file
    #[arg(long, default_value = "config/blacklist.config")]
    blacklist: PathBuf,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,l1data=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("l1data Server v{}", l1data::VERSION);
    tracing::info!("Settings file: {}", args.settings.display());

    let config = match Config::from_settings(&args.settings) {
        Ok(config) => apply_overrides(config, &args),
        Err(e) => {
            tracing::error!("Failed to read settings: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Listen address: {}", config.listen_addr());
    tracing::info!("Database root: {}", config.database_root.display());

    let engine = match Engine::new(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to allocate store: {}", e);
            std::process::exit(1);
        }
    };

    let access = match AccessControl::open(&config) {
        Ok(a) => Arc::new(a),
        Err(e) => {
            tracing::error!("Failed to load access files: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config, engine, access) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

fn apply_overrides(config: Config, args: &Args) -> Config {
    let mut builder = Config::builder()
        .host(args.host.clone().unwrap_or(config.host))
        .port(args.port.unwrap_or(config.port))
        .database_root(args.database_root.clone().unwrap_or(config.database_root))
        .capacity(args.capacity.unwrap_or(config.capacity))
        .require_auth(config.require_auth || args.require_auth)
        .max_connections(args.max_connections)
        .users_file(&args.users)
        .whitelist_file(&args.whitelist)
        .blacklist_file(&args.blacklist);

    if let Some(max) = args.max_capacity {
        builder = builder.max_capacity(max);
    }
    builder.build()
}
