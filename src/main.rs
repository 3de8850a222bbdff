pub mod collector;
pub mod db;
pub mod server;
pub mod version;
pub mod web;

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dotenv::dotenv;
use r2d2_sqlite::SqliteConnectionManager;
use sysinfo::System;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::server::config::ServerConfig;
use crate::version::VERSION;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "routerwatch.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if std::env::args().any(|arg| arg == "--version") {
        println!("routerwatch {VERSION}");
        return Ok(());
    }

    let args = Args::parse();
    dotenv().ok();

    // Config problems are fatal and reported once, before logging is up.
    let config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.log_dir);
    info!("Starting routerwatch, version: {}", VERSION);

    // --- Storage Setup (fatal on failure) ---
    if let Some(parent) = Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let manager = SqliteConnectionManager::file(&config.db_path)
        .with_init(db::apply_connection_pragmas);
    let pool = match r2d2::Pool::builder()
        .max_size(8)
        .connection_timeout(Duration::from_secs(5))
        .build(manager)
    {
        Ok(pool) => pool,
        Err(e) => {
            error!(db_path = %config.db_path, error = %e, "Storage file unusable.");
            return Err(e.into());
        }
    };
    let conn = pool.get()?;
    db::init_db(&conn)?;
    drop(conn);

    // --- Monitoring Capability Check (fatal on failure) ---
    let mut sys = System::new();
    sys.refresh_memory();
    if sys.total_memory() == 0 {
        error!("sysinfo reports zero total memory; host monitoring is unavailable.");
        return Err("system monitoring capability unavailable".into());
    }

    // --- Sampling Scheduler ---
    // The single spawn decision for the process lifetime happens here.
    let collector_config = config.clone();
    let collector_pool = pool.clone();
    std::thread::spawn(move || collector::run(collector_config, collector_pool, sys));

    // --- Axum HTTP Server Setup ---
    let app = web::create_axum_router(pool);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4()?
    } else {
        tokio::net::TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.set_keepalive(true)?;
    socket.bind(addr)?;
    let listener = socket.listen(1024)?;
    info!(address = %addr, "HTTP server listening");

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(Box::new)?;

    Ok(())
}
