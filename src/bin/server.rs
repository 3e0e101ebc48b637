//! netkv Server Binary
//!
//! Starts the cache daemon.

use std::fs::OpenOptions;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use netkv::{Cache, Config, FileCache, MemoryCache, Server};

/// netkv Server
#[derive(Parser, Debug)]
#[command(name = "netkv-server")]
#[command(about = "TTL-bounded network key/value cache daemon")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1")]
    address: String,

    /// Port to listen on
    #[arg(short, long, default_value = "2392")]
    port: u16,

    /// Directory to store the cache in
    #[arg(short, long, default_value = "./cache")]
    cache_dir: String,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value = "60")]
    timeout: u64,

    /// Logfile to write to (stdout when omitted)
    #[arg(long)]
    logfile: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    loglevel: String,

    /// Use an in-memory cache instead of the file back-end
    #[arg(short, long)]
    memory: bool,

    /// Snapshot file to save to and restore from
    #[arg(long)]
    init_file: Option<String>,

    /// Snapshot save period in milliseconds
    #[arg(long, default_value = "500")]
    save_period: u64,

    /// Save a snapshot and exit cleanly on the first interrupt
    #[arg(long)]
    save_on_interrupt: bool,
}

fn main() {
    let args = Args::parse();

    init_logging(&args);

    tracing::info!("netkv server v{}", netkv::VERSION);

    let mut builder = Config::builder()
        .address(&args.address)
        .port(args.port)
        .cache_dir(&args.cache_dir)
        .timeout(Duration::from_secs(args.timeout))
        .save_period(Duration::from_millis(args.save_period))
        .save_on_interrupt(args.save_on_interrupt);
    if let Some(init_file) = &args.init_file {
        builder = builder.init_file(init_file);
    }
    let config = builder.build();

    let cache: Arc<dyn Cache> = if args.memory {
        tracing::info!("Using in-memory cache");
        Arc::new(MemoryCache::new())
    } else {
        tracing::info!("Using file cache in {}", config.cache_dir.display());
        Arc::new(FileCache::new(&config.cache_dir))
    };

    let server = Server::new(config, cache);
    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.loglevel.clone()));

    match &args.logfile {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .unwrap_or_else(|e| {
                    eprintln!("Failed to open logfile {}: {}", path, e);
                    std::process::exit(1);
                });
            fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}
