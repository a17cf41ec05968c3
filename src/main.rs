//! huddled - the huddle chat server daemon.

use huddle::config::{self, Config, LogFormat};
use huddle::network::Gateway;
use huddle::state::Hub;
use huddle::{http, metrics};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args().nth(1);
    let (config, load_note) = match config_path.as_deref() {
        Some(path) => (Config::load(path)?, None),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            (Config::load(DEFAULT_CONFIG_PATH)?, None)
        }
        None => (Config::default(), Some(DEFAULT_CONFIG_PATH)),
    };

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.logging.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }

    if let Some(missing) = load_note {
        warn!(path = missing, "No config file found, using defaults");
    }

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("Refusing to start with {} configuration error(s)", errors.len());
    }

    let settings = config.session.settings();
    info!(
        listen = %config.listen.address,
        idle_timeout = ?settings.idle_timeout,
        mailbox_capacity = settings.mailbox_capacity,
        "Starting huddle"
    );

    // Prometheus metrics are optional.
    // metrics_port = 0 or absent disables the HTTP endpoint.
    match config.server.metrics_port {
        Some(port) if port != 0 => {
            metrics::init();
            tokio::spawn(async move {
                http::run_http_server(port).await;
            });
            info!(port, "Prometheus HTTP server started");
        }
        _ => info!("Metrics disabled"),
    }

    let (hub, router) = Hub::new(settings);
    router.spawn();

    let gateway = Gateway::bind(config.listen.address, hub).await?;
    gateway.run().await?;

    Ok(())
}
