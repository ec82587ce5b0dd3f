//! Sheep Status server
//!
//! Serves the status page and its JSON API.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use sheep_status::{NotifierConfig, ServiceConfig};

#[derive(Parser, Debug)]
#[command(name = "sheep-status", version, about = "Personal status board for the sheep")]
struct Cli {
    /// Directory holding index.html and the JSON data files
    #[arg(long, env = "SHEEP_BASE_DIR", default_value = ".")]
    base_dir: PathBuf,

    /// Address to listen on
    #[arg(long, env = "SHEEP_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "SHEEP_PORT", default_value_t = 8686)]
    port: u16,

    /// Messaging client used for call-sheep alerts
    #[arg(long, env = "SHEEP_NOTIFY_PROGRAM", default_value = "openclaw")]
    notify_program: String,

    /// Destination channel for call-sheep alerts
    #[arg(long, env = "SHEEP_NOTIFY_TARGET", default_value = "sheep")]
    notify_target: String,

    /// Seconds to wait for the messaging client
    #[arg(long, env = "SHEEP_NOTIFY_TIMEOUT", default_value_t = 10)]
    notify_timeout: u64,
}

impl From<Cli> for ServiceConfig {
    fn from(cli: Cli) -> Self {
        Self {
            base_dir: cli.base_dir,
            host: cli.host,
            port: cli.port,
            notifier: NotifierConfig {
                program: cli.notify_program,
                target: cli.notify_target,
                timeout: Duration::from_secs(cli.notify_timeout),
            },
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServiceConfig::from(Cli::parse());
    sheep_status::server::serve(&config, shutdown_signal())
        .await
        .with_context(|| format!("failed to serve on {}", config.bind_addr()))?;

    Ok(())
}
