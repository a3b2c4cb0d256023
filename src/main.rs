//! CEP temperature services.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client
//!     │ POST / {"cep": "01001000"}
//!     ▼
//!   ┌──────────────────┐  GET /cep/{code}   ┌──────────────────┐
//!   │  service-a       │ ─────────────────▶ │  service-b       │
//!   │  (front, :8080)  │ ◀───────────────── │  (back, :8081)   │
//!   └──────────────────┘   report / error   └────────┬─────────┘
//!                                                    │ GET /ws/{code}/json/
//!                                                    ├──────────────▶ directory API
//!                                                    │ GET /v1/current.json
//!                                                    └──────────────▶ weather API
//!
//!   traceparent travels on every arrow; spans go to Zipkin.
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use cep_weather::config::{self, ProcessEnv};
use cep_weather::lifecycle::{signals, Shutdown};
use cep_weather::observability::{self, logging, metrics};
use cep_weather::{HttpServer, ServiceRole};

#[derive(Parser)]
#[command(name = "cep-weather")]
#[command(about = "CEP to temperature HTTP services", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the client-facing service (service-a)
    Front {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Run the lookup service (service-b)
    Back {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref(), &ProcessEnv)?;

    logging::init_logging(&config.observability);

    let (role, bind_override) = match cli.command {
        Command::Front { bind } => (ServiceRole::Front, bind),
        Command::Back { bind } => (ServiceRole::Back, bind),
    };
    let bind_address = match bind_override {
        Some(addr) => addr.to_string(),
        None => role.bind_address(&config).to_string(),
    };

    tracing::info!(service = %role, version = env!("CARGO_PKG_VERSION"), "cep-weather starting");
    if role == ServiceRole::Back && config.back.weather_api_key.is_none() {
        tracing::warn!("WEATHERAPI_KEY is not set; temperature lookups will fail");
    }

    let (tracer, exporter) = observability::init_tracer(role.service_name(), &config.observability)?;

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(role, &config, tracer)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::shutdown_on_ctrl_c(shutdown));

    server.run(listener, server_shutdown).await?;

    if let Some(exporter) = exporter {
        exporter.shutdown().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
