use std::net::IpAddr;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use coordinator_dashboard::config::{ServerConfig, ENV_BIND, ENV_HTTP_PORT};

/// API-proxy server for the coordinator dashboard.
#[derive(Debug, Parser)]
#[command(name = "coordinator-dashboard", version)]
struct Args {
    /// Address to bind (env: DASHBOARD_BIND, default 0.0.0.0)
    #[arg(long)]
    bind: Option<IpAddr>,
    /// HTTP port (env: DASHBOARD_HTTP_PORT, default 3000)
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let cfg = ServerConfig::resolve(args.bind, args.http_port);
    info!(
        target: "startup",
        "resolved configuration: bind={} ({}), http_port={} ({})",
        cfg.bind_addr, ENV_BIND, cfg.http_port, ENV_HTTP_PORT
    );

    coordinator_dashboard::server::run_with_config(cfg).await
}
