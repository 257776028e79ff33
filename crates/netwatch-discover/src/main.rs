//! CLI entry point for the netwatch presence scanner.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use netwatch_discover::config::{load_config, NetwatchConfig};
use netwatch_discover::scanner::NmapScanner;
use netwatch_discover::server::{self, ScanResponse};
use netwatch_discover::service::ScanService;

#[derive(Parser)]
#[command(name = "netwatch")]
#[command(about = "Track which hosts are present on a local network")]
struct Cli {
    /// Initial scan target (CIDR notation, e.g., 192.168.1.0/24).
    #[arg(short, long)]
    range: Option<String>,

    /// Address for the HTTP server (e.g., 0.0.0.0:5000).
    #[arg(short, long)]
    bind: Option<String>,

    /// Run a single scan, print the result as JSON and exit.
    #[arg(long)]
    once: bool,

    /// Config file prefix (default: netwatch).
    #[arg(short, long, default_value = "netwatch")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = apply_overrides(load_config(&cli.config)?, &cli);

    let scanner = NmapScanner::from_config(&config);
    match scanner.verify_installation().await {
        Ok(version) => {
            let first_line = version.lines().next().unwrap_or_default();
            tracing::info!(nmap_version = %first_line.trim(), "Nmap verified");
        }
        Err(e) => tracing::warn!(error = %e, "Nmap unavailable, scans will report no hosts"),
    }

    let service = Arc::new(ScanService::new(Arc::new(scanner), config.default_range.clone()));

    if cli.once {
        let outcome = service.scan(None).await;
        let response = ScanResponse::from(outcome);
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        server::serve(service, &config.bind_addr).await?;
    }

    Ok(())
}

fn apply_overrides(mut config: NetwatchConfig, cli: &Cli) -> NetwatchConfig {
    if let Some(range) = &cli.range {
        config.default_range = range.clone();
    }
    if let Some(bind) = &cli.bind {
        config.bind_addr = bind.clone();
    }
    config
}
