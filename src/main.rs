//! Connection pool probe.
//!
//! Connects to a set of addresses through the pool and reports the alive
//! set on every heartbeat interval until interrupted.
//!
//! ```text
//! conn-pool-probe --config probe.toml --address 10.0.0.5:50051
//! ```

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Parser;
use tokio::time;

use conn_pool::config::{load_config, Config, TargetConfig};
use conn_pool::observability::{logging, metrics};
use conn_pool::{Pool, PoolError};

#[derive(Parser)]
#[command(name = "conn-pool-probe")]
#[command(about = "Keep liveness-tracked connections to a set of services", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra address to track (host:port). May be repeated.
    #[arg(short, long = "address")]
    addresses: Vec<String>,

    /// Always dial fresh connections on startup.
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("conn-pool-probe v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let addresses: BTreeSet<String> = config
        .targets
        .iter()
        .map(TargetConfig::address)
        .chain(cli.addresses.iter().cloned())
        .collect();
    if addresses.is_empty() {
        return Err("no addresses configured; pass --address or add [[targets]]".into());
    }

    let pool = Pool::tcp(config.pool.clone(), config.dial.clone());

    for address in &addresses {
        let result = if cli.force {
            pool.dial(address).await
        } else {
            pool.get_conn(address).await
        };
        report(address, result.map(|_| ()));
    }

    let mut ticker = time::interval(config.pool.heartbeat_interval());
    ticker.tick().await;

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let alives = pool.alives();
                tracing::info!(alive = alives.len(), total = addresses.len(), ?alives, "Alive set");

                for address in addresses.iter().filter(|a| !pool.is_alive(a)) {
                    report(address, pool.get_conn(address).await.map(|_| ()));
                }
            }
            _ = &mut interrupt => {
                tracing::info!("Interrupt received, shutting down");
                break;
            }
        }
    }

    pool.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn report(address: &str, result: Result<(), PoolError>) {
    match result {
        Ok(()) => tracing::info!(address = %address, "Connection ready"),
        Err(PoolError::NotReady { .. }) => tracing::info!(address = %address, "Connection not ready yet"),
        Err(e) => tracing::warn!(address = %address, error = %e, "Connection failed"),
    }
}
