//! Print the node summary of a local lightning daemon
//!
//! Reads the data directory from `LIGHTNING_DIR` (default
//! `/home/bitcoind/.lightning`) and calls `getinfo` on its socket. If the
//! daemon is not up yet, the call waits for it.
//!
//! Run with: LIGHTNING_DIR=$HOME/.lightning cargo run --example getinfo

use lnrpc::core::ObservabilityConfig;
use lnrpc::ClientBuilder;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct NodeInfo {
    id: String,
    #[serde(default)]
    alias: Option<String>,
    #[serde(default)]
    version: Option<String>,
    blockheight: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let lightning_dir = std::env::var("LIGHTNING_DIR")
        .unwrap_or_else(|_| "/home/bitcoind/.lightning".to_string());

    // Local logs only; set OTEL_EXPORTER_OTLP_ENDPOINT and use
    // ObservabilityConfig::new to export traces as well
    let client = ClientBuilder::from_lightning_dir(&lightning_dir)
        .with_observability(ObservabilityConfig::logs_only("lnrpc-getinfo"))
        .build()?;

    tracing::info!(lightning_dir = %lightning_dir, "Waiting for lightning daemon");

    let info: NodeInfo = client.call("getinfo", ()).await?;
    println!("Node id:      {}", info.id);
    if let Some(alias) = &info.alias {
        println!("Alias:        {}", alias);
    }
    if let Some(version) = &info.version {
        println!("Version:      {}", version);
    }
    println!("Block height: {}", info.blockheight);

    let funds = client.listfunds().await?;
    println!("\nFunds:\n{}", serde_json::to_string_pretty(&funds)?);

    client.shutdown().await;
    lnrpc::core::shutdown_observability();
    Ok(())
}
