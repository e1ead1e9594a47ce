//! Koru daemon — entry point for running a koru node.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use koru_crypto::KeyPair;
use koru_gateway::{HttpGateway, MemoryCache};
use koru_node::{FileLogSource, KoruNode, NodeConfig, NodeDeps, Role};
use koru_registry::{Gossip, Registry};
use koru_rpc::{RpcServer, RpcState};
use koru_types::NetworkId;
use koru_votes::VoteLedger;

#[derive(Parser)]
#[command(name = "koru-daemon", about = "Koru attention-network node daemon")]
struct Cli {
    /// Network to participate in: "main" or "dev".
    /// When a config file is provided, defaults to the file's value.
    #[arg(long, env = "KORU_NETWORK")]
    network: Option<String>,

    /// Base URL of the ledger gateway.
    #[arg(long, env = "KORU_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Bootstrap peer URL for registry gossip.
    #[arg(long, env = "KORU_BOOTSTRAP_URL")]
    bootstrap_url: Option<String>,

    /// Publicly reachable URL of this node's HTTP surface.
    #[arg(long, env = "KORU_ADVERTISE_URL")]
    advertise_url: Option<String>,

    /// Path to the wallet file. Created with a fresh key if missing.
    #[arg(long, env = "KORU_WALLET")]
    wallet: Option<PathBuf>,

    /// Directory for vote batch files.
    #[arg(long, env = "KORU_BUNDLE_DIR")]
    bundle_dir: Option<PathBuf>,

    /// Access log the traffic-log payload is read from.
    #[arg(long, env = "KORU_TRAFFIC_LOG")]
    traffic_log: Option<PathBuf>,

    /// Identifier of the gateway this node attests to.
    #[arg(long, env = "KORU_GATEWAY_ID")]
    gateway_id: Option<String>,

    /// Port for the HTTP surface (service role).
    #[arg(long, env = "KORU_SERVER_PORT")]
    server_port: Option<u16>,

    /// Stake to place on startup if the node holds none.
    #[arg(long, env = "KORU_STAKE")]
    stake: Option<u64>,

    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run a full service node: vote collection, HTTP surface, gossip.
    Service,
    /// Run a witness node.
    Witness {
        /// Observe the gateway directly and submit traffic logs. Without
        /// this flag the witness only audits and proposes slashes.
        #[arg(long)]
        direct: bool,
    },
}

/// Apply CLI/env overrides on top of the base config.
fn layer_config(base: NodeConfig, cli: &Cli) -> anyhow::Result<NodeConfig> {
    let network = match cli.network.as_deref() {
        Some("main") => NetworkId::Main,
        Some("dev") => NetworkId::Dev,
        Some(other) => anyhow::bail!("unknown network {other:?}, expected \"main\" or \"dev\""),
        None => base.network,
    };
    Ok(NodeConfig {
        network,
        gateway_url: cli.gateway_url.clone().unwrap_or(base.gateway_url),
        bootstrap_url: cli.bootstrap_url.clone().unwrap_or(base.bootstrap_url),
        advertise_url: cli.advertise_url.clone().or(base.advertise_url),
        wallet_path: cli.wallet.clone().unwrap_or(base.wallet_path),
        bundle_dir: cli.bundle_dir.clone().unwrap_or(base.bundle_dir),
        traffic_log_path: cli.traffic_log.clone().unwrap_or(base.traffic_log_path),
        gateway_id: cli.gateway_id.clone().unwrap_or(base.gateway_id),
        server_port: cli.server_port.unwrap_or(base.server_port),
        stake_amount: cli.stake.unwrap_or(base.stake_amount),
        ..base
    })
}

/// Load the wallet, generating and persisting a fresh key on first run.
fn load_wallet(path: &std::path::Path) -> anyhow::Result<KeyPair> {
    if path.exists() {
        KeyPair::load(path).with_context(|| format!("loading wallet {}", path.display()))
    } else {
        let keypair = KeyPair::generate();
        keypair
            .save(path)
            .with_context(|| format!("writing new wallet {}", path.display()))?;
        tracing::info!(wallet = %path.display(), "generated new wallet");
        Ok(keypair)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match cli.config {
        Some(ref path) => NodeConfig::from_toml_file(
            path.to_str()
                .context("config path is not valid unicode")?,
        )?,
        None => NodeConfig::default(),
    };
    let config = layer_config(base, &cli)?;
    koru_utils::init_tracing(&config.log_level, &config.log_format);
    if let Some(ref path) = cli.config {
        tracing::info!(config = %path.display(), "loaded config file");
    }

    let role = match cli.command {
        Command::Service => Role::Service,
        Command::Witness { direct: true } => Role::WitnessDirect,
        Command::Witness { direct: false } => Role::WitnessIndirect,
    };

    let keypair = load_wallet(&config.wallet_path)?;
    tracing::info!(
        role = %role,
        network = config.network.as_str(),
        address = %keypair.address(),
        "koru daemon starting"
    );

    let gateway = Arc::new(HttpGateway::new(&config.gateway_url));
    let cache = Arc::new(MemoryCache::new());
    let votes = Arc::new(VoteLedger::open(&config.bundle_dir, keypair.clone())?);
    let registry = Registry::new(cache.clone());
    let gossip = Arc::new(Gossip::new(
        registry.clone(),
        config.bootstrap_url.clone(),
        config.advertise_url.clone(),
        keypair.clone(),
    ));

    let deps = NodeDeps {
        reader: gateway.clone(),
        writer: gateway.clone(),
        cache: cache.clone(),
        keypair,
        votes: votes.clone(),
        gossip,
        log_source: Arc::new(FileLogSource::new(&config.traffic_log_path)),
    };

    let mut node = KoruNode::new(config.clone(), role, deps);
    let shutdown = node.shutdown.clone();

    if role.serves_network() {
        let server = RpcServer::new(
            config.server_port,
            RpcState {
                votes,
                registry,
                reader: gateway,
                cache,
            },
        );
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = server.start(server_shutdown).await {
                tracing::error!(error = %e, "rpc server failed");
            }
        });
    }

    {
        let signals = shutdown.clone();
        tokio::spawn(async move { signals.wait_for_signal().await });
    }

    node.run().await?;
    tracing::info!("koru daemon exited cleanly");
    Ok(())
}
