use std::sync::Arc;

use launchpad::api::{AppState, Server};
use launchpad::batch::{BatchOrchestrator, BatchTracker};
use launchpad::chain::{ChainGateway, RpcChainGateway};
use launchpad::config::Config;
use launchpad::launch::{HttpLaunchService, LaunchInvoker, LaunchService};
use launchpad::store::{ResultStore, SqliteResultStore};
use launchpad::wallet::{FundingSigner, KeypairSigner};
use tracing::info;

/// The main entry point for the launch service.
///
/// Initializes logging, loads configuration, opens the long-lived RPC and
/// store handles, wires the orchestrator, and serves the HTTP API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load("config/default.toml")?;
    info!("launchpad starting with config: {:?}", config);

    // One RPC client per process, reused across batches.
    let gateway: Arc<dyn ChainGateway> = Arc::new(RpcChainGateway::new(&config.gateway));

    // The treasury signer is the only holder of the funding key.
    let signer: Arc<dyn FundingSigner> =
        Arc::new(KeypairSigner::from_file(&config.funding.keypair_path)?);
    info!("funding account: {}", signer.pubkey());

    let service: Arc<dyn LaunchService> = Arc::new(HttpLaunchService::new(&config.launch));
    let invoker = LaunchInvoker::from_config(service, &config.launch);

    let store: Arc<dyn ResultStore> =
        Arc::new(SqliteResultStore::connect(&config.store.url).await?);

    let tracker = BatchTracker::new();
    let orchestrator = Arc::new(BatchOrchestrator::new(
        gateway,
        signer,
        invoker,
        Arc::clone(&store),
        tracker.clone(),
        config.batch.clone(),
        config.store.persist_secret_keys,
    ));

    let state = AppState {
        orchestrator,
        tracker,
        store,
    };
    let server = Server::new(config.api.clone(), state);
    server.start().await?;

    Ok(())
}
