mod catalog;
mod cli;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tether_config::TetherConfig;
use tether_device::DeviceStore;
use tether_pty::PtyBridge;
use tether_relay::{ManagerConfig, PairingService, RelayManager};

use crate::catalog::ConfigCatalog;
use crate::cli::CliCommand;

fn init_logging(directive: Option<&str>) {
    let log_directive = directive.unwrap_or("tether=info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "tether=info".parse().unwrap()),
            ),
        )
        .init();
}

fn load_config(args: &cli::Args) -> TetherConfig {
    let result = match &args.config {
        Some(path) => tether_config::load_from_path(path),
        None => tether_config::load_default(),
    };
    result.unwrap_or_else(|e| {
        warn!("failed to load config: {e}; using defaults");
        TetherConfig::default()
    })
}

fn open_store() -> DeviceStore {
    let dir = DeviceStore::default_dir().unwrap_or_else(|e| {
        eprintln!("cannot locate config directory: {e}");
        std::process::exit(1);
    });
    DeviceStore::new(dir)
}

#[tokio::main]
async fn main() {
    let args = cli::parse();
    init_logging(args.log_level.as_deref());

    let config = load_config(&args);
    let store = open_store();

    match args.command.unwrap_or(CliCommand::Run) {
        CliCommand::Run => run_daemon(config, store).await,
        CliCommand::Pair => pair(config, store).await,
        CliCommand::Rename { name } => match store.set_device_name(&name) {
            Ok(identity) => println!("{} is now named '{}'", identity.device_id, identity.device_name),
            Err(e) => {
                eprintln!("rename failed: {e}");
                std::process::exit(1);
            }
        },
        CliCommand::ResetId => match store.reset_device_id() {
            Ok(identity) => println!("new device id: {}", identity.device_id),
            Err(e) => {
                eprintln!("reset failed: {e}");
                std::process::exit(1);
            }
        },
        CliCommand::Status => status(config, store),
    }
}

async fn run_daemon(config: TetherConfig, store: DeviceStore) {
    let identity = match store.load_or_create() {
        Ok(identity) => identity,
        Err(e) => {
            error!("cannot load device identity: {e}");
            std::process::exit(1);
        }
    };
    info!(
        device_id = %identity.device_id,
        device_name = %identity.device_name,
        workspaces = config.workspaces.len(),
        "starting tether daemon"
    );

    let catalog = Arc::new(ConfigCatalog::new(&config.workspaces));
    let (bridge_tx, bridge_rx) = mpsc::unbounded_channel();
    let bridge = Arc::new(PtyBridge::new(bridge_tx));

    let relay_enabled = config.relay.enabled;
    let manager_config = ManagerConfig::new(config.relay, identity);
    let handle = RelayManager::spawn(manager_config, catalog, bridge, bridge_rx);

    // Surface status changes in the log; a UI would subscribe the same way.
    let mut status_rx = handle.subscribe_status();
    tokio::spawn(async move {
        loop {
            match status_rx.recv().await {
                Ok(snapshot) => info!(
                    status = ?snapshot.status,
                    mobiles = snapshot.connected_mobiles.len(),
                    sessions = snapshot.active_sessions.len(),
                    "relay status changed"
                ),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "status updates lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    if relay_enabled {
        if !handle.connect().await {
            warn!("initial relay connect failed; will retry on reconnect events");
        }
    } else {
        info!("relay is disabled; enable it in config.toml to accept mobile connections");
    }

    tokio::signal::ctrl_c().await.ok();
    info!("shutting down");
    handle.shutdown();
    // Give the manager a beat to close sessions and the socket.
    tokio::time::sleep(Duration::from_millis(200)).await;
}

async fn pair(config: TetherConfig, store: DeviceStore) {
    let identity = match store.load_or_create() {
        Ok(identity) => identity,
        Err(e) => {
            eprintln!("cannot load device identity: {e}");
            std::process::exit(1);
        }
    };

    let service = PairingService::new();
    match service
        .create_pin(&config.relay.relay_url, &identity, &store)
        .await
    {
        Some(pin) => {
            println!("Pairing PIN: {}", pin.value);
            println!("Enter it on your mobile device before it expires.");
        }
        None => {
            eprintln!("could not obtain a pairing PIN from the relay");
            std::process::exit(1);
        }
    }
}

fn status(config: TetherConfig, store: DeviceStore) {
    match store.identity() {
        Ok(Some(identity)) => {
            println!("device id:    {}", identity.device_id);
            println!("device name:  {}", identity.device_name);
            println!("created:      {}", identity.created_at);
        }
        Ok(None) => println!("no device identity yet (run the daemon or `tether pair`)"),
        Err(e) => {
            eprintln!("cannot read device identity: {e}");
            std::process::exit(1);
        }
    }
    println!("relay url:    {}", config.relay.relay_url);
    println!("enabled:      {}", config.relay.enabled);
    println!("auto-connect: {}", config.relay.auto_connect);
    if let Some(pin) = store.last_pin() {
        println!("last pin:     {} (expires at {})", pin.value, pin.expires_at);
    }
}
