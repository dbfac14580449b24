//! Controller service entry point

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use controller::config::{LeaderConfig, LogConfig, StorageConfig, StoreConfig};
use controller::{Controller, ControllerConfig};

/// Controller - cluster topology metadata store
#[derive(Parser, Debug)]
#[command(name = "controller")]
#[command(about = "Topology controller for a sharded key-value database")]
struct Args {
    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Start as a follower (no standalone leadership)
    #[arg(long)]
    follower: bool,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Command line values as a config layer; unset fields are left empty
    fn overrides(&self) -> ControllerConfig {
        ControllerConfig {
            store: StoreConfig {
                event_channel_capacity: 0,
                commit_timeout_ms: 0,
            },
            storage: StorageConfig {
                data_dir: self.data_dir.clone().unwrap_or_default(),
            },
            leader: LeaderConfig {
                standalone: !self.follower,
            },
            log: LogConfig {
                level: self.log_level.clone().unwrap_or_default(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ControllerConfig::from_file(path)?,
        None => ControllerConfig::default(),
    };
    config.merge(args.overrides());

    // Initialize logging
    let level = match config.log.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting controller...");
    info!("  Data dir: {:?}", config.storage.data_dir);
    info!("  Standalone leader: {}", config.leader.standalone);
    info!("  Commit timeout: {:?}", config.store.commit_timeout());

    let controller = Controller::new(config).await?;
    let _reconciler = controller.start_event_logger();

    let store = controller.store();
    if store.is_leader() {
        for namespace in store.list_namespaces().await? {
            for cluster in store.list_clusters(&namespace).await? {
                let topo = store.get_cluster(&namespace, &cluster).await?;
                info!(
                    "Cluster {}/{}: version {}, {} shards, {} nodes",
                    namespace,
                    cluster,
                    topo.version,
                    topo.shards.len(),
                    topo.node_count()
                );
            }
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down controller");

    Ok(())
}
