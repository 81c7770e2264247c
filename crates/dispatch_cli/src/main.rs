use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use dispatch_core::{
    Dispatcher, DispatcherConfig, MatchingStrategyKind, NetworkIndex, PolicyKind, Session,
    TcpTransport, Transport,
};
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TransportKind {
    /// Newline-delimited JSON over a TCP stream
    Tcp,
    /// ZeroMQ REQ socket, one JSON document per frame
    #[cfg(feature = "zmq")]
    Zmq,
}

#[derive(Parser, Debug)]
#[command(
    name = "fleet-dispatcher",
    about = "Real-time fleet dispatcher for an external traffic simulator",
    long_about = "Connects to a running simulator, answers every fleet state update\n\
                  with stop assignments and exits after finalization."
)]
struct Cli {
    /// Network topology (JSON nodes and links)
    #[arg(long)]
    network: PathBuf,

    /// Dispatcher configuration file; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulator address
    #[arg(long, env = "DISPATCHER_ADDRESS", default_value = "127.0.0.1:9001")]
    address: String,

    /// Wire transport to the simulator
    #[arg(long, value_enum, default_value_t = TransportKind::Tcp)]
    transport: TransportKind,

    /// Dispatching policy: matching, relocation, roaming or fifo
    #[arg(long)]
    policy: Option<PolicyKind>,

    /// Matching strategy: best-response or bipartite-matching
    #[arg(long)]
    strategy: Option<MatchingStrategyKind>,

    /// Control interval in seconds
    #[arg(long)]
    control_interval: Option<f64>,

    /// Dwell time at every stop in seconds
    #[arg(long)]
    stop_duration: Option<f64>,

    /// Random seed for relocation exploration and roaming targets
    #[arg(long, env = "DISPATCHER_SEED")]
    seed: Option<u64>,

    /// Relocation decision interval in seconds
    #[arg(long)]
    relocation_interval: Option<f64>,

    /// Roaming diversion interval in seconds
    #[arg(long)]
    roaming_interval: Option<f64>,

    /// Travel-time refresh period in seconds (0 disables it)
    #[arg(long)]
    travel_time_refresh: Option<f64>,
}

impl Cli {
    fn dispatcher_config(&self) -> anyhow::Result<DispatcherConfig> {
        let mut config = match &self.config {
            Some(path) => DispatcherConfig::load(path)
                .with_context(|| format!("reading configuration {}", path.display()))?,
            None => DispatcherConfig::default(),
        };

        if let Some(policy) = self.policy {
            config = config.with_policy(policy);
        }
        if let Some(strategy) = self.strategy {
            config = config.with_strategy(strategy);
        }
        if let Some(secs) = self.control_interval {
            config = config.with_control_interval_secs(secs);
        }
        if let Some(secs) = self.stop_duration {
            config = config.with_stop_duration_secs(secs);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(secs) = self.relocation_interval {
            config.relocation.interval_secs = secs;
        }
        if let Some(secs) = self.roaming_interval {
            config.roaming.interval_secs = secs;
        }
        if let Some(secs) = self.travel_time_refresh {
            config.roaming.travel_time_refresh_secs = secs;
        }

        config.validate().context("invalid dispatcher configuration")?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.dispatcher_config()?;
    let network = NetworkIndex::load(&cli.network)
        .with_context(|| format!("loading network {}", cli.network.display()))?;
    tracing::info!(
        links = network.link_count(),
        nodes = network.node_count(),
        policy = %config.policy.as_str(),
        strategy = %config.strategy,
        "network loaded"
    );

    let dispatcher = Dispatcher::new(network, config).context("building dispatcher")?;
    match cli.transport {
        TransportKind::Tcp => {
            let transport = TcpTransport::connect(cli.address.as_str())
                .with_context(|| format!("connecting to simulator at {}", cli.address))?;
            run_session(transport, dispatcher, &cli.address)
        }
        #[cfg(feature = "zmq")]
        TransportKind::Zmq => {
            let endpoint = format!("tcp://{}", cli.address);
            let transport = dispatch_core::ZmqTransport::connect(&endpoint)
                .with_context(|| format!("connecting to simulator at {endpoint}"))?;
            run_session(transport, dispatcher, &endpoint)
        }
    }
}

fn run_session<T: Transport>(
    transport: T,
    dispatcher: Dispatcher,
    address: &str,
) -> anyhow::Result<()> {
    tracing::info!(address, "connected");
    let summary = Session::new(transport, dispatcher)
        .run()
        .context("dispatcher session failed")?;
    tracing::info!(
        messages = summary.messages,
        iterations = summary.iterations,
        travel_time_queries = summary.travel_time_queries,
        done = summary.statistics.done,
        rejected = summary.statistics.rejected,
        "dispatcher exiting"
    );
    Ok(())
}
