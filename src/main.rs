//! WolfGate - Cluster Coordination Gateway
//!
//! Watches a cluster of storage nodes (liveness + leader discovery),
//! keeps Lamport logical clocks, and serves the gateway HTTP API.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wolfgate::api::HttpServer;
use wolfgate::cluster::{HealthMonitor, LeaderLocator, NodeRegistry, ProbeClient};
use wolfgate::config::WolfGateConfig;
use wolfgate::error::Result;
use wolfgate::scheduler::Coordinator;
use wolfgate::state::CoordinationState;

/// WolfGate - Cluster Coordination Gateway
#[derive(Parser)]
#[command(name = "wolfgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "wolfgate.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway daemon
    Start,

    /// Check gateway status
    Status {
        /// Gateway address to query
        #[arg(short, long, default_value = "localhost:9100")]
        address: String,
    },

    /// Initialize a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "wolfgate.toml")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,

    /// Show effective configuration
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Start => run_start(cli.config).await,
        Commands::Status { address } => run_status(address).await,
        Commands::Init { output } => run_init(output),
        Commands::Validate => run_validate(cli.config),
        Commands::Info => run_info(cli.config),
    }
}

/// Initialize logging
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Start the gateway daemon
async fn run_start(config_path: PathBuf) -> Result<()> {
    tracing::info!("Starting WolfGate...");

    // Load configuration
    let config = match WolfGateConfig::from_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load configuration from {:?}: {}", config_path, e);
            tracing::error!("Please check that the config file exists and is valid TOML");
            return Err(e);
        }
    };
    tracing::info!(
        "Watching {} nodes with {} clock participants",
        config.cluster.nodes.len(),
        config.clocks.participants.len()
    );

    // Shared components
    let registry = Arc::new(NodeRegistry::new(&config.cluster.nodes));
    let state = Arc::new(CoordinationState::new(&config.clocks.participants));
    let probe = ProbeClient::new();

    let monitor = HealthMonitor::new(
        registry.clone(),
        probe.clone(),
        config.cluster.health_path.clone(),
        config.health_probe_timeout(),
    );
    let locator = LeaderLocator::new(
        registry.clone(),
        probe,
        config.cluster.leader_path.clone(),
        config.leader_probe_timeout(),
    );
    let coordinator = Arc::new(Coordinator::new(
        monitor,
        locator,
        state.clone(),
        config.poll_interval(),
        config.tick_interval(),
    ));

    // Start the HTTP API
    let http_server = HttpServer::new(config.api.clone(), config.files.clone(), state, registry)?;
    let http_server_handle = tokio::spawn(async move {
        if let Err(e) = http_server.start().await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    // Run the coordination loops until Ctrl-C
    let runner = Arc::clone(&coordinator);
    let coordinator_handle = tokio::spawn(async move { runner.start().await });

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Received shutdown signal");

    // Let both loops observe the signal before tearing the API down
    coordinator.stop();
    let _ = coordinator_handle.await;
    http_server_handle.abort();

    tracing::info!("WolfGate shutdown complete");
    Ok(())
}

/// Check gateway status
async fn run_status(address: String) -> Result<()> {
    let url = format!("http://{}/status", address);

    match reqwest::get(&url).await {
        Ok(response) => {
            let status: serde_json::Value = response
                .json()
                .await
                .map_err(|e| wolfgate::error::Error::Network(e.to_string()))?;
            println!("{}", serde_json::to_string_pretty(&status).unwrap());
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to get status: {}", e);
            Err(wolfgate::error::Error::Network(e.to_string()))
        }
    }
}

/// Initialize configuration file
fn run_init(output: PathBuf) -> Result<()> {
    let config_content = r#"# WolfGate Configuration
# Generated configuration file

[cluster]
# Storage nodes in priority order: the first node that confirms itself
# as leader wins the discovery scan.
nodes = ["127.0.0.1:8001", "127.0.0.1:8002", "127.0.0.1:8003"]
poll_interval_secs = 5
leader_probe_timeout_secs = 3
health_probe_timeout_secs = 2
health_path = "/health"
leader_path = "/leader"

[clocks]
participants = ["A", "B"]
tick_interval_secs = 3

[api]
enabled = true
bind_address = "0.0.0.0:9100"
cors_enabled = true

[files]
enabled = true
request_timeout_secs = 30
max_upload_bytes = 104857600

[logging]
level = "info"
format = "pretty"
# file = "/var/log/wolfgate/wolfgate.log"
"#;

    std::fs::write(&output, config_content)?;
    println!("Configuration file created: {}", output.display());
    println!("\nEdit the file to list your storage nodes in priority order.");
    println!("Then start with: wolfgate start --config {}", output.display());

    Ok(())
}

/// Validate configuration
fn run_validate(config_path: PathBuf) -> Result<()> {
    match WolfGateConfig::from_file(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!("  Nodes:        {}", config.cluster.nodes.len());
            println!("  Poll:         every {} s", config.cluster.poll_interval_secs);
            println!("  Participants: {}", config.clocks.participants.join(", "));
            println!(
                "  API:          {} ({})",
                config.api.bind_address,
                if config.api.enabled { "enabled" } else { "disabled" }
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            Err(e)
        }
    }
}

/// Show effective configuration
fn run_info(config_path: PathBuf) -> Result<()> {
    let config = WolfGateConfig::from_file(&config_path)?;

    println!("WolfGate Gateway Information");
    println!("============================");
    println!();
    println!("Cluster Configuration:");
    for node in &config.cluster.nodes {
        println!("  Node:           {}", node);
    }
    println!("  Poll Interval:  {} s", config.cluster.poll_interval_secs);
    println!(
        "  Health Probe:   GET {} (timeout {} s)",
        config.cluster.health_path, config.cluster.health_probe_timeout_secs
    );
    println!(
        "  Leader Probe:   GET {} (timeout {} s)",
        config.cluster.leader_path, config.cluster.leader_probe_timeout_secs
    );
    println!();
    println!("Clock Configuration:");
    println!("  Participants:   {}", config.clocks.participants.join(", "));
    println!("  Tick Interval:  {} s", config.clocks.tick_interval_secs);
    println!();
    println!("API Configuration:");
    println!("  Enabled:        {}", config.api.enabled);
    println!("  Bind Address:   {}", config.api.bind_address);
    println!("  CORS:           {}", config.api.cors_enabled);
    println!();
    println!("File Relay:");
    println!("  Enabled:        {}", config.files.enabled);
    println!("  Timeout:        {} s", config.files.request_timeout_secs);
    println!("  Upload Limit:   {} bytes", config.files.max_upload_bytes);

    Ok(())
}
