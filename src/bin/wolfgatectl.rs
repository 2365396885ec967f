//! WolfGateCtl - Command line tool for observing WolfGate clusters
//!
//! Usage:
//!   wolfgatectl nodes          - Show cluster node liveness
//!   wolfgatectl status         - Show gateway status
//!   wolfgatectl leader         - Show the discovered leader
//!   wolfgatectl clocks         - Show logical clock counters
//!   wolfgatectl send A B       - Apply a simulated message event
//!   wolfgatectl stats          - Show storage usage on the leader
//!   wolfgatectl watch          - Live cluster view (Ctrl+C to exit)

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Deserialize;

/// WolfGate Observation Tool
#[derive(Parser)]
#[command(name = "wolfgatectl")]
#[command(about = "Observe and exercise a WolfGate gateway", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "/etc/wolfgate/config.toml")]
    config: PathBuf,

    /// API endpoint to connect to (overrides config)
    #[arg(short, long)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show gateway status
    Status,
    /// List registered nodes and their liveness
    Nodes,
    /// Show the discovered leader
    Leader,
    /// Show logical clock counters
    Clocks,
    /// Apply a simulated message event between two participants
    Send {
        /// Sending participant
        from: String,
        /// Receiving participant
        to: String,
    },
    /// Show storage usage reported by the leader
    Stats,
    /// Live cluster view (updates every second, Ctrl+C to exit)
    Watch,
}

// ============ API Response Types ============

#[derive(Debug, Default, Deserialize)]
struct LeaderApi {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusApi {
    #[serde(default)]
    version: String,
    #[serde(default)]
    uptime_secs: u64,
    #[serde(default)]
    nodes_total: usize,
    #[serde(default)]
    nodes_alive: Option<usize>,
    #[serde(default)]
    leader: LeaderApi,
    #[serde(default)]
    participants: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ClusterApi {
    #[serde(default)]
    leader: LeaderApi,
    #[serde(default)]
    probed_at: Option<String>,
    #[serde(default)]
    nodes: Vec<ClusterNodeApi>,
}

#[derive(Debug, Deserialize)]
struct ClusterNodeApi {
    #[serde(default)]
    address: String,
    #[serde(default)]
    priority: usize,
    #[serde(default)]
    alive: Option<bool>,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct SendApi {
    #[serde(default)]
    from: String,
    #[serde(default)]
    to: String,
    #[serde(default)]
    counter: u64,
}

#[derive(Debug, Deserialize)]
struct StorageStatsApi {
    #[serde(default, rename = "totalFiles")]
    total_files: u64,
    #[serde(default, rename = "totalBytes")]
    total_bytes: u64,
    #[serde(default, rename = "quotaBytes")]
    quota_bytes: u64,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    code: String,
}

// ============ Config ============

#[derive(Debug, Deserialize)]
struct Config {
    #[serde(default)]
    api: ApiConfig,
}

#[derive(Debug, Deserialize, Default)]
struct ApiConfig {
    #[serde(default = "default_api_bind")]
    bind_address: String,
}

fn default_api_bind() -> String {
    "0.0.0.0:9100".to_string()
}

// ============ Main ============

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Determine API endpoint
    let endpoint = match &cli.endpoint {
        Some(e) => e.clone(),
        None => {
            // Try to read from config file
            if cli.config.exists() {
                match std::fs::read_to_string(&cli.config) {
                    Ok(content) => {
                        match toml::from_str::<Config>(&content) {
                            Ok(config) => {
                                // Convert bind address to localhost if it's 0.0.0.0
                                let addr = config.api.bind_address;
                                if addr.starts_with("0.0.0.0") {
                                    format!(
                                        "http://127.0.0.1:{}",
                                        addr.split(':').nth(1).unwrap_or("9100")
                                    )
                                } else {
                                    format!("http://{}", addr)
                                }
                            }
                            Err(_) => "http://127.0.0.1:9100".to_string(),
                        }
                    }
                    Err(_) => "http://127.0.0.1:9100".to_string(),
                }
            } else {
                "http://127.0.0.1:9100".to_string()
            }
        }
    };

    let result = match &cli.command {
        Commands::Status => show_status(&endpoint).await,
        Commands::Nodes => list_nodes(&endpoint).await,
        Commands::Leader => show_leader(&endpoint).await,
        Commands::Clocks => show_clocks(&endpoint).await,
        Commands::Send { from, to } => send_event(&endpoint, from, to).await,
        Commands::Stats => show_stats(&endpoint).await,
        Commands::Watch => watch(&endpoint).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// ============ Commands ============

async fn show_status(endpoint: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("{}/status", endpoint);
    let client = reqwest::Client::new();

    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(format!("API error: {}", response.status()).into());
    }

    let status: StatusApi = response.json().await?;

    println!();
    println!("WolfGate Status");
    println!("===============");
    println!();
    println!("Version:      {}", status.version);
    println!(
        "Uptime:       {}",
        format_duration(std::time::Duration::from_secs(status.uptime_secs))
    );
    match status.nodes_alive {
        Some(alive) => println!("Nodes:        {}/{} alive", alive, status.nodes_total),
        None => println!(
            "Nodes:        {} registered (no liveness round yet)",
            status.nodes_total
        ),
    }
    match &status.leader.address {
        Some(address) => println!("Leader:       {}", address),
        None => println!("Leader:       \x1b[31mUNKNOWN\x1b[0m"),
    }
    println!("Participants: {}", status.participants.join(", "));
    println!();

    Ok(())
}

async fn list_nodes(endpoint: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("{}/cluster", endpoint);
    let client = reqwest::Client::new();

    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(format!("API error: {}", response.status()).into());
    }

    let cluster: ClusterApi = response.json().await?;

    // Print header
    println!();
    println!(
        "WolfGate Cluster View (wolfgatectl v{})",
        env!("CARGO_PKG_VERSION")
    );
    println!("========================================");
    println!();
    match (&cluster.leader.address, &cluster.leader.name) {
        (Some(address), _) => println!("Leader: {}", address),
        (None, Some(name)) => println!("Leader: '{}' reported but unconfirmed", name),
        (None, None) => println!("Leader: NONE"),
    }
    if let Some(probed_at) = &cluster.probed_at {
        println!("Probed: {}", probed_at);
    }
    println!();

    // Print table header
    println!("{:<25} {:<10} {:<10}", "ADDRESS", "PRIORITY", "STATUS");
    println!("{}", "-".repeat(45));

    for node in &cluster.nodes {
        // Pad status to fixed width BEFORE adding color codes
        let status = match node.alive {
            Some(true) => "ALIVE",
            Some(false) => "DOWN",
            None => "UNKNOWN",
        };
        let status_padded = format!("{:<10}", status);
        let status_colored = match node.alive {
            Some(true) => format!("\x1b[32m{}\x1b[0m", status_padded), // Green
            Some(false) => format!("\x1b[31m{}\x1b[0m", status_padded), // Red
            None => status_padded,
        };

        println!("{:<25} {:<10} {}", node.address, node.priority, status_colored);
    }
    println!();

    Ok(())
}

async fn show_leader(endpoint: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("{}/cluster/leader", endpoint);
    let client = reqwest::Client::new();

    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(format!("API error: {}", response.status()).into());
    }

    let leader: LeaderApi = response.json().await?;

    println!();
    match (&leader.name, &leader.address) {
        (Some(name), Some(address)) => {
            println!("Leader:  \x1b[1;34m{}\x1b[0m", address);
            println!("Reports: {}", name);
        }
        (Some(name), None) => {
            println!("Leader:  \x1b[33munconfirmed\x1b[0m");
            println!("Reports: {} (no node claimed this identity itself)", name);
        }
        _ => println!("Leader:  \x1b[31mUNKNOWN\x1b[0m"),
    }
    println!();

    Ok(())
}

async fn show_clocks(endpoint: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("{}/clocks", endpoint);
    let client = reqwest::Client::new();

    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(format!("API error: {}", response.status()).into());
    }

    let clocks: BTreeMap<String, u64> = response.json().await?;

    println!();
    println!("{:<15} {:>10}", "PARTICIPANT", "COUNTER");
    println!("{}", "-".repeat(26));
    for (participant, counter) in &clocks {
        println!("{:<15} {:>10}", participant, counter);
    }
    println!();

    Ok(())
}

async fn send_event(endpoint: &str, from: &str, to: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("{}/clocks/send", endpoint);
    let client = reqwest::Client::new();

    let response = client
        .post(&url)
        .json(&serde_json::json!({ "from": from, "to": to }))
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        if let Ok(body) = response.json::<ApiError>().await {
            return Err(format!("{} ({})", body.error, body.code).into());
        }
        return Err(format!("API error: {}", status).into());
    }

    let applied: SendApi = response.json().await?;
    println!(
        "Applied message {} -> {}: {}'s clock is now {}",
        from, to, applied.to, applied.counter
    );

    Ok(())
}

async fn show_stats(endpoint: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("{}/files/stats", endpoint);
    let client = reqwest::Client::new();

    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        let status = response.status();
        if let Ok(body) = response.json::<ApiError>().await {
            return Err(format!("{} ({})", body.error, body.code).into());
        }
        return Err(format!("API error: {}", status).into());
    }

    let stats: StorageStatsApi = response.json().await?;

    println!();
    println!("Leader Storage Usage");
    println!("====================");
    println!();
    println!("Files:  {}", stats.total_files);
    println!("Used:   {}", format_bytes(stats.total_bytes));
    println!("Quota:  {}", format_bytes(stats.quota_bytes));
    if stats.quota_bytes > 0 {
        let used_pct = stats.total_bytes as f64 / stats.quota_bytes as f64 * 100.0;
        println!("Usage:  {:.1}%", used_pct);
    }
    println!();

    Ok(())
}

async fn watch(endpoint: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let cluster_url = format!("{}/cluster", endpoint);
    let clocks_url = format!("{}/clocks", endpoint);
    let start_time = std::time::Instant::now();

    // Hide cursor
    print!("\x1b[?25l");

    // Set up Ctrl+C handler
    let running = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, std::sync::atomic::Ordering::SeqCst);
    })?;

    // Main loop
    while running.load(std::sync::atomic::Ordering::SeqCst) {
        // Clear screen and move cursor to top
        print!("\x1b[H\x1b[J");

        // Header
        println!();
        println!("  \x1b[1;36mWolfGate Live Cluster View\x1b[0m");
        println!("  {}", "=".repeat(50));
        println!();

        match client.get(&cluster_url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<ClusterApi>().await {
                    Ok(cluster) => {
                        match &cluster.leader.address {
                            Some(address) => {
                                println!("  Leader:   \x1b[1;34m{}\x1b[0m", address)
                            }
                            None => println!("  Leader:   \x1b[31mUNKNOWN\x1b[0m"),
                        }
                        let alive = cluster
                            .nodes
                            .iter()
                            .filter(|node| node.alive == Some(true))
                            .count();
                        println!("  Cluster:  {}/{} nodes alive", alive, cluster.nodes.len());
                        println!();

                        for node in &cluster.nodes {
                            let marker = match node.alive {
                                Some(true) => "\x1b[32m[OK]\x1b[0m",
                                Some(false) => "\x1b[31m[XX]\x1b[0m",
                                None => "[??]",
                            };
                            println!(
                                "  {} {:<25} priority {}",
                                marker, node.address, node.priority
                            );
                        }
                    }
                    Err(e) => {
                        println!("  Error parsing cluster view: {}", e);
                    }
                }
            }
            Ok(response) => {
                println!("  \x1b[31mAPI Error: {}\x1b[0m", response.status());
                println!("  \x1b[2mCtrl+C to exit\x1b[0m");
            }
            Err(e) => {
                println!("  \x1b[31mConnection Error: {}\x1b[0m", e);
                println!("  Is WolfGate running?");
                println!("  \x1b[2mCtrl+C to exit\x1b[0m");
            }
        }

        // Clock table
        if let Ok(response) = client.get(&clocks_url).send().await {
            if response.status().is_success() {
                if let Ok(clocks) = response.json::<BTreeMap<String, u64>>().await {
                    println!();
                    println!("  \x1b[1mLogical Clocks\x1b[0m");
                    println!("  {}", "-".repeat(50));
                    for (participant, counter) in &clocks {
                        println!("  {:<15} {:>10}", participant, counter);
                    }
                }
            }
        }

        // Footer
        println!();
        let uptime_fmt = format_duration(start_time.elapsed());
        println!("  \x1b[2mSession: {} | Ctrl+C to exit\x1b[0m", uptime_fmt);

        // Wait 1 second before next update
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }

    // Show cursor again
    print!("\x1b[?25h");
    println!();
    println!("Watch stopped.");

    Ok(())
}

// ============ Helpers ============

/// Format duration as human-readable string
fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

/// Format a byte count as a human-readable size
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    if bytes < 1024 * 1024 {
        return format!("{:.1} KB", bytes as f64 / 1024.0);
    }
    if bytes < 1024 * 1024 * 1024 {
        return format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0));
    }
    format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
}
