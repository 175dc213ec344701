//! `ringsim`: explore key placement and migration on a consistent-hash
//! cache directory.
//!
//! # Usage
//!
//! ```text
//! ringsim map                                  # place the default keys on node-a..c
//! ringsim map alpha bravo --nodes n1,n2        # place chosen keys on chosen nodes
//! ringsim -c ringcache.toml churn --remove node-b
//! ringsim churn -n 50000 --add node-d --hash fnv1a
//! ```

mod telemetry;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ringcache_cluster::{ClusterConfig, Directory, moved_fraction};
use ringcache_placement::HashAlgorithm;
use ringcache_types::NodeId;
use tracing::info;

/// Nodes used when neither the config file nor the command line names any.
const DEFAULT_NODES: [&str; 3] = ["node-a", "node-b", "node-c"];

/// Keys placed by `map` when none are given.
const DEFAULT_KEYS: [&str; 6] = ["alpha", "bravo", "charlie", "delta", "echo", "foxtrot"];

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "ringsim",
    version,
    about = "Consistent-hash cache directory simulator"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Tokens per node. Non-positive values use the default (100).
    #[arg(short, long, global = true, allow_negative_numbers = true)]
    replicas: Option<i64>,

    /// Hash function placing tokens and keys: `blake3` or `fnv1a`.
    #[arg(long, global = true)]
    hash: Option<HashAlgorithm>,

    /// Initial nodes (comma-separated or repeated). Replaces the config's list.
    #[arg(long, global = true, value_delimiter = ',')]
    nodes: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the owner of each key.
    Map {
        /// Keys to place.
        keys: Vec<String>,
    },

    /// Seed keys, change membership, and report how many keys moved.
    Churn {
        /// Number of keys to seed.
        #[arg(short = 'n', long, default_value = "10000")]
        keys: usize,

        /// Node(s) to add, in order.
        #[arg(long)]
        add: Vec<String>,

        /// Node(s) to remove, in order, after the additions.
        #[arg(long)]
        remove: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    telemetry::init(config.log_level());

    let directory = Directory::from_config(&config);
    info!(
        nodes = directory.node_count(),
        replicas = directory.replicas(),
        hash = ?config.hash_algorithm(),
        "directory ready"
    );

    match cli.command {
        Commands::Map { keys } => cmd_map(&directory, &keys),
        Commands::Churn { keys, add, remove } => cmd_churn(&directory, keys, &add, &remove),
    }
    Ok(())
}

/// Load the config file (if any) and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<ClusterConfig> {
    let mut config = ClusterConfig::load(cli.config.as_deref()).context("failed to load config")?;

    // CLI args override config file values.
    if let Some(replicas) = cli.replicas {
        config.ring.replicas = Some(replicas);
    }
    if let Some(hash) = cli.hash {
        config.ring.hash = hash;
    }
    if !cli.nodes.is_empty() {
        config.cluster.nodes = cli.nodes.iter().cloned().map(NodeId::from).collect();
    }
    if config.cluster.nodes.is_empty() {
        config.cluster.nodes = DEFAULT_NODES.into_iter().map(NodeId::from).collect();
    }
    Ok(config)
}

// -----------------------------------------------------------------------
// ringsim map
// -----------------------------------------------------------------------

fn cmd_map(directory: &Directory<HashAlgorithm>, keys: &[String]) {
    let keys: Vec<&str> = if keys.is_empty() {
        DEFAULT_KEYS.to_vec()
    } else {
        keys.iter().map(String::as_str).collect()
    };

    print_nodes(directory);
    println!();
    for key in keys {
        match directory.lookup(key) {
            Some(owner) => println!("{key:>10} -> {owner}"),
            None => println!("{key:>10} -> (no nodes)"),
        }
    }
}

// -----------------------------------------------------------------------
// ringsim churn
// -----------------------------------------------------------------------

fn cmd_churn(directory: &Directory<HashAlgorithm>, keys: usize, add: &[String], remove: &[String]) {
    for i in 0..keys {
        // The directory always has nodes here: load_config fills in defaults.
        if let Err(e) = directory.set(format!("key-{i}"), format!("value-{i}")) {
            println!("seeding stopped at key-{i}: {e}");
            break;
        }
    }

    print_nodes(directory);
    print_counts(directory);
    let before = directory.snapshot_key_owners();

    println!();
    for node_id in add {
        let report = directory.add_node(node_id.as_str());
        if report.applied {
            println!("+ {node_id}: moved {} keys", report.moved.len());
        } else {
            println!("+ {node_id}: already present");
        }
    }
    for node_id in remove {
        let report = directory.remove_node(node_id.as_str());
        if report.applied {
            println!(
                "- {node_id}: moved {} keys, discarded {}",
                report.moved.len(),
                report.discarded.len()
            );
        } else {
            println!("- {node_id}: not present");
        }
    }

    let after = directory.snapshot_key_owners();
    println!();
    print_nodes(directory);
    print_counts(directory);
    println!();
    println!(
        "Moved: {:.2}% of {} keys",
        moved_fraction(&before, &after) * 100.0,
        before.len()
    );
}

fn print_nodes(directory: &Directory<HashAlgorithm>) {
    let nodes: Vec<String> = directory
        .list_nodes()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("Nodes: {}", nodes.join(", "));
}

fn print_counts(directory: &Directory<HashAlgorithm>) {
    for (node_id, count) in directory.key_counts() {
        println!("  {node_id:>12}: {count}");
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
