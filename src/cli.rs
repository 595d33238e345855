use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "battle-engine", about = "Peer-to-peer turn-based battle engine over UDP")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to an optional reliability-tuning TOML file.
    #[arg(long, global = true, default_value = "battle-engine.toml")]
    pub config: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Listen for a Joiner and start a battle.
    Host {
        #[arg(long, default_value_t = 8888)]
        port: u16,
        #[arg(long, default_value = "Host")]
        display_name: String,
        #[arg(long)]
        pokemon: String,
    },
    /// Connect to a Host as the battle counterparty.
    Join {
        #[arg(long)]
        host: SocketAddr,
        #[arg(long, default_value_t = 0)]
        port: u16,
        #[arg(long, default_value = "Joiner")]
        display_name: String,
        #[arg(long)]
        pokemon: String,
    },
    /// Connect to a Host as a read-only observer.
    Spectate {
        #[arg(long)]
        host: SocketAddr,
        #[arg(long, default_value_t = 0)]
        port: u16,
        #[arg(long, default_value = "Spectator")]
        display_name: String,
    },
}
