use battle_engine::cli::{Cli, Command};
use battle_engine::error::BattleFailure;
use battle_engine::runtime::{resolve_pokemon, BattleRuntime};
use battle_engine::config;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(failure) = run().await {
        tracing::error!(%failure, "battle engine exited with an error");
        std::process::exit(failure.exit_code());
    }
}

async fn run() -> Result<(), BattleFailure> {
    let cli = Cli::parse();
    let engine_config = config::load(&cli.config)?;

    let runtime = match cli.command {
        Command::Host { port, display_name, pokemon } => {
            let spec = resolve_pokemon(&pokemon)?;
            BattleRuntime::host(port, display_name, spec, engine_config).await?
        }
        Command::Join { host, port, display_name, pokemon } => {
            let spec = resolve_pokemon(&pokemon)?;
            BattleRuntime::join(host, port, display_name, spec, engine_config).await?
        }
        Command::Spectate { host, port, display_name } => {
            BattleRuntime::spectate(host, port, display_name, engine_config).await?
        }
    };

    runtime.run().await
}
