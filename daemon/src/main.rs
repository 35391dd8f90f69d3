//! Stakepool daemon: loads configuration and serves the staking engine over RPC.

mod bootstrap;
mod config;

use anyhow::Context;
use clap::Parser;
use config::DaemonConfig;
use stakepool_rpc::RpcServer;
use stakepool_token::TokenLedger;
use stakepool_types::SystemClock;
use stakepool_utils::{format_days, LogFormat};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "stakepool-daemon", about = "Staking pool accounting daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "STAKEPOOL_CONFIG")]
    config: Option<PathBuf>,

    /// Interface for the RPC server.
    #[arg(long, env = "STAKEPOOL_BIND")]
    bind: Option<String>,

    /// RPC server port.
    #[arg(long, env = "STAKEPOOL_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Log format: "human" or "json".
    #[arg(long, env = "STAKEPOOL_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "STAKEPOOL_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Build the engine from configuration and serve RPC until Ctrl-C.
    Serve,
    /// Load the configuration, build the engine, report and exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DaemonConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }
    if let Some(port) = cli.rpc_port {
        config.rpc_port = port;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    stakepool_utils::init_logging(config.log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    let ready = bootstrap::build(&config, Arc::new(SystemClock))?;

    match cli.command {
        Command::CheckConfig => {
            for pool in ready.engine.list_pools() {
                tracing::info!(
                    pool_id = pool.id,
                    start = %pool.terms.start_time,
                    lock = %format_days(pool.terms.duration_days, pool.terms.redemption_buffer_days),
                    escrow_reward_balance = ready
                        .tokens
                        .balance_of(&pool.terms.reward_token, ready.engine.escrow()),
                    reward_reserve = ready.engine.reward_reserve(&pool.terms.reward_token),
                    "pool"
                );
            }
            tracing::info!("configuration ok");
        }
        Command::Serve => {
            tracing::info!(
                "Starting stakepool daemon (RPC {}:{}, {} pools)",
                config.bind_address,
                config.rpc_port,
                ready.engine.list_pools().len(),
            );
            let server = RpcServer::new(config.bind_address.clone(), config.rpc_port, ready.engine);
            server
                .start_with_shutdown(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::warn!("failed to listen for Ctrl-C: {e}");
                        std::future::pending::<()>().await;
                    }
                    tracing::info!("Shutdown signal received, stopping RPC server");
                })
                .await?;
            tracing::info!("stakepool daemon exited cleanly");
        }
    }

    Ok(())
}
