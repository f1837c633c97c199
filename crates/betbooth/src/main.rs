#![expect(
    clippy::multiple_crate_versions,
    reason = "transitive dependency duplication"
)]

use clap::{Parser, Subcommand};
use eyre::Context as _;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

mod actions;
mod amount;
mod chain;
mod config;
mod contract;
mod doctor;
mod errors;
mod fsutil;
mod paths;
mod render;
mod server;
mod store;
mod users;
mod wallet;

#[derive(Parser, Debug)]
#[command(name = "betbooth", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the action server over stdio (line-delimited JSON frames).
    ///
    /// Requires a signing source and the pool contract address; see
    /// `betbooth doctor` for what's missing.
    Serve,

    /// Print resolved paths (useful for debugging).
    Paths,

    /// Print a quick self-diagnostic report (safe to paste; contains no secrets).
    Doctor {
        /// Emit JSON to stdout (machine-readable).
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn init_logging(paths: &paths::BetboothPaths) -> tracing_appender::non_blocking::WorkerGuard {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let file_name = paths
        .log_file
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("betbooth.log.jsonl");
    let file_appender = tracing_appender::rolling::never(&paths.data_dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // MCP-style agents read stdout; all logging goes to stderr and the file.
    let stderr_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_filter(env_filter.clone());
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

async fn serve(paths: &paths::BetboothPaths) -> eyre::Result<()> {
    let cfg = store::ConfigStore::new(paths)
        .load_or_init_default()
        .context("load config")?;
    cfg.validate_for_serve()?;

    let contract_addr =
        chain::EvmChain::parse_address(cfg.contract_address.as_deref().unwrap_or_default())
            .context("parse contract_address")?;

    let evm_wallet = wallet::EvmWallet::configure(&cfg.signing, &cfg.rpc).context("configure wallet")?;
    let users = users::UserWalletStore::load_or_default(paths.user_wallets_path())
        .context("load user wallets")?;

    let dispatcher = actions::Dispatcher::new(Arc::new(evm_wallet), contract_addr, users);
    server::run(&dispatcher).await.context("action server failed")
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let paths = paths::BetboothPaths::discover()?;
    paths.ensure_private_dirs().context("create private dirs")?;
    let _log_guard = init_logging(&paths);

    match cli.cmd {
        Command::Serve => serve(&paths).await,
        Command::Paths => {
            use std::io::Write as _;
            let s = serde_json::to_string(&serde_json::json!({
              "config_dir": paths.config_dir,
              "data_dir": paths.data_dir,
              "log_file": paths.log_file,
            }))
            .context("serialize paths")?;
            writeln!(std::io::stdout().lock(), "{s}").context("write paths")?;
            Ok(())
        }
        Command::Doctor { json } => doctor::run(json).context("doctor failed"),
    }
}
