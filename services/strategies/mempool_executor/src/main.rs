use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vigil_config::{Credentials, EngineConfig};
use vigil_mempool_executor::Engine;

#[derive(Debug, Parser)]
#[command(name = "mempool_executor", about = "Multi-network pending-transaction executor")]
struct Args {
    /// TOML configuration file layered over the built-in defaults
    #[arg(short, long, env = "VIGIL_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Monitor only these networks (repeatable)
    #[arg(long = "only", value_name = "NETWORK")]
    only: Vec<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let config = EngineConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    let credentials = Credentials::from_env().context("Missing operating-account credentials")?;

    Engine::new(config, credentials, args.only)
        .run()
        .await
        .context("Executor stopped with an error")?;

    Ok(())
}
