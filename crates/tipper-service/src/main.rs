use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tipper_account::create_secret_provider;
use tipper_config::{ConfigLoader, TipperConfig};
use tipper_core::{run_invocation, CycleOutcome};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

use cli::{Cli, Command, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level, cli.log_format)?;

	match cli.command {
		Some(Command::Run { escalate }) => run(&cli.config, escalate).await,
		None => run(&cli.config, false).await,
		Some(Command::Validate) => validate(&cli.config).await,
	}
}

async fn run(config_path: &Path, escalate: bool) -> Result<()> {
	let config = load_config(config_path).await?;
	let secrets = create_secret_provider(&config.account);

	let outcomes = run_invocation(&config, secrets.as_ref(), escalate)
		.await
		.context("Tipping invocation failed")?;

	for outcome in &outcomes {
		match outcome {
			CycleOutcome::Tipped {
				amount, tx_hash, ..
			} => info!(%amount, %tx_hash, "Tipped"),
			CycleOutcome::NotWarranted => info!("No tip needed"),
			CycleOutcome::NothingToTip { .. } => info!("Tip warranted but amount was zero"),
			CycleOutcome::ZeroBalance {
				oracle_token,
				settlement_token,
			} => warn!(oracle_token, settlement_token, "Skipped: zero balance"),
			CycleOutcome::PriceUnavailable => warn!("Skipped: prices unavailable"),
		}
	}

	Ok(())
}

async fn validate(config_path: &Path) -> Result<()> {
	let config = load_config(config_path).await?;

	info!("Configuration is valid");
	info!("Chain id: {}", config.network.chain_id);
	info!("Autopay: {}", config.contracts.autopay);
	info!("Oracle: {}", config.contracts.oracle);
	info!("Token: {}", config.contracts.token);
	if let Some(query_id) = config.query.id {
		info!("Query id: {}", query_id);
	}
	info!(
		"Re-tip escalation: {}",
		if config.retip.enabled { "enabled" } else { "disabled" }
	);

	Ok(())
}

async fn load_config(path: &Path) -> Result<TipperConfig> {
	info!("Loading configuration from: {:?}", path);

	ConfigLoader::new()
		.with_file(path)
		.load()
		.await
		.context("Failed to load configuration")
}

fn setup_tracing(log_level: &str, format: LogFormat) -> Result<()> {
	let env_filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(log_level))
		.context("Invalid log level")?;

	let registry = tracing_subscriber::registry().with(env_filter);

	match format {
		LogFormat::Json => registry
			.with(tracing_subscriber::fmt::layer().json())
			.try_init(),
		LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
	}
	.context("Failed to initialize tracing")?;

	Ok(())
}
