//! Command-line interface definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "autotipper")]
#[command(about = "Keeps an oracle query funded with tips", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
	#[command(subcommand)]
	pub command: Option<Command>,

	/// Path to configuration file
	#[arg(short, long, value_name = "FILE", default_value = "config/autotipper.toml")]
	pub config: PathBuf,

	/// Log level or filter directive (trace, debug, info, warn, error)
	#[arg(long, env = "TIPPER_LOG_LEVEL", default_value = "info")]
	pub log_level: String,

	#[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
	pub log_format: LogFormat,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
	/// Run one tipping invocation and exit
	Run {
		/// Follow a tip with the bounded re-tip sequence
		#[arg(long)]
		escalate: bool,
	},
	/// Load and validate the configuration without touching the network
	Validate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
	Pretty,
	Json,
}
