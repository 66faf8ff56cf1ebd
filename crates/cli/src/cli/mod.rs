#[cfg(test)]
mod tests;

use std::net::SocketAddr;

use clap::{Parser, ValueEnum};

/// REST gateway for the asset-tracking ledger.
///
/// Connection parameters (profile, channel, chaincode, identity, wallet,
/// discovery, host override) are read from the environment on the first
/// request, not from these flags.
#[derive(Parser, Debug)]
#[command(name = "ledger-api")]
#[command(about = "REST gateway for the asset-tracking ledger")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v debug, -vv trace)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Address the HTTP server binds to
	#[arg(long, env = "LISTEN", value_name = "ADDR", default_value = "0.0.0.0:8080")]
	pub listen: SocketAddr,

	/// Ledger backend. `peer` needs a gateway speaking this server's
	/// JSON-over-WebSocket protocol; a stock ledger peer does not.
	#[arg(long, env = "LEDGER", value_enum, default_value = "peer")]
	pub ledger: LedgerKind,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerKind {
	/// JSON-over-WebSocket gateway at the profile's peer URLs (not a stock
	/// peer's native protocol)
	Peer,
	/// In-process ledger; state is lost on exit
	Memory,
}
