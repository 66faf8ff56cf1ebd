use std::net::SocketAddr;

use clap::{CommandFactory, Parser};

use super::*;

#[test]
fn defaults_listen_on_8080_against_peers() {
	let cli = Cli::try_parse_from(["ledger-api"]).unwrap();
	assert_eq!(cli.listen, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
	assert_eq!(cli.ledger, LedgerKind::Peer);
	assert_eq!(cli.verbose, 0);
}

#[test]
fn parse_memory_backend_and_verbosity() {
	let cli = Cli::try_parse_from(["ledger-api", "--ledger", "memory", "-vv", "--listen", "127.0.0.1:3000"]).unwrap();
	assert_eq!(cli.ledger, LedgerKind::Memory);
	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.listen.port(), 3000);
}

#[test]
fn rejects_unknown_backend() {
	assert!(Cli::try_parse_from(["ledger-api", "--ledger", "couchdb"]).is_err());
}

#[test]
fn rejects_malformed_listen_address() {
	assert!(Cli::try_parse_from(["ledger-api", "--listen", "localhost"]).is_err());
}

#[test]
fn help_warns_peer_backend_is_not_native() {
	let help = Cli::command().render_long_help().to_string();
	let help = help.split_whitespace().collect::<Vec<_>>().join(" ");
	assert!(help.contains("JSON-over-WebSocket"), "{help}");
	assert!(help.contains("stock ledger peer does not"), "{help}");
}
