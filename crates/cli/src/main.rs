use clap::Parser;
use ledger_api::{cli::Cli, logging, server};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = server::run(cli).await {
		tracing::error!(target = "ledger.api", error = %format!("{err:#}"), "fatal");
		std::process::exit(1);
	}
}
