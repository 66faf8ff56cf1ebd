use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Maps `-v` occurrences to a default filter. `RUST_LOG` wins when set.
fn default_filter(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "info",
		1 => "info,ledger_runtime=debug,ledger_api=debug",
		_ => "trace",
	}
}

/// Installs the global subscriber: one compact stderr layer under an
/// env-driven filter.
pub fn init_logging(verbosity: u8) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbosity).into());

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().compact().with_writer(std::io::stderr))
		.init();
}
