use std::future::Future;

use anyhow::{Context, Result};
use ledger_runtime::{MemoryGateway, PeerGateway, SessionManager};
use tokio::net::TcpListener;
use tracing::info;

use crate::cli::{Cli, LedgerKind};
use crate::routes;
use crate::shutdown::{self, Signals};

/// Binds the listener and serves until a termination signal arrives.
pub async fn run(cli: Cli) -> Result<()> {
	let sessions = match cli.ledger {
		LedgerKind::Peer => SessionManager::new(PeerGateway),
		LedgerKind::Memory => SessionManager::new(MemoryGateway::new()),
	};

	let signals = Signals::install().context("Failed to install signal handlers")?;

	let listener = TcpListener::bind(cli.listen)
		.await
		.with_context(|| format!("Failed to bind HTTP server to {}", cli.listen))?;

	info!(
		target = "ledger.api",
		addr = %listener.local_addr().context("listener has no local address")?,
		ledger = ?cli.ledger,
		"server running"
	);

	serve(listener, sessions, signals.recv()).await
}

/// Serves the asset API on `listener`. When `trigger` resolves the server
/// stops accepting and drains in-flight requests; the session is
/// disconnected after the drain.
pub async fn serve<F>(listener: TcpListener, sessions: SessionManager, trigger: F) -> Result<()>
where
	F: Future<Output = &'static str> + Send + 'static,
{
	let app = routes::router(sessions.clone());

	let served = axum::serve(listener, app)
		.with_graceful_shutdown(shutdown::stop_on(trigger))
		.await
		.context("HTTP server error");

	sessions.disconnect().await;
	info!(target = "ledger.api", "server stopped");
	served
}
