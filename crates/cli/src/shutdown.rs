//! Termination signals and the graceful-shutdown trigger.

use std::future::Future;

use tracing::info;

/// Termination signals, installed up front so a failure surfaces at startup.
pub struct Signals {
	#[cfg(unix)]
	terminate: tokio::signal::unix::Signal,
	#[cfg(unix)]
	interrupt: tokio::signal::unix::Signal,
}

impl Signals {
	#[cfg(unix)]
	pub fn install() -> std::io::Result<Self> {
		use tokio::signal::unix::{SignalKind, signal};

		Ok(Self {
			terminate: signal(SignalKind::terminate())?,
			interrupt: signal(SignalKind::interrupt())?,
		})
	}

	#[cfg(not(unix))]
	pub fn install() -> std::io::Result<Self> {
		Ok(Self {})
	}

	/// Waits for the first termination signal and returns its name.
	#[cfg(unix)]
	pub async fn recv(mut self) -> &'static str {
		tokio::select! {
			_ = self.terminate.recv() => "SIGTERM",
			_ = self.interrupt.recv() => "SIGINT",
		}
	}

	#[cfg(not(unix))]
	pub async fn recv(self) -> &'static str {
		match tokio::signal::ctrl_c().await {
			Ok(()) => "Ctrl+C",
			Err(_) => std::future::pending().await,
		}
	}
}

/// Resolves once `trigger` fires. Used as the server's graceful-shutdown
/// future; the session is closed only after in-flight requests drain.
pub async fn stop_on<F>(trigger: F)
where
	F: Future<Output = &'static str>,
{
	let reason = trigger.await;
	info!(target = "ledger.api", reason, "shutting down, draining requests");
}
