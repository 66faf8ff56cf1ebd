//! Lazily connected, cached ledger session.
//!
//! [`SessionManager`] owns at most one live session. The first call to
//! [`SessionManager::handle`] starts a connection attempt; callers arriving
//! while it is in flight await the same attempt, and once it lands every
//! later call gets the cached [`TransactionHandle`] until
//! [`SessionManager::disconnect`].
//!
//! ```text
//! Disconnected --handle()--> Connecting --ok--> Ready
//!      ^                          |               |
//!      +------ error/disconnect --+-- disconnect -+
//! ```
//!
//! The attempt runs in its own task, so it completes even if every waiting
//! caller is cancelled. Each attempt carries a generation number; an attempt
//! that lands after a disconnect closes what it opened instead of publishing
//! it.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::{ConfigResolver, ConnectionConfig, ProcessEnv};
use crate::error::{Error, Result};
use crate::gateway::{ConnectOptions, DiscoveryOptions, Gateway, IdentityStore, LedgerConnection, TransactionHandle};
use crate::profile::{load_profile, rewrite_host};
use crate::wallet::FileSystemWallet;

type ConnectFuture = Shared<BoxFuture<'static, Result<TransactionHandle>>>;

/// Observable lifecycle state of a [`SessionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	Disconnected,
	Connecting,
	Ready,
}

impl fmt::Display for SessionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			SessionState::Disconnected => "disconnected",
			SessionState::Connecting => "connecting",
			SessionState::Ready => "ready",
		})
	}
}

struct Session {
	connection: Box<dyn LedgerConnection>,
	handle: TransactionHandle,
	config: ConnectionConfig,
}

enum State {
	Disconnected,
	Connecting { attempt: u64, future: ConnectFuture },
	Ready(Arc<Session>),
}

struct Inner {
	gateway: Arc<dyn Gateway>,
	resolver: Arc<dyn ConfigResolver>,
	state: Mutex<State>,
	attempts: AtomicU64,
}

/// Owner of the single ledger session. Cloning shares the same session.
#[derive(Clone)]
pub struct SessionManager {
	inner: Arc<Inner>,
}

impl SessionManager {
	/// Creates a manager that resolves its configuration from the process
	/// environment on each connection attempt.
	pub fn new(gateway: impl Gateway + 'static) -> Self {
		Self::with_resolver(gateway, ProcessEnv)
	}

	pub fn with_resolver(gateway: impl Gateway + 'static, resolver: impl ConfigResolver + 'static) -> Self {
		Self {
			inner: Arc::new(Inner {
				gateway: Arc::new(gateway),
				resolver: Arc::new(resolver),
				state: Mutex::new(State::Disconnected),
				attempts: AtomicU64::new(0),
			}),
		}
	}

	pub fn state(&self) -> SessionState {
		match &*self.inner.state.lock() {
			State::Disconnected => SessionState::Disconnected,
			State::Connecting { .. } => SessionState::Connecting,
			State::Ready(_) => SessionState::Ready,
		}
	}

	/// Configuration of the live session, if there is one.
	#[cfg(test)]
	pub(crate) fn config(&self) -> Option<ConnectionConfig> {
		match &*self.inner.state.lock() {
			State::Ready(session) => Some(session.config.clone()),
			_ => None,
		}
	}

	/// Returns the transaction handle, connecting first if necessary.
	///
	/// # Errors
	///
	/// Any failure of the connection attempt is returned to every caller
	/// that was waiting on it, and the manager is left disconnected so the
	/// next call starts over. [`Error::Disconnected`] means
	/// [`disconnect`](Self::disconnect) ran while the attempt was in flight.
	pub async fn handle(&self) -> Result<TransactionHandle> {
		let future = {
			let mut state = self.inner.state.lock();
			match &*state {
				State::Ready(session) => return Ok(Arc::clone(&session.handle)),
				State::Connecting { future, .. } => future.clone(),
				State::Disconnected => {
					let attempt = self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
					let future = self.start_attempt(attempt);
					*state = State::Connecting {
						attempt,
						future: future.clone(),
					};
					future
				}
			}
		};

		future.await
	}

	fn start_attempt(&self, attempt: u64) -> ConnectFuture {
		let inner = Arc::clone(&self.inner);
		let task = tokio::spawn(async move { inner.connect(attempt).await });

		async move {
			task.await
				.unwrap_or_else(|err| Err(Error::Connection(format!("connection task failed: {err}"))))
		}
		.boxed()
		.shared()
	}

	/// Closes the session if one is open. Calling it again is a no-op.
	///
	/// Close failures are logged rather than returned; the manager always
	/// ends up disconnected.
	pub async fn disconnect(&self) {
		let previous = std::mem::replace(&mut *self.inner.state.lock(), State::Disconnected);

		match previous {
			State::Ready(session) => {
				info!(target = "ledger.session", "closing ledger session");
				if let Err(err) = session.connection.close().await {
					warn!(target = "ledger.session", error = %err, "error while closing ledger connection");
				}
			}
			State::Connecting { attempt, .. } => {
				info!(target = "ledger.session", attempt, "disconnect requested during connection attempt");
			}
			State::Disconnected => {
				debug!(target = "ledger.session", "disconnect on idle session");
			}
		}
	}
}

impl Inner {
	async fn connect(self: Arc<Self>, attempt: u64) -> Result<TransactionHandle> {
		let result = self.open_session().await;

		let orphan = {
			let mut state = self.state.lock();
			let current = matches!(&*state, State::Connecting { attempt: a, .. } if *a == attempt);

			match result {
				Ok(session) if current => {
					let handle = Arc::clone(&session.handle);
					info!(
						target = "ledger.session",
						attempt,
						channel = %session.config.channel,
						chaincode = handle.name(),
						"ledger session ready"
					);
					*state = State::Ready(Arc::new(session));
					return Ok(handle);
				}
				Ok(session) => session,
				Err(err) => {
					if current {
						*state = State::Disconnected;
					}
					warn!(target = "ledger.session", attempt, error = %err, "connection attempt failed");
					return Err(err);
				}
			}
		};

		debug!(target = "ledger.session", attempt, "discarding connection opened after disconnect");
		if let Err(err) = orphan.connection.close().await {
			warn!(target = "ledger.session", error = %err, "error while closing ledger connection");
		}
		Err(Error::Disconnected)
	}

	async fn open_session(&self) -> Result<Session> {
		let config = self.resolver.resolve();
		info!(
			target = "ledger.session",
			profile = %config.profile_path.display(),
			channel = %config.channel,
			chaincode = %config.chaincode,
			identity = %config.identity,
			"connecting to ledger network"
		);

		let mut profile = load_profile(&config.profile_path).await?;
		rewrite_host(&mut profile, config.host_override());

		let wallet = FileSystemWallet::open(&config.wallet_path).await?;
		if wallet.get(&config.identity).await?.is_none() {
			return Err(Error::IdentityNotFound {
				label: config.identity.clone(),
				wallet: wallet.path().to_path_buf(),
			});
		}

		let options = ConnectOptions {
			identities: Arc::new(wallet),
			identity: config.identity.clone(),
			discovery: DiscoveryOptions {
				enabled: config.discovery_enabled,
				as_localhost: config.as_localhost,
			},
		};
		let connection = self.gateway.connect(profile, options).await?;

		let network = match connection.network(&config.channel).await {
			Ok(network) => network,
			Err(err) => {
				if let Err(close_err) = connection.close().await {
					debug!(target = "ledger.session", error = %close_err, "close after failed channel lookup");
				}
				return Err(err);
			}
		};
		let handle = network.contract(&config.chaincode);

		Ok(Session {
			connection,
			handle,
			config,
		})
	}
}
