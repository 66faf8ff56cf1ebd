//! In-process ledger running the asset-tracking chaincode.
//!
//! Used for local development (`--ledger memory`) and by the test suites.
//! World state is shared by every connection made through the same
//! [`MemoryGateway`], so data survives a disconnect/reconnect cycle.

mod chaincode;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use ledger_protocol::NetworkProfile;
use parking_lot::Mutex;
use tracing::debug;

use self::chaincode::{Stub, WorldState};
use crate::error::{Error, Result};
use crate::gateway::{ConnectOptions, Contract, Gateway, LedgerConnection, Network, TransactionHandle};

/// World states keyed by (channel, chaincode).
type Ledger = Arc<Mutex<HashMap<(String, String), WorldState>>>;

/// [`Gateway`] backed by an in-memory world state.
#[derive(Clone, Default)]
pub struct MemoryGateway {
	ledger: Ledger,
}

impl MemoryGateway {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl Gateway for MemoryGateway {
	async fn connect(&self, _profile: NetworkProfile, options: ConnectOptions) -> Result<Box<dyn LedgerConnection>> {
		if options.identities.get(&options.identity).await?.is_none() {
			return Err(Error::Connection(format!(
				"identity \"{}\" is not available",
				options.identity
			)));
		}

		debug!(target = "ledger.memory", identity = %options.identity, "in-memory ledger connected");
		Ok(Box::new(MemoryConnection {
			ledger: Arc::clone(&self.ledger),
			closed: Arc::new(AtomicBool::new(false)),
		}))
	}
}

struct MemoryConnection {
	ledger: Ledger,
	closed: Arc<AtomicBool>,
}

#[async_trait]
impl LedgerConnection for MemoryConnection {
	async fn network(&self, channel: &str) -> Result<Arc<dyn Network>> {
		if self.closed.load(Ordering::SeqCst) {
			return Err(Error::ChannelClosed);
		}
		Ok(Arc::new(MemoryNetwork {
			ledger: Arc::clone(&self.ledger),
			closed: Arc::clone(&self.closed),
			channel: channel.to_string(),
		}))
	}

	async fn close(&self) -> Result<()> {
		self.closed.store(true, Ordering::SeqCst);
		Ok(())
	}
}

struct MemoryNetwork {
	ledger: Ledger,
	closed: Arc<AtomicBool>,
	channel: String,
}

impl Network for MemoryNetwork {
	fn contract(&self, chaincode: &str) -> TransactionHandle {
		Arc::new(MemoryContract {
			ledger: Arc::clone(&self.ledger),
			closed: Arc::clone(&self.closed),
			key: (self.channel.clone(), chaincode.to_string()),
		})
	}
}

struct MemoryContract {
	ledger: Ledger,
	closed: Arc<AtomicBool>,
	key: (String, String),
}

impl MemoryContract {
	fn execute(&self, transaction: &str, args: &[String], commit: bool) -> Result<Vec<u8>> {
		if self.closed.load(Ordering::SeqCst) {
			return Err(Error::ChannelClosed);
		}

		let mut ledger = self.ledger.lock();
		let world = ledger.entry(self.key.clone()).or_default();

		let mut stub = Stub::new(world);
		let response = chaincode::invoke(&mut stub, transaction, args).map_err(|message| Error::Transaction {
			transaction: transaction.to_string(),
			message,
		})?;
		let writes = stub.into_writes();

		if commit {
			world.commit(writes);
		}
		Ok(response)
	}
}

#[async_trait]
impl Contract for MemoryContract {
	fn name(&self) -> &str {
		&self.key.1
	}

	async fn submit_transaction(&self, transaction: &str, args: &[String]) -> Result<Vec<u8>> {
		self.execute(transaction, args, true)
	}

	async fn evaluate_transaction(&self, transaction: &str, args: &[String]) -> Result<Vec<u8>> {
		self.execute(transaction, args, false)
	}
}
