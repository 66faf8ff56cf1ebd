//! Client-library seam between the session manager and a ledger network.
//!
//! The session manager only talks to these traits. [`PeerGateway`] speaks to
//! a remote peer gateway; [`MemoryGateway`] runs the asset chaincode in
//! process.
//!
//! [`PeerGateway`]: crate::peer::PeerGateway
//! [`MemoryGateway`]: crate::memory::MemoryGateway

use std::sync::Arc;

use async_trait::async_trait;
use ledger_protocol::wire::DiscoveryParams;
use ledger_protocol::{Identity, NetworkProfile};

use crate::error::Result;

/// Handle through which submit and evaluate calls are issued against one
/// chaincode. Cloning shares the same instance.
pub type TransactionHandle = Arc<dyn Contract>;

/// Lookup of enrolled identities by label.
#[async_trait]
pub trait IdentityStore: Send + Sync {
	async fn get(&self, label: &str) -> Result<Option<Identity>>;
}

/// Discovery settings for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryOptions {
	pub enabled: bool,
	/// Rewrite discovered endpoint hosts to `localhost`.
	pub as_localhost: bool,
}

impl From<DiscoveryOptions> for DiscoveryParams {
	fn from(options: DiscoveryOptions) -> Self {
		DiscoveryParams {
			enabled: options.enabled,
			as_localhost: options.as_localhost,
		}
	}
}

/// Everything a gateway needs besides the profile.
#[derive(Clone)]
pub struct ConnectOptions {
	pub identities: Arc<dyn IdentityStore>,
	/// Label of the identity to connect as.
	pub identity: String,
	pub discovery: DiscoveryOptions,
}

/// Entry point of a ledger client library.
#[async_trait]
pub trait Gateway: Send + Sync {
	async fn connect(&self, profile: NetworkProfile, options: ConnectOptions) -> Result<Box<dyn LedgerConnection>>;
}

/// An open connection to the network.
#[async_trait]
pub trait LedgerConnection: Send + Sync {
	/// Returns the named channel.
	async fn network(&self, channel: &str) -> Result<Arc<dyn Network>>;

	/// Closes the connection. Handles obtained from it stop working.
	async fn close(&self) -> Result<()>;
}

/// A channel on the network.
pub trait Network: Send + Sync {
	fn contract(&self, chaincode: &str) -> TransactionHandle;
}

/// A chaincode deployed on a channel.
#[async_trait]
pub trait Contract: Send + Sync {
	fn name(&self) -> &str;

	/// Endorses, orders and commits a transaction; returns the chaincode response.
	async fn submit_transaction(&self, transaction: &str, args: &[String]) -> Result<Vec<u8>>;

	/// Runs a transaction without committing it; returns the chaincode response.
	async fn evaluate_transaction(&self, transaction: &str, args: &[String]) -> Result<Vec<u8>>;
}
