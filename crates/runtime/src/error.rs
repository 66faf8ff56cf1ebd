//! Error types for the ledger runtime.
//!
//! The error is `Clone` so a single failed connection attempt can be handed
//! to every caller that was waiting on it; underlying sources are held in
//! `Arc`.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving, connecting to, or using the ledger.
#[derive(Debug, Clone, Error)]
pub enum Error {
	/// Connection profile file does not exist.
	#[error("Connection profile not found at {}", path.display())]
	ProfileNotFound { path: PathBuf },

	/// Connection profile exists but could not be read.
	#[error("Failed to read connection profile {}: {source}", path.display())]
	ProfileRead {
		path: PathBuf,
		#[source]
		source: Arc<std::io::Error>,
	},

	/// Connection profile is not a well-formed profile document.
	#[error("Invalid connection profile {}: {source}", path.display())]
	ProfileParse {
		path: PathBuf,
		#[source]
		source: Arc<serde_json::Error>,
	},

	/// Wallet directory or identity file could not be used.
	#[error("Wallet error at {}: {message}", path.display())]
	Wallet { path: PathBuf, message: String },

	/// Configured identity is not enrolled in the wallet.
	#[error("User identity \"{label}\" not found in wallet at {}. Enroll the identity before retrying", wallet.display())]
	IdentityNotFound { label: String, wallet: PathBuf },

	/// Failed to establish or use the network connection.
	#[error("Failed to connect to ledger network: {0}")]
	Connection(String),

	/// Transport-level error (WebSocket communication).
	#[error("Transport error: {0}")]
	Transport(String),

	/// Malformed or unexpected gateway frame.
	#[error("Protocol error: {0}")]
	Protocol(String),

	/// Connection closed while a request was pending.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// Error reported by the peer gateway for a single request.
	#[error("{name}: {message}")]
	Remote {
		/// Error class reported by the gateway (e.g., "EndorseError")
		name: String,
		message: String,
	},

	/// Submit or evaluate rejected by the network.
	#[error("Transaction {transaction} failed: {message}")]
	Transaction { transaction: String, message: String },

	/// Ledger returned a payload that is not the expected JSON.
	#[error("Failed to parse ledger response: {0}")]
	ResponseParse(String),

	/// The session was disconnected before the connection attempt completed.
	#[error("Session disconnected while connecting")]
	Disconnected,

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[source] Arc<serde_json::Error>),
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Json(Arc::new(err))
	}
}

impl Error {
	/// Returns true when the caller has to provision something out of band
	/// (an identity, a profile file) before retrying can succeed.
	pub fn is_user_actionable(&self) -> bool {
		matches!(
			self,
			Error::IdentityNotFound { .. } | Error::ProfileNotFound { .. } | Error::ProfileParse { .. }
		)
	}

	/// Returns true for failures of the connection itself rather than of a
	/// single transaction.
	pub fn is_connection_failure(&self) -> bool {
		matches!(
			self,
			Error::Connection(_) | Error::Transport(_) | Error::ChannelClosed | Error::Disconnected
		)
	}
}
