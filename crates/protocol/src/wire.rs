//! Frames exchanged with a peer gateway over WebSocket.
//!
//! Every frame is a JSON text message. The client sends [`Request`]s with a
//! sequential id; the gateway answers each with a [`Response`] carrying the
//! same id and either a `result` or an `error`. Frames without an id are
//! notifications and are ignored by the client.
//!
//! # Methods
//!
//! | method | params | result |
//! |--------|--------|--------|
//! | `connect` | [`ConnectParams`] | ignored |
//! | `getNetwork` | [`NetworkParams`] | ignored |
//! | `submit` | [`TransactionParams`] | [`TransactionResult`] |
//! | `evaluate` | [`TransactionParams`] | [`TransactionResult`] |

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const METHOD_CONNECT: &str = "connect";
pub const METHOD_GET_NETWORK: &str = "getNetwork";
pub const METHOD_SUBMIT: &str = "submit";
pub const METHOD_EVALUATE: &str = "evaluate";

/// Request frame sent to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	/// Unique request ID for correlating responses
	pub id: u32,
	pub method: String,
	pub params: Value,
}

/// Response frame from the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	/// Request ID this response correlates to
	pub id: u32,
	/// Success result (mutually exclusive with error)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	/// Error result (mutually exclusive with result)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorWrapper>,
}

/// Wrapper for protocol error payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorWrapper {
	pub error: ErrorPayload,
}

/// Error details reported by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub message: String,
	/// Error class, e.g. `"EndorseError"` or `"ChannelNotFound"`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

/// Discriminated union of inbound frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	/// Response message (has `id` field)
	Response(Response),
	/// Anything else, e.g. block notifications
	Unknown(Value),
}

/// Discovery options forwarded on `connect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryParams {
	pub enabled: bool,
	pub as_localhost: bool,
}

/// Parameters of the `connect` handshake. The private key never leaves the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
	pub identity: String,
	pub msp_id: String,
	pub certificate: String,
	pub discovery: DiscoveryParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkParams {
	pub channel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionParams {
	pub channel: String,
	pub chaincode: String,
	pub transaction: String,
	pub arguments: Vec<String>,
}

/// Result of `submit` / `evaluate`: the chaincode response, base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResult {
	#[serde(default)]
	pub payload: String,
}

impl TransactionResult {
	pub fn from_bytes(bytes: &[u8]) -> Self {
		Self {
			payload: STANDARD.encode(bytes),
		}
	}

	pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
		STANDARD.decode(&self.payload)
	}
}
