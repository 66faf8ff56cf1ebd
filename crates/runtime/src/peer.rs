//! Gateway client for a remote peer.
//!
//! Peers are dialled in profile (name) order and the first one that accepts
//! the WebSocket and the `connect` handshake serves the session. Profile
//! URLs use grpc schemes; `grpc://` maps to `ws://` and `grpcs://` to `wss://`.
//!
//! The frames are the JSON protocol in [`ledger_protocol::wire`], served by
//! a gateway process in front of the network. A peer's native gRPC endpoint
//! does not understand them.

use std::sync::Arc;

use async_trait::async_trait;
use ledger_protocol::NetworkProfile;
use ledger_protocol::wire::{
	ConnectParams, METHOD_CONNECT, METHOD_EVALUATE, METHOD_GET_NETWORK, METHOD_SUBMIT, NetworkParams,
	TransactionParams, TransactionResult,
};
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::gateway::{ConnectOptions, Contract, Gateway, LedgerConnection, Network, TransactionHandle};
use crate::transport::WebSocketTransport;

/// [`Gateway`] that talks to a peer gateway over WebSocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeerGateway;

/// Maps a profile endpoint URL to the WebSocket URL to dial.
pub fn websocket_url(url: &str) -> String {
	if let Some(rest) = url.strip_prefix("grpcs://") {
		format!("wss://{rest}")
	} else if let Some(rest) = url.strip_prefix("grpc://") {
		format!("ws://{rest}")
	} else {
		url.to_string()
	}
}

#[async_trait]
impl Gateway for PeerGateway {
	async fn connect(&self, profile: NetworkProfile, options: ConnectOptions) -> Result<Box<dyn LedgerConnection>> {
		let identity = options
			.identities
			.get(&options.identity)
			.await?
			.ok_or_else(|| Error::Connection(format!("identity \"{}\" disappeared from the wallet", options.identity)))?;

		let params = serde_json::to_value(ConnectParams {
			identity: options.identity.clone(),
			msp_id: identity.msp_id.clone(),
			certificate: identity.credentials.certificate.clone(),
			discovery: options.discovery.into(),
		})?;

		let mut last_error = Error::Connection("connection profile lists no peer with a url".to_string());
		for (name, url) in profile.peer_urls() {
			let target = websocket_url(url);
			match open_peer(&target, params.clone()).await {
				Ok(connection) => {
					info!(target = "ledger.peer", peer = name, url = %target, "connected to peer gateway");
					return Ok(Box::new(PeerConnection { connection }));
				}
				Err(err) => {
					warn!(target = "ledger.peer", peer = name, url = %target, error = %err, "peer unavailable");
					last_error = err;
				}
			}
		}

		Err(last_error)
	}
}

async fn open_peer(url: &str, handshake: serde_json::Value) -> Result<Arc<Connection>> {
	let parts = WebSocketTransport::connect(url).await?;
	let connection = Arc::new(Connection::new(parts));

	let runner = Arc::clone(&connection);
	tokio::spawn(async move { runner.run().await });

	match connection.send_message(METHOD_CONNECT, handshake).await {
		Ok(_) => Ok(connection),
		Err(err) => {
			connection.close().await;
			Err(match err {
				Error::Remote { name, message } => Error::Connection(format!("{name}: {message}")),
				other => other,
			})
		}
	}
}

struct PeerConnection {
	connection: Arc<Connection>,
}

#[async_trait]
impl LedgerConnection for PeerConnection {
	async fn network(&self, channel: &str) -> Result<Arc<dyn Network>> {
		let params = serde_json::to_value(NetworkParams {
			channel: channel.to_string(),
		})?;
		self.connection
			.send_message(METHOD_GET_NETWORK, params)
			.await
			.map_err(|err| match err {
				Error::Remote { message, .. } => Error::Connection(format!("channel {channel}: {message}")),
				other => other,
			})?;

		debug!(target = "ledger.peer", channel, "network ready");
		Ok(Arc::new(PeerNetwork {
			connection: Arc::clone(&self.connection),
			channel: channel.to_string(),
		}))
	}

	async fn close(&self) -> Result<()> {
		self.connection.close().await;
		Ok(())
	}
}

struct PeerNetwork {
	connection: Arc<Connection>,
	channel: String,
}

impl Network for PeerNetwork {
	fn contract(&self, chaincode: &str) -> TransactionHandle {
		Arc::new(PeerContract {
			connection: Arc::clone(&self.connection),
			channel: self.channel.clone(),
			chaincode: chaincode.to_string(),
		})
	}
}

struct PeerContract {
	connection: Arc<Connection>,
	channel: String,
	chaincode: String,
}

impl PeerContract {
	async fn invoke(&self, method: &str, transaction: &str, args: &[String]) -> Result<Vec<u8>> {
		let params = serde_json::to_value(TransactionParams {
			channel: self.channel.clone(),
			chaincode: self.chaincode.clone(),
			transaction: transaction.to_string(),
			arguments: args.to_vec(),
		})?;

		let value = self
			.connection
			.send_message(method, params)
			.await
			.map_err(|err| match err {
				Error::Remote { message, .. } => Error::Transaction {
					transaction: transaction.to_string(),
					message,
				},
				other => other,
			})?;

		let result: TransactionResult = serde_json::from_value(value)
			.map_err(|e| Error::Protocol(format!("malformed {method} result: {e}")))?;
		result
			.decode()
			.map_err(|e| Error::Protocol(format!("payload is not base64: {e}")))
	}
}

#[async_trait]
impl Contract for PeerContract {
	fn name(&self) -> &str {
		&self.chaincode
	}

	async fn submit_transaction(&self, transaction: &str, args: &[String]) -> Result<Vec<u8>> {
		self.invoke(METHOD_SUBMIT, transaction, args).await
	}

	async fn evaluate_transaction(&self, transaction: &str, args: &[String]) -> Result<Vec<u8>> {
		self.invoke(METHOD_EVALUATE, transaction, args).await
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeMap;

	use futures_util::{SinkExt, StreamExt};
	use ledger_protocol::{EndpointDescriptor, Identity};
	use serde_json::{Value, json};
	use tokio::net::TcpListener;
	use tokio_tungstenite::accept_async;
	use tokio_tungstenite::tungstenite::Message as WsMessage;

	use super::*;
	use crate::gateway::{DiscoveryOptions, IdentityStore};

	/// Serves one client, answering each request frame with `reply(method, params)`
	/// (`Ok` result or `Err((name, message))`). Returns a `grpc://` URL for it.
	async fn fake_peer<F>(reply: F) -> String
	where
		F: Fn(&str, &Value) -> std::result::Result<Value, (&'static str, String)> + Send + 'static,
	{
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();

		tokio::spawn(async move {
			let (stream, _) = listener.accept().await.unwrap();
			let mut ws = accept_async(stream).await.unwrap();
			while let Some(Ok(WsMessage::Text(text))) = ws.next().await {
				let request: Value = serde_json::from_str(&text).unwrap();
				let id = request["id"].clone();
				let method = request["method"].as_str().unwrap_or_default();
				let response = match reply(method, &request["params"]) {
					Ok(result) => json!({"id": id, "result": result}),
					Err((name, message)) => json!({"id": id, "error": {"error": {"name": name, "message": message}}}),
				};
				if ws.send(WsMessage::Text(response.to_string())).await.is_err() {
					break;
				}
			}
		});

		format!("grpc://{addr}")
	}

	fn profile_for(url: String) -> NetworkProfile {
		NetworkProfile {
			peers: Some(BTreeMap::from([("peer0".to_string(), EndpointDescriptor::with_url(url))])),
			..Default::default()
		}
	}

	#[test]
	fn grpc_schemes_map_to_websocket() {
		assert_eq!(websocket_url("grpc://localhost:7051"), "ws://localhost:7051");
		assert_eq!(websocket_url("grpcs://peer0.example.com:7051"), "wss://peer0.example.com:7051");
		assert_eq!(websocket_url("ws://gateway:9000/ledger"), "ws://gateway:9000/ledger");
	}

	struct OneIdentity;

	#[async_trait]
	impl IdentityStore for OneIdentity {
		async fn get(&self, label: &str) -> Result<Option<Identity>> {
			Ok((label == "appUser").then(|| Identity::x509("Org1MSP", "CERT", "KEY")))
		}
	}

	fn options() -> ConnectOptions {
		ConnectOptions {
			identities: Arc::new(OneIdentity),
			identity: "appUser".into(),
			discovery: DiscoveryOptions {
				enabled: true,
				as_localhost: true,
			},
		}
	}

	#[tokio::test]
	async fn profile_without_peers_fails_to_connect() {
		let err = PeerGateway.connect(NetworkProfile::default(), options()).await.err().unwrap();
		assert!(matches!(err, Error::Connection(_)), "got {err:?}");
	}

	#[tokio::test]
	async fn unreachable_peer_is_connection_error() {
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		let port = listener.local_addr().unwrap().port();
		drop(listener);

		let err = PeerGateway
			.connect(profile_for(format!("grpc://127.0.0.1:{port}")), options())
			.await
			.err()
			.unwrap();
		assert!(err.is_connection_failure(), "got {err:?}");
	}

	#[tokio::test]
	async fn transactions_round_trip_through_peer() {
		let url = fake_peer(|method, params| match method {
			METHOD_CONNECT => {
				assert_eq!(params["mspId"], "Org1MSP");
				assert_eq!(params["certificate"], "CERT");
				assert!(params.get("privateKey").is_none());
				assert_eq!(params["discovery"]["asLocalhost"], true);
				Ok(json!({}))
			}
			METHOD_GET_NETWORK => Ok(json!({})),
			METHOD_EVALUATE => Ok(serde_json::to_value(TransactionResult::from_bytes(b"null")).unwrap()),
			METHOD_SUBMIT => Err(("EndorseError", format!("the asset {} already exists", params["arguments"][0]))),
			other => Err(("Error", format!("unexpected method {other}"))),
		})
		.await;

		let connection = PeerGateway.connect(profile_for(url), options()).await.unwrap();
		let contract = connection.network("mychannel").await.unwrap().contract("assettrack");
		assert_eq!(contract.name(), "assettrack");

		let payload = contract.evaluate_transaction("GetAllAssets", &[]).await.unwrap();
		assert_eq!(payload, b"null");

		let err = contract
			.submit_transaction("CreateAsset", &["a1".to_string()])
			.await
			.unwrap_err();
		match err {
			Error::Transaction { transaction, message } => {
				assert_eq!(transaction, "CreateAsset");
				assert!(message.contains("already exists"), "{message}");
			}
			other => panic!("Expected Transaction error, got {other:?}"),
		}

		connection.close().await.unwrap();
	}

	#[tokio::test]
	async fn rejected_handshake_is_connection_error() {
		let url = fake_peer(|_, _| Err(("AccessDenied", "certificate not trusted".to_string()))).await;

		let err = PeerGateway.connect(profile_for(url), options()).await.err().unwrap();
		match err {
			Error::Connection(message) => assert!(message.contains("certificate not trusted"), "{message}"),
			other => panic!("Expected Connection error, got {other:?}"),
		}
	}
}
