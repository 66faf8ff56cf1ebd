//! WebSocket transport to a peer gateway.
//!
//! The transport is split into a sender half (owned by the connection's
//! writer task) and a receiver half that pumps inbound JSON frames into an
//! unbounded channel until the socket closes.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use crate::error::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outbound half of a transport.
#[async_trait]
pub trait Transport: Send {
	/// Sends one JSON frame.
	async fn send(&mut self, message: Value) -> Result<()>;

	/// Starts the close handshake.
	async fn close(&mut self) -> Result<()>;
}

/// Inbound half of a transport.
#[async_trait]
pub trait TransportReceiver: Send {
	/// Forwards inbound frames until the peer closes the stream.
	async fn run(self: Box<Self>) -> Result<()>;
}

/// Both halves plus the channel inbound frames arrive on.
pub struct TransportParts {
	pub sender: Box<dyn Transport>,
	pub receiver: Box<dyn TransportReceiver>,
	pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// WebSocket transport carrying JSON text frames.
pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Opens a WebSocket to `url` and splits it into transport parts.
	pub async fn connect(url: &str) -> Result<TransportParts> {
		let (stream, _response) = connect_async(url)
			.await
			.map_err(|e| Error::Connection(format!("WebSocket connect to {url} failed: {e}")))?;
		debug!(target = "ledger.transport", %url, "websocket open");

		let (sink, stream) = stream.split();
		let (message_tx, message_rx) = mpsc::unbounded_channel();

		Ok(TransportParts {
			sender: Box::new(WebSocketTransportSender { sink }),
			receiver: Box::new(WebSocketTransportReceiver { stream, message_tx }),
			message_rx,
		})
	}
}

/// Sender half of [`WebSocketTransport`].
pub struct WebSocketTransportSender {
	sink: SplitSink<WsStream, WsMessage>,
}

#[async_trait]
impl Transport for WebSocketTransportSender {
	async fn send(&mut self, message: Value) -> Result<()> {
		let text = serde_json::to_string(&message)?;
		self.sink
			.send(WsMessage::Text(text))
			.await
			.map_err(|e| Error::Transport(format!("Failed to send frame: {e}")))
	}

	async fn close(&mut self) -> Result<()> {
		self.sink
			.close()
			.await
			.map_err(|e| Error::Transport(format!("Failed to close websocket: {e}")))
	}
}

/// Receiver half of [`WebSocketTransport`].
pub struct WebSocketTransportReceiver {
	stream: SplitStream<WsStream>,
	message_tx: mpsc::UnboundedSender<Value>,
}

#[async_trait]
impl TransportReceiver for WebSocketTransportReceiver {
	async fn run(mut self: Box<Self>) -> Result<()> {
		while let Some(frame) = self.stream.next().await {
			let frame = frame.map_err(|e| Error::Transport(format!("Failed to read frame: {e}")))?;
			let bytes = match frame {
				WsMessage::Text(text) => text.into_bytes(),
				WsMessage::Binary(bytes) => bytes,
				WsMessage::Close(_) => break,
				_ => continue,
			};

			match serde_json::from_slice::<Value>(&bytes) {
				Ok(value) => {
					if self.message_tx.send(value).is_err() {
						// Connection dropped its receiver.
						break;
					}
				}
				Err(e) => debug!(target = "ledger.transport", error = %e, "dropping non-JSON frame"),
			}
		}
		Ok(())
	}
}
