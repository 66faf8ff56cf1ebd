//! Request/response correlation on top of a transport.
//!
//! # Message Flow
//!
//! 1. Caller invokes [`Connection::send_message`] with a method and params
//! 2. Connection assigns a sequential id and parks a oneshot sender under it
//! 3. The request is queued for the writer task
//! 4. The dispatch loop matches the response id and completes the oneshot
//!
//! Dropping a pending request future removes its callback. When the
//! transport ends, every pending request fails with [`Error::ChannelClosed`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::task::{Context, Poll};

use ledger_protocol::wire::{ErrorPayload, Message, Request};
use parking_lot::Mutex as ParkingLotMutex;
use serde_json::Value;
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::transport::{Transport, TransportParts, TransportReceiver};

/// Pending request callbacks keyed by request ID.
type CallbackMap = Arc<TokioMutex<HashMap<u32, oneshot::Sender<Result<Value>>>>>;

enum Outbound {
	Frame(Value),
	Close,
}

/// Removes a request's parked sender if its future is dropped before the
/// response arrives.
struct CancelGuard {
	id: u32,
	callbacks: CallbackMap,
	completed: bool,
}

impl CancelGuard {
	fn new(id: u32, callbacks: CallbackMap) -> Self {
		Self {
			id,
			callbacks,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}

		let id = self.id;
		let callbacks = Arc::clone(&self.callbacks);

		if let Ok(handle) = tokio::runtime::Handle::try_current() {
			handle.spawn(async move {
				if callbacks.lock().await.remove(&id).is_some() {
					tracing::debug!(target = "ledger.connection", id, "dropped request released its slot");
				}
			});
		}
	}
}

/// Awaits one correlated response. Completion disarms the guard.
struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.complete();
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// Transport halves waiting for [`Connection::run`] to take them.
struct Pending {
	sender: Box<dyn Transport>,
	receiver: Box<dyn TransportReceiver>,
	message_rx: mpsc::UnboundedReceiver<Value>,
	outbound_rx: mpsc::UnboundedReceiver<Outbound>,
}

/// Correlating connection to a peer gateway.
pub struct Connection {
	/// Sequential request ID counter
	last_id: AtomicU32,
	callbacks: CallbackMap,
	/// Channel for sending outbound messages to the writer task
	outbound_tx: mpsc::UnboundedSender<Outbound>,
	/// Taken by the first call to `run()`
	pending: ParkingLotMutex<Option<Pending>>,
	reader: ParkingLotMutex<Option<JoinHandle<()>>>,
}

impl Connection {
	/// Create a new Connection with the given transport
	pub fn new(parts: TransportParts) -> Self {
		let TransportParts {
			sender,
			receiver,
			message_rx,
		} = parts;

		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

		Self {
			last_id: AtomicU32::new(0),
			callbacks: Arc::new(TokioMutex::new(HashMap::new())),
			outbound_tx,
			pending: ParkingLotMutex::new(Some(Pending {
				sender,
				receiver,
				message_rx,
				outbound_rx,
			})),
			reader: ParkingLotMutex::new(None),
		}
	}

	/// Sends a request and awaits the correlated response.
	pub async fn send_message(&self, method: &str, params: Value) -> Result<Value> {
		let id = self.last_id.fetch_add(1, Ordering::SeqCst);

		tracing::debug!(target = "ledger.connection", id, method, "sending request");

		let (tx, rx) = oneshot::channel();
		self.callbacks.lock().await.insert(id, tx);

		let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

		let request = Request {
			id,
			method: method.to_string(),
			params,
		};

		let request_value = serde_json::to_value(&request)?;
		if self.outbound_tx.send(Outbound::Frame(request_value)).is_err() {
			tracing::error!(target = "ledger.connection", "Failed to queue message: outbound channel closed");
			return Err(Error::ChannelClosed);
		}

		ResponseFuture { rx, guard }.await
	}

	/// Runs the reader, writer and dispatch loop until the transport ends.
	pub async fn run(self: &Arc<Self>) {
		let Some(Pending {
			sender: mut transport_sender,
			receiver: transport_receiver,
			mut message_rx,
			mut outbound_rx,
		}) = self.pending.lock().take()
		else {
			tracing::warn!(target = "ledger.connection", "run() called twice; ignoring");
			return;
		};

		let reader_handle = tokio::spawn(async move {
			if let Err(e) = transport_receiver.run().await {
				tracing::error!(target = "ledger.connection", error = %e, "transport read error");
			}
		});
		*self.reader.lock() = Some(reader_handle);

		let writer_handle = tokio::spawn(async move {
			while let Some(outbound) = outbound_rx.recv().await {
				match outbound {
					Outbound::Frame(message) => {
						if let Err(e) = transport_sender.send(message).await {
							tracing::error!(target = "ledger.connection", error = %e, "transport write error");
							break;
						}
					}
					Outbound::Close => {
						if let Err(e) = transport_sender.close().await {
							tracing::debug!(target = "ledger.connection", error = %e, "close handshake failed");
						}
						break;
					}
				}
			}
		});

		while let Some(message_value) = message_rx.recv().await {
			match serde_json::from_value::<Message>(message_value) {
				Ok(message) => {
					if let Err(e) = self.dispatch_internal(message).await {
						tracing::error!(target = "ledger.connection", error = %e, "error dispatching message");
					}
				}
				Err(e) => {
					tracing::error!(target = "ledger.connection", error = %e, "failed to parse message");
				}
			}
		}

		self.fail_pending().await;
		writer_handle.abort();
	}

	/// Starts the close handshake and stops reading. Pending requests fail.
	pub async fn close(&self) {
		let _ = self.outbound_tx.send(Outbound::Close);
		if let Some(reader) = self.reader.lock().take() {
			reader.abort();
		}
		self.fail_pending().await;
	}

	async fn fail_pending(&self) {
		for (_, callback) in self.callbacks.lock().await.drain() {
			let _ = callback.send(Err(Error::ChannelClosed));
		}
	}

	/// Dispatch an incoming message (test-only public version)
	#[cfg(test)]
	pub async fn dispatch(self: &Arc<Self>, message: Message) -> Result<()> {
		self.dispatch_internal(message).await
	}

	async fn dispatch_internal(&self, message: Message) -> Result<()> {
		match message {
			Message::Response(response) => {
				let callback = self.callbacks.lock().await.remove(&response.id).ok_or_else(|| {
					Error::Protocol(format!("Cannot find request to respond: id={}", response.id))
				})?;

				let result = if let Some(error_wrapper) = response.error {
					Err(parse_protocol_error(error_wrapper.error))
				} else {
					Ok(response.result.unwrap_or(Value::Null))
				};

				let _ = callback.send(result);
				Ok(())
			}
			Message::Unknown(value) => {
				tracing::debug!(target = "ledger.connection", frame = %value, "ignoring notification");
				Ok(())
			}
		}
	}
}

/// Converts [`ErrorPayload`] from the gateway into [`Error::Remote`].
fn parse_protocol_error(error: ErrorPayload) -> Error {
	Error::Remote {
		name: error.name.unwrap_or_else(|| "Error".to_string()),
		message: error.message,
	}
}
